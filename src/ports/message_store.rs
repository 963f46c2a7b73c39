//! MessageStore port - Interface for durable chat message storage.
//!
//! Storage is best-effort: the relay hands records over after delivery and
//! never lets a storage failure reach the sender.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::chat::ChatMessage;
use crate::domain::foundation::RoomId;

/// Errors from message store adapters.
#[derive(Debug, Clone, Error)]
pub enum MessageStoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Message store unavailable: {0}")]
    Unavailable(String),
}

/// Port for persisting chat messages.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persists one message record.
    async fn save_message(&self, message: &ChatMessage) -> Result<(), MessageStoreError>;

    /// Returns every saved message for a room, in insertion order.
    async fn messages_for_room(&self, room: &RoomId) -> Result<Vec<ChatMessage>, MessageStoreError>;
}

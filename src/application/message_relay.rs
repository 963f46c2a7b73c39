//! Chat message fan-out with write-behind persistence.
//!
//! Delivery to the room is awaited and its failure is returned. Storage
//! runs on a detached task afterwards: at most once, never retried, and
//! its failure only shows up in the logs.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::domain::chat::{validate_content, validate_username, ChatMessage};
use crate::domain::foundation::{MessageId, RoomId, Timestamp};
use crate::ports::MessageStore;

use super::broadcast_coordinator::BroadcastCoordinator;
use super::error::HubError;

/// Default cap on message length, in characters.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 4000;

/// Returned once a message has been delivered to its room.
#[derive(Debug)]
pub struct RelayReceipt {
    pub message_id: MessageId,
    pub timestamp: Timestamp,
    /// Handle of the storage task. Dropping it detaches the task.
    pub persistence: JoinHandle<()>,
}

pub struct MessageRelay {
    coordinator: Arc<BroadcastCoordinator>,
    store: Arc<dyn MessageStore>,
    max_message_len: usize,
}

impl MessageRelay {
    pub fn new(
        coordinator: Arc<BroadcastCoordinator>,
        store: Arc<dyn MessageStore>,
        max_message_len: usize,
    ) -> Self {
        Self {
            coordinator,
            store,
            max_message_len,
        }
    }

    /// Delivers `message` to everyone in `room`, then queues it for storage.
    ///
    /// The storage task is spawned even when delivery reports a failure,
    /// since the relay already accepted the message.
    pub async fn send_message(
        &self,
        room: &RoomId,
        username: &str,
        message: &str,
    ) -> Result<RelayReceipt, HubError> {
        validate_username(username)?;
        validate_content(message, self.max_message_len)?;

        let timestamp = Timestamp::now();
        let delivered = self
            .coordinator
            .chat_message(room, username, message, timestamp)
            .await;

        let record = ChatMessage::new(room.clone(), username, message, timestamp);
        let message_id = record.id;
        let persistence = self.persist(record);

        delivered?;
        Ok(RelayReceipt {
            message_id,
            timestamp,
            persistence,
        })
    }

    fn persist(&self, record: ChatMessage) -> JoinHandle<()> {
        let store = self.store.clone();
        tokio::spawn(async move {
            match store.save_message(&record).await {
                Ok(()) => tracing::debug!(
                    message_id = %record.id,
                    room_id = %record.room_id,
                    "Message persisted"
                ),
                Err(e) => tracing::warn!(
                    message_id = %record.id,
                    room_id = %record.room_id,
                    error = %e,
                    "Failed to persist message (already delivered to clients)"
                ),
            }
        })
    }
}

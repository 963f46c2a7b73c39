//! In-Memory Message Store Adapter
//!
//! Keeps every saved message in a process-local list.
//! Used when no database is configured, and in tests.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::chat::ChatMessage;
use crate::domain::foundation::RoomId;
use crate::ports::{MessageStore, MessageStoreError};

/// In-memory storage for chat messages
#[derive(Debug, Clone, Default)]
pub struct InMemoryMessageStore {
    messages: Arc<RwLock<Vec<ChatMessage>>>,
}

impl InMemoryMessageStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored messages across all rooms
    pub async fn message_count(&self) -> usize {
        self.messages.read().await.len()
    }

    /// Clear all stored messages (useful for tests)
    pub async fn clear(&self) {
        self.messages.write().await.clear();
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn save_message(&self, message: &ChatMessage) -> Result<(), MessageStoreError> {
        self.messages.write().await.push(message.clone());
        Ok(())
    }

    async fn messages_for_room(&self, room: &RoomId) -> Result<Vec<ChatMessage>, MessageStoreError> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| &m.room_id == room)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;

    fn message(room: &str, content: &str) -> ChatMessage {
        ChatMessage::new(RoomId::new(room).unwrap(), "alice", content, Timestamp::now())
    }

    #[tokio::test]
    async fn returns_room_messages_in_insertion_order() {
        let store = InMemoryMessageStore::new();
        store.save_message(&message("r1", "first")).await.unwrap();
        store.save_message(&message("r2", "other")).await.unwrap();
        store.save_message(&message("r1", "second")).await.unwrap();

        let r1 = store
            .messages_for_room(&RoomId::new("r1").unwrap())
            .await
            .unwrap();

        let contents: Vec<_> = r1.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn unknown_room_has_no_messages() {
        let store = InMemoryMessageStore::new();

        let messages = store
            .messages_for_room(&RoomId::new("nowhere").unwrap())
            .await
            .unwrap();

        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn clones_share_storage() {
        let store = InMemoryMessageStore::new();
        let clone = store.clone();

        clone.save_message(&message("r1", "hi")).await.unwrap();

        assert_eq!(store.message_count().await, 1);
        store.clear().await;
        assert_eq!(clone.message_count().await, 0);
    }

    #[tokio::test]
    async fn concurrent_saves_are_all_kept() {
        let store = InMemoryMessageStore::new();
        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.save_message(&message("r1", &format!("m{i}"))).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.message_count().await, 20);
    }
}

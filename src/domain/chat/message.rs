//! Chat message record and content validation.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{MessageId, RoomId, Timestamp, ValidationError};

/// A chat message as handed to the message store.
///
/// Serializes as `{id, roomId, username, content, timestamp}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    pub room_id: RoomId,
    pub username: String,
    pub content: String,
    pub timestamp: Timestamp,
}

impl ChatMessage {
    /// Creates a record with a freshly generated id.
    pub fn new(
        room_id: RoomId,
        username: impl Into<String>,
        content: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: MessageId::new(),
            room_id,
            username: username.into(),
            content: content.into(),
            timestamp,
        }
    }
}

/// Validates a client-supplied username. Usernames are not authenticated,
/// only required to be present.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::empty_field("username"));
    }
    Ok(())
}

/// Validates message content against the configured maximum length
/// (counted in characters, not bytes).
pub fn validate_content(content: &str, max_len: usize) -> Result<(), ValidationError> {
    if content.is_empty() {
        return Err(ValidationError::empty_field("message"));
    }
    let len = content.chars().count();
    if len > max_len {
        return Err(ValidationError::too_long("message", max_len, len));
    }
    Ok(())
}

//! WebSocket message types for the chat protocol.
//!
//! Defines the frames exchanged with connected clients:
//! - Client → Server: room operations, typing signals, chat messages, pings
//! - Server → Client: relay events (see `RelayEvent`), plus the
//!   transport-level frames below
//!
//! All frames are JSON objects tagged by `type`; field names are camelCase.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ErrorCode;

// ============================================
// Server → Client Messages
// ============================================

/// Transport-level frames that do not originate from the relay core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Sent once, before anything else, on a new connection.
    Connected {
        connection_id: String,
        timestamp: String,
    },

    /// Heartbeat response.
    Pong { timestamp: String },

    /// A request from this client failed.
    Error { code: String, message: String },
}

impl ServerMessage {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

// ============================================
// Client → Server Messages
// ============================================

/// All message types that can be received from a client.
///
/// Room ids and usernames arrive as plain strings and are validated by the
/// hub, so an empty value yields an `INVALID_ARGUMENT` error frame rather
/// than a malformed-frame error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    CreateRoom {
        room_id: String,
    },
    JoinRoom {
        room_id: String,
        username: String,
    },
    LeaveRoom {
        room_id: String,
        username: String,
    },
    RequestRoomList,
    UserTyping {
        room_id: String,
        username: String,
    },
    SendMessage {
        room_id: String,
        username: String,
        message: String,
    },
    Ping,
}

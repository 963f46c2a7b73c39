//! Named events pushed to connected clients.
//!
//! Each variant serializes with a `type` tag equal to its event name,
//! e.g. `{"type":"UserJoined","username":"alice"}`.

use serde::Serialize;

use crate::domain::foundation::{RoomId, Timestamp};

/// Outbound notification delivered through a `Broadcaster`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum RelayEvent {
    /// Full list of active rooms.
    AvailableRooms { rooms: Vec<RoomId> },

    /// Current members of a room.
    UpdateUserList {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        users: Vec<String>,
    },

    UserJoined { username: String },

    UserLeft { username: String },

    UserTyping { username: String },

    /// A chat message, stamped when the relay accepted it.
    ReceiveMessage {
        username: String,
        message: String,
        timestamp: Timestamp,
    },
}

impl RelayEvent {
    /// The event name clients subscribe to.
    pub fn name(&self) -> &'static str {
        match self {
            RelayEvent::AvailableRooms { .. } => "AvailableRooms",
            RelayEvent::UpdateUserList { .. } => "UpdateUserList",
            RelayEvent::UserJoined { .. } => "UserJoined",
            RelayEvent::UserLeft { .. } => "UserLeft",
            RelayEvent::UserTyping { .. } => "UserTyping",
            RelayEvent::ReceiveMessage { .. } => "ReceiveMessage",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_with_name_as_type_tag() {
        let event = RelayEvent::UserJoined {
            username: "alice".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], event.name());
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn user_list_uses_camel_case_room_id() {
        let event = RelayEvent::UpdateUserList {
            room_id: RoomId::new("lobby").unwrap(),
            users: vec!["alice".to_string(), "bob".to_string()],
        };
        let json = serde_json::to_string(&event).unwrap();

        assert!(json.contains(r#""type":"UpdateUserList""#));
        assert!(json.contains(r#""roomId":"lobby""#));
        assert!(json.contains(r#""users":["alice","bob"]"#));
    }

    #[test]
    fn available_rooms_serializes_room_names() {
        let event = RelayEvent::AvailableRooms {
            rooms: vec![RoomId::new("a").unwrap(), RoomId::new("b").unwrap()],
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"AvailableRooms","rooms":["a","b"]}"#);
    }
}

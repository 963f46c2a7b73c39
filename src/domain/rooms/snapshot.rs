//! Immutable views of registry state, captured inside the registry's
//! critical section and handed to the broadcast layer.

use crate::domain::foundation::RoomId;

/// Ordered list of active room ids at one point in registry history.
///
/// `revision` grows every time the active-room set changes, so of two
/// lists the one with the higher revision is the newer. Equal revisions
/// always carry the same rooms.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoomList {
    revision: u64,
    rooms: Vec<RoomId>,
}

impl RoomList {
    pub(crate) fn new(revision: u64, rooms: Vec<RoomId>) -> Self {
        Self { revision, rooms }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn as_slice(&self) -> &[RoomId] {
        &self.rooms
    }

    pub fn contains(&self, room: &RoomId) -> bool {
        self.rooms.contains(room)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn to_vec(&self) -> Vec<RoomId> {
        self.rooms.clone()
    }
}

/// Result of `create_room`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOutcome {
    pub room: RoomId,
    /// False when the room already existed.
    pub created: bool,
    pub rooms: RoomList,
}

/// Result of a leave that actually unbound a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    pub room: RoomId,
    /// Username recorded when the connection joined.
    pub username: String,
    /// True when this leave emptied and deleted the room. A username change
    /// within the same room never removes it.
    pub room_removed: bool,
    /// Remaining members, empty when the room was removed.
    pub members: Vec<String>,
    pub rooms: RoomList,
}

/// Result of `join_room`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub room: RoomId,
    pub username: String,
    /// Implicit leave of the room the connection was bound to before.
    ///
    /// Its `rooms` field carries the same final snapshot as this outcome;
    /// the intermediate state between leave and join is never published.
    pub previous: Option<LeaveOutcome>,
    pub members: Vec<String>,
    pub rooms: RoomList,
}

//! Authoritative room and connection registry.
//!
//! Holds three pieces of state behind one lock:
//!
//! ```text
//! rooms:        lobby -> {alice: 1, bob: 1}     (keys are the active-room set)
//!               r2    -> {}                      (created, never joined)
//! bindings:     conn-a -> (lobby, alice)
//!               conn-b -> (lobby, bob)
//! connections:  {conn-a, conn-b, conn-c}
//! revision:     7                             (bumped when the room set changes)
//! ```
//!
//! Every operation takes the lock once, applies its whole read-modify-write
//! and captures the snapshot its caller will broadcast before releasing it.
//! Nothing awaits while the lock is held except acquiring it.

use std::collections::{BTreeMap, HashMap, HashSet};

use tokio::sync::Mutex;

use crate::domain::chat::validate_username;
use crate::domain::foundation::{ConnectionId, RoomId, ValidationError};

use super::snapshot::{CreateOutcome, JoinOutcome, LeaveOutcome, RoomList};

/// Username -> number of bound connections using it in a room.
type Members = BTreeMap<String, usize>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Binding {
    room: RoomId,
    username: String,
}

#[derive(Debug, Default)]
struct RegistryState {
    rooms: BTreeMap<RoomId, Members>,
    bindings: HashMap<ConnectionId, Binding>,
    connections: HashSet<ConnectionId>,
    revision: u64,
}

impl RegistryState {
    fn room_list(&self) -> RoomList {
        RoomList::new(self.revision, self.rooms.keys().cloned().collect())
    }

    fn open_room(&mut self, room: &RoomId) -> &mut Members {
        if !self.rooms.contains_key(room) {
            self.revision += 1;
        }
        self.rooms.entry(room.clone()).or_default()
    }

    fn members_of(&self, room: &RoomId) -> Vec<String> {
        self.rooms
            .get(room)
            .map(|members| members.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn create(&mut self, room: &RoomId) -> bool {
        if self.rooms.contains_key(room) {
            return false;
        }
        self.open_room(room);
        true
    }

    /// Drops the connection's binding and its membership. The returned
    /// outcome's `rooms` is filled by the caller once the whole operation
    /// has been applied.
    ///
    /// With `keep_room` an emptied room stays active; the caller is about to
    /// bind into it again.
    fn unbind(&mut self, connection_id: &ConnectionId, keep_room: bool) -> Option<LeaveOutcome> {
        let binding = self.bindings.remove(connection_id)?;

        let mut room_removed = false;
        if let Some(members) = self.rooms.get_mut(&binding.room) {
            if let Some(count) = members.get_mut(&binding.username) {
                *count -= 1;
                if *count == 0 {
                    members.remove(&binding.username);
                }
            }
            if members.is_empty() && !keep_room {
                self.rooms.remove(&binding.room);
                self.revision += 1;
                room_removed = true;
            }
        }

        let members = self.members_of(&binding.room);
        Some(LeaveOutcome {
            room: binding.room,
            username: binding.username,
            room_removed,
            members,
            rooms: RoomList::default(),
        })
    }

    fn bind(&mut self, connection_id: ConnectionId, room: &RoomId, username: &str) {
        *self
            .open_room(room)
            .entry(username.to_string())
            .or_insert(0) += 1;
        self.bindings.insert(
            connection_id,
            Binding {
                room: room.clone(),
                username: username.to_string(),
            },
        );
    }

    fn join(
        &mut self,
        connection_id: ConnectionId,
        room: &RoomId,
        username: &str,
    ) -> JoinOutcome {
        let (same_room, already_there) = match self.bindings.get(&connection_id) {
            Some(binding) => {
                let same_room = &binding.room == room;
                (same_room, same_room && binding.username == username)
            }
            None => (false, false),
        };

        let previous = if already_there {
            None
        } else {
            // A new username in the same room swaps the member in place.
            let previous = self.unbind(&connection_id, same_room);
            self.bind(connection_id, room, username);
            previous
        };

        let rooms = self.room_list();
        JoinOutcome {
            room: room.clone(),
            username: username.to_string(),
            previous: previous.map(|leave| LeaveOutcome {
                rooms: rooms.clone(),
                ..leave
            }),
            members: self.members_of(room),
            rooms,
        }
    }

    fn leave(&mut self, connection_id: &ConnectionId, room: &RoomId) -> Option<LeaveOutcome> {
        match self.bindings.get(connection_id) {
            Some(binding) if &binding.room == room => {}
            _ => return None,
        }
        let leave = self.unbind(connection_id, false)?;
        Some(LeaveOutcome {
            rooms: self.room_list(),
            ..leave
        })
    }

    fn disconnect(&mut self, connection_id: &ConnectionId) -> Option<LeaveOutcome> {
        self.connections.remove(connection_id);
        let leave = self.unbind(connection_id, false)?;
        Some(LeaveOutcome {
            rooms: self.room_list(),
            ..leave
        })
    }
}

/// The single owner of room membership state.
///
/// Share it behind an `Arc`; all methods take `&self`.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    state: Mutex<RegistryState>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a live connection and returns the room list it should see.
    pub async fn register_connection(&self, connection_id: ConnectionId) -> RoomList {
        let mut state = self.state.lock().await;
        state.connections.insert(connection_id);
        state.room_list()
    }

    /// Activates a room with no members. Re-creating an active room is a no-op.
    pub async fn create_room(&self, room: &RoomId) -> CreateOutcome {
        let mut state = self.state.lock().await;
        let created = state.create(room);
        if created {
            tracing::info!(room_id = %room, "Room created");
        } else {
            tracing::debug!(room_id = %room, "Room already exists");
        }
        CreateOutcome {
            room: room.clone(),
            created,
            rooms: state.room_list(),
        }
    }

    /// Binds a connection to a room under `username`, leaving its previous
    /// room first. Validation happens before any state is touched.
    pub async fn join_room(
        &self,
        connection_id: ConnectionId,
        room: &RoomId,
        username: &str,
    ) -> Result<JoinOutcome, ValidationError> {
        validate_username(username)?;

        let mut state = self.state.lock().await;
        let room_is_new = !state.rooms.contains_key(room);
        let outcome = state.join(connection_id, room, username);
        drop(state);

        if room_is_new {
            tracing::info!(room_id = %room, "Room created on first join");
        }
        if let Some(previous) = &outcome.previous {
            if previous.room_removed {
                tracing::info!(room_id = %previous.room, "Removed empty room");
            }
        }
        Ok(outcome)
    }

    /// Unbinds a connection from `room`.
    ///
    /// Returns `None` without touching state when the connection is not
    /// bound to that room. The username removed is the one recorded at join
    /// time; `username` is only compared for diagnostics.
    pub async fn leave_room(
        &self,
        connection_id: &ConnectionId,
        room: &RoomId,
        username: &str,
    ) -> Option<LeaveOutcome> {
        let outcome = self.state.lock().await.leave(connection_id, room)?;

        if outcome.username != username {
            tracing::debug!(
                connection_id = %connection_id,
                requested = username,
                recorded = %outcome.username,
                "Leave username differs from the one recorded at join"
            );
        }
        if outcome.room_removed {
            tracing::info!(room_id = %outcome.room, "Removed empty room");
        }
        Some(outcome)
    }

    /// Forgets a connection, leaving its room if it had one.
    pub async fn disconnect(&self, connection_id: &ConnectionId) -> Option<LeaveOutcome> {
        let outcome = self.state.lock().await.disconnect(connection_id)?;
        if outcome.room_removed {
            tracing::info!(room_id = %outcome.room, "Removed empty room");
        }
        Some(outcome)
    }

    /// Active rooms, in lexicographic order.
    pub async fn snapshot(&self) -> RoomList {
        self.state.lock().await.room_list()
    }

    /// Members of a room, or `None` if the room is not active.
    pub async fn snapshot_room(&self, room: &RoomId) -> Option<Vec<String>> {
        let state = self.state.lock().await;
        state
            .rooms
            .get(room)
            .map(|members| members.keys().cloned().collect())
    }

    /// Room the connection is currently bound to.
    pub async fn connection_room(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        self.state
            .lock()
            .await
            .bindings
            .get(connection_id)
            .map(|binding| binding.room.clone())
    }

    /// Number of registered live connections.
    pub async fn connection_count(&self) -> usize {
        self.state.lock().await.connections.len()
    }
}

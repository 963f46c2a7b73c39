//! Turns registry outcomes into client notifications.
//!
//! Every method receives the snapshot captured inside the registry's
//! critical section, so payloads reflect exactly the mutation that
//! triggered them.
//!
//! # Sequences
//!
//! ```text
//! join R      add_to_group → AvailableRooms (caller, others)
//!             → UpdateUserList(R) → UserJoined          (group R)
//! leave R     remove_from_group → UserLeft → UpdateUserList (group R, if R survives)
//!             → AvailableRooms (caller, others)
//! disconnect  as leave, but AvailableRooms goes to others only
//! ```
//!
//! Each step of a sequence is attempted even if an earlier one failed; the
//! first failure is returned once the sequence completes.
//!
//! Room lists are published one at a time, in revision order. A list older
//! than the last one published is dropped: every client already received
//! the newer one.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::chat::RelayEvent;
use crate::domain::foundation::{ConnectionId, RoomId, Timestamp};
use crate::domain::rooms::{CreateOutcome, JoinOutcome, LeaveOutcome, RoomList};
use crate::ports::{BroadcastError, Broadcaster};

/// Keeps the first delivery error of a sequence.
#[derive(Default)]
struct Delivery {
    first_error: Option<BroadcastError>,
}

impl Delivery {
    fn record(&mut self, result: Result<(), BroadcastError>) {
        if let Err(e) = result {
            tracing::warn!(error = %e, "Notification delivery failed");
            self.first_error.get_or_insert(e);
        }
    }

    fn finish(self) -> Result<(), BroadcastError> {
        match self.first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Sequences notifications after registry mutations.
pub struct BroadcastCoordinator {
    broadcaster: Arc<dyn Broadcaster>,
    /// Revision of the last room list sent. Held for the whole send.
    published_rooms: Mutex<u64>,
}

impl BroadcastCoordinator {
    pub fn new(broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            broadcaster,
            published_rooms: Mutex::new(0),
        }
    }

    /// Sends the room list to `caller` first, then to everyone else.
    pub async fn announce_rooms(
        &self,
        caller: &ConnectionId,
        rooms: &RoomList,
    ) -> Result<(), BroadcastError> {
        let mut delivery = Delivery::default();
        self.announce_rooms_into(caller, rooms, &mut delivery).await;
        delivery.finish()
    }

    pub async fn room_created(
        &self,
        caller: &ConnectionId,
        outcome: &CreateOutcome,
    ) -> Result<(), BroadcastError> {
        self.announce_rooms(caller, &outcome.rooms).await
    }

    pub async fn member_joined(
        &self,
        caller: &ConnectionId,
        outcome: &JoinOutcome,
    ) -> Result<(), BroadcastError> {
        let mut delivery = Delivery::default();

        if let Some(previous) = &outcome.previous {
            self.departure_into(caller, previous, &mut delivery).await;
        }

        delivery.record(self.broadcaster.add_to_group(caller, &outcome.room).await);
        self.announce_rooms_into(caller, &outcome.rooms, &mut delivery)
            .await;
        delivery.record(
            self.broadcaster
                .send_to_group(&outcome.room, &user_list(&outcome.room, &outcome.members))
                .await,
        );
        delivery.record(
            self.broadcaster
                .send_to_group(
                    &outcome.room,
                    &RelayEvent::UserJoined {
                        username: outcome.username.clone(),
                    },
                )
                .await,
        );

        delivery.finish()
    }

    pub async fn member_left(
        &self,
        caller: &ConnectionId,
        outcome: &LeaveOutcome,
    ) -> Result<(), BroadcastError> {
        let mut delivery = Delivery::default();
        self.departure_into(caller, outcome, &mut delivery).await;
        self.announce_rooms_into(caller, &outcome.rooms, &mut delivery)
            .await;
        delivery.finish()
    }

    /// A leave that matched no binding only detaches the transport group.
    pub async fn leave_ignored(
        &self,
        caller: &ConnectionId,
        room: &RoomId,
    ) -> Result<(), BroadcastError> {
        self.broadcaster.remove_from_group(caller, room).await
    }

    /// Like `member_left`, but the departed connection is not addressed.
    pub async fn member_disconnected(
        &self,
        connection_id: &ConnectionId,
        outcome: &LeaveOutcome,
    ) -> Result<(), BroadcastError> {
        let mut delivery = Delivery::default();
        self.departure_into(connection_id, outcome, &mut delivery)
            .await;
        self.publish_rooms(connection_id, &outcome.rooms, false, &mut delivery)
            .await;
        delivery.finish()
    }

    pub async fn user_typing(&self, room: &RoomId, username: &str) -> Result<(), BroadcastError> {
        self.broadcaster
            .send_to_group(
                room,
                &RelayEvent::UserTyping {
                    username: username.to_string(),
                },
            )
            .await
    }

    pub async fn chat_message(
        &self,
        room: &RoomId,
        username: &str,
        message: &str,
        timestamp: Timestamp,
    ) -> Result<(), BroadcastError> {
        self.broadcaster
            .send_to_group(
                room,
                &RelayEvent::ReceiveMessage {
                    username: username.to_string(),
                    message: message.to_string(),
                    timestamp,
                },
            )
            .await
    }

    async fn announce_rooms_into(
        &self,
        caller: &ConnectionId,
        rooms: &RoomList,
        delivery: &mut Delivery,
    ) {
        self.publish_rooms(caller, rooms, true, delivery).await;
    }

    async fn publish_rooms(
        &self,
        caller: &ConnectionId,
        rooms: &RoomList,
        address_caller: bool,
        delivery: &mut Delivery,
    ) {
        let mut published = self.published_rooms.lock().await;
        if rooms.revision() < *published {
            tracing::debug!(
                revision = rooms.revision(),
                published = *published,
                "Skipping superseded room list"
            );
            return;
        }
        *published = rooms.revision();

        let event = available_rooms(rooms);
        if address_caller {
            delivery.record(self.broadcaster.send_to_connection(caller, &event).await);
        }
        delivery.record(self.broadcaster.send_to_others(caller, &event).await);
    }

    /// Detaches the connection from the room's group and tells the
    /// remaining members, if any.
    async fn departure_into(
        &self,
        connection_id: &ConnectionId,
        outcome: &LeaveOutcome,
        delivery: &mut Delivery,
    ) {
        delivery.record(
            self.broadcaster
                .remove_from_group(connection_id, &outcome.room)
                .await,
        );
        if outcome.room_removed {
            return;
        }
        delivery.record(
            self.broadcaster
                .send_to_group(
                    &outcome.room,
                    &RelayEvent::UserLeft {
                        username: outcome.username.clone(),
                    },
                )
                .await,
        );
        delivery.record(
            self.broadcaster
                .send_to_group(&outcome.room, &user_list(&outcome.room, &outcome.members))
                .await,
        );
    }
}

fn available_rooms(rooms: &RoomList) -> RelayEvent {
    RelayEvent::AvailableRooms {
        rooms: rooms.to_vec(),
    }
}

fn user_list(room: &RoomId, members: &[String]) -> RelayEvent {
    RelayEvent::UpdateUserList {
        room_id: room.clone(),
        users: members.to_vec(),
    }
}

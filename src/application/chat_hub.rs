//! ChatHub - the operation surface exposed to the transport layer.
//!
//! Every operation is scoped to the calling connection. Room operations
//! follow the same shape:
//! 1. Validate arguments (no state touched on failure)
//! 2. Apply the mutation in the registry, capturing a snapshot
//! 3. Hand the snapshot to the broadcast coordinator

use std::sync::Arc;

use crate::domain::foundation::{ConnectionId, RoomId};
use crate::domain::rooms::{CreateOutcome, JoinOutcome, LeaveOutcome, RoomList, RoomRegistry};
use crate::ports::{Broadcaster, MessageStore};

use super::broadcast_coordinator::BroadcastCoordinator;
use super::connection_lifecycle::ConnectionLifecycle;
use super::error::HubError;
use super::message_relay::{MessageRelay, RelayReceipt, DEFAULT_MAX_MESSAGE_LEN};

/// Composes the registry, coordinator, lifecycle and relay.
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct ChatHub {
    registry: Arc<RoomRegistry>,
    coordinator: Arc<BroadcastCoordinator>,
    lifecycle: Arc<ConnectionLifecycle>,
    relay: Arc<MessageRelay>,
}

impl ChatHub {
    pub fn new(broadcaster: Arc<dyn Broadcaster>, store: Arc<dyn MessageStore>) -> Self {
        Self::with_max_message_len(broadcaster, store, DEFAULT_MAX_MESSAGE_LEN)
    }

    pub fn with_max_message_len(
        broadcaster: Arc<dyn Broadcaster>,
        store: Arc<dyn MessageStore>,
        max_message_len: usize,
    ) -> Self {
        let registry = Arc::new(RoomRegistry::new());
        let coordinator = Arc::new(BroadcastCoordinator::new(broadcaster));
        let lifecycle = Arc::new(ConnectionLifecycle::new(
            registry.clone(),
            coordinator.clone(),
        ));
        let relay = Arc::new(MessageRelay::new(
            coordinator.clone(),
            store,
            max_message_len,
        ));
        Self {
            registry,
            coordinator,
            lifecycle,
            relay,
        }
    }

    /// Read access for status endpoints and tests.
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub async fn on_connect(&self, connection_id: ConnectionId) -> Result<RoomList, HubError> {
        self.lifecycle.on_connect(connection_id).await
    }

    pub async fn on_disconnect(
        &self,
        connection_id: ConnectionId,
    ) -> Result<Option<LeaveOutcome>, HubError> {
        self.lifecycle.on_disconnect(connection_id).await
    }

    pub async fn create_room(
        &self,
        connection_id: ConnectionId,
        room_id: &str,
    ) -> Result<CreateOutcome, HubError> {
        let room = RoomId::new(room_id)?;
        tracing::info!(connection_id = %connection_id, room_id = %room, "Creating room");

        let outcome = self.registry.create_room(&room).await;
        self.coordinator
            .room_created(&connection_id, &outcome)
            .await?;
        Ok(outcome)
    }

    pub async fn join_room(
        &self,
        connection_id: ConnectionId,
        room_id: &str,
        username: &str,
    ) -> Result<JoinOutcome, HubError> {
        let room = RoomId::new(room_id)?;
        tracing::info!(
            connection_id = %connection_id,
            room_id = %room,
            username,
            "User joining room"
        );

        let outcome = self
            .registry
            .join_room(connection_id, &room, username)
            .await?;
        self.coordinator
            .member_joined(&connection_id, &outcome)
            .await?;
        Ok(outcome)
    }

    /// Returns `None` when the connection was not in `room_id`.
    pub async fn leave_room(
        &self,
        connection_id: ConnectionId,
        room_id: &str,
        username: &str,
    ) -> Result<Option<LeaveOutcome>, HubError> {
        let room = RoomId::new(room_id)?;

        match self
            .registry
            .leave_room(&connection_id, &room, username)
            .await
        {
            Some(outcome) => {
                tracing::info!(
                    connection_id = %connection_id,
                    room_id = %room,
                    username = %outcome.username,
                    room_removed = outcome.room_removed,
                    "User left room"
                );
                self.coordinator
                    .member_left(&connection_id, &outcome)
                    .await?;
                Ok(Some(outcome))
            }
            None => {
                tracing::debug!(
                    connection_id = %connection_id,
                    room_id = %room,
                    "Leave ignored, connection not in room"
                );
                self.coordinator
                    .leave_ignored(&connection_id, &room)
                    .await?;
                Ok(None)
            }
        }
    }

    pub async fn request_room_list(
        &self,
        connection_id: ConnectionId,
    ) -> Result<RoomList, HubError> {
        let rooms = self.registry.snapshot().await;
        self.coordinator
            .announce_rooms(&connection_id, &rooms)
            .await?;
        Ok(rooms)
    }

    pub async fn user_typing(
        &self,
        connection_id: ConnectionId,
        room_id: &str,
        username: &str,
    ) -> Result<(), HubError> {
        let room = RoomId::new(room_id)?;
        tracing::trace!(connection_id = %connection_id, room_id = %room, "User typing");
        self.coordinator.user_typing(&room, username).await?;
        Ok(())
    }

    pub async fn send_message(
        &self,
        connection_id: ConnectionId,
        room_id: &str,
        username: &str,
        message: &str,
    ) -> Result<RelayReceipt, HubError> {
        let room = RoomId::new(room_id)?;
        tracing::info!(
            connection_id = %connection_id,
            room_id = %room,
            username,
            "Relaying message"
        );
        self.relay.send_message(&room, username, message).await
    }
}

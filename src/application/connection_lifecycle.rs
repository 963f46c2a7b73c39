//! Binds a transport connection's lifetime to registry membership.

use std::sync::Arc;

use crate::domain::foundation::ConnectionId;
use crate::domain::rooms::{LeaveOutcome, RoomList, RoomRegistry};

use super::broadcast_coordinator::BroadcastCoordinator;
use super::error::HubError;

pub struct ConnectionLifecycle {
    registry: Arc<RoomRegistry>,
    coordinator: Arc<BroadcastCoordinator>,
}

impl ConnectionLifecycle {
    pub fn new(registry: Arc<RoomRegistry>, coordinator: Arc<BroadcastCoordinator>) -> Self {
        Self {
            registry,
            coordinator,
        }
    }

    /// Registers the connection and sends it the current room list, then
    /// re-sends the same list to everyone else so missed updates heal.
    pub async fn on_connect(&self, connection_id: ConnectionId) -> Result<RoomList, HubError> {
        let rooms = self.registry.register_connection(connection_id).await;
        tracing::info!(
            connection_id = %connection_id,
            rooms = rooms.len(),
            "Client connected"
        );
        self.coordinator
            .announce_rooms(&connection_id, &rooms)
            .await?;
        Ok(rooms)
    }

    /// Evicts the connection from its room, if it joined one.
    pub async fn on_disconnect(
        &self,
        connection_id: ConnectionId,
    ) -> Result<Option<LeaveOutcome>, HubError> {
        let Some(outcome) = self.registry.disconnect(&connection_id).await else {
            tracing::debug!(
                connection_id = %connection_id,
                "Client disconnected without joining a room"
            );
            return Ok(None);
        };

        tracing::info!(
            connection_id = %connection_id,
            room_id = %outcome.room,
            username = %outcome.username,
            room_removed = outcome.room_removed,
            "Client disconnected from room"
        );
        self.coordinator
            .member_disconnected(&connection_id, &outcome)
            .await?;
        Ok(Some(outcome))
    }
}

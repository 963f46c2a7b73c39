//! Broadcaster port - Interface for delivering events to connections.
//!
//! The relay never talks to sockets directly. It addresses connections
//! individually, everyone except one connection, or a named group (one
//! group per room), and manages group membership through this port.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::chat::RelayEvent;
use crate::domain::foundation::{ConnectionId, RoomId};

/// Errors raised when an event could not reach its targets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BroadcastError {
    /// The addressed connection is not known to the transport.
    #[error("Connection {0} is not connected")]
    UnknownConnection(ConnectionId),

    /// Some recipients could not be reached.
    #[error("Failed to deliver {event} to {failed} of {attempted} connections")]
    Undelivered {
        event: &'static str,
        failed: usize,
        attempted: usize,
    },

    /// The event could not be encoded for the wire.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for pushing named events to connected clients.
///
/// Implementations should:
/// - Preserve per-connection FIFO order of the events they accept
/// - Treat group operations on unknown connections or groups as no-ops
/// - Report unreachable recipients as errors rather than dropping them silently
///
/// When callers address "the caller, then everyone else" they issue
/// `send_to_connection` before `send_to_others`. That ordering lets the
/// initiating client update first; it is a hint for user experience, not a
/// consistency guarantee.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Sends an event to a single connection.
    async fn send_to_connection(
        &self,
        connection_id: &ConnectionId,
        event: &RelayEvent,
    ) -> Result<(), BroadcastError>;

    /// Sends an event to every connection except `exclude`.
    async fn send_to_others(
        &self,
        exclude: &ConnectionId,
        event: &RelayEvent,
    ) -> Result<(), BroadcastError>;

    /// Sends an event to every connection in a room's group.
    async fn send_to_group(&self, room: &RoomId, event: &RelayEvent)
        -> Result<(), BroadcastError>;

    /// Adds a connection to a room's group.
    async fn add_to_group(
        &self,
        connection_id: &ConnectionId,
        room: &RoomId,
    ) -> Result<(), BroadcastError>;

    /// Removes a connection from a room's group.
    async fn remove_from_group(
        &self,
        connection_id: &ConnectionId,
        room: &RoomId,
    ) -> Result<(), BroadcastError>;
}

//! Connection and group bookkeeping for WebSocket clients.
//!
//! Each connected client owns a bounded outbound queue. The socket task
//! drains the queue into the WebSocket; everything else in the process
//! only ever pushes pre-serialized frames into it.
//!
//! ```text
//! Group: lobby         Group: rust
//! ├── conn-a           ├── conn-c
//! └── conn-b           └── conn-d
//! ```
//!
//! Groups mirror the registry's room membership but are owned by the
//! transport. The relay core keeps them in step through
//! `add_to_group`/`remove_from_group`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};

use crate::domain::chat::RelayEvent;
use crate::domain::foundation::{ConnectionId, RoomId};
use crate::ports::{BroadcastError, Broadcaster};

use super::messages::ServerMessage;

/// Default capacity of each connection's outbound queue.
pub const DEFAULT_OUTBOUND_BUFFER: usize = 64;

/// A serialized frame ready to be written to a socket.
pub type Frame = Arc<str>;

/// Broadcaster backed by live WebSocket connections.
///
/// # Thread Safety
///
/// Both maps sit behind `RwLock`s. Locks are held only long enough to
/// collect the target queues; frames are pushed after the guards drop.
/// Pushing uses `try_send`, so a slow client never stalls the sender:
/// a full queue counts as a failed delivery.
pub struct WebSocketBroadcaster {
    /// Outbound queue per connected client.
    connections: RwLock<HashMap<ConnectionId, mpsc::Sender<Frame>>>,

    /// Transport group membership, keyed by room.
    groups: RwLock<HashMap<RoomId, HashSet<ConnectionId>>>,

    outbound_buffer: usize,
}

impl WebSocketBroadcaster {
    /// Create a broadcaster whose per-connection queues hold
    /// `outbound_buffer` frames.
    pub fn new(outbound_buffer: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            groups: RwLock::new(HashMap::new()),
            outbound_buffer: outbound_buffer.max(1),
        }
    }

    /// Register a new connection and return the receiving end of its queue.
    pub async fn register(&self, connection: ConnectionId) -> mpsc::Receiver<Frame> {
        let (tx, rx) = mpsc::channel(self.outbound_buffer);
        self.connections.write().await.insert(connection, tx);

        tracing::debug!(connection_id = %connection, "Connection registered");
        rx
    }

    /// Forget a connection and drop it from every group.
    pub async fn unregister(&self, connection: &ConnectionId) {
        self.connections.write().await.remove(connection);

        let mut groups = self.groups.write().await;
        groups.retain(|_, members| {
            members.remove(connection);
            !members.is_empty()
        });

        tracing::debug!(connection_id = %connection, "Connection unregistered");
    }

    /// Send a transport-level frame to a single connection.
    pub async fn send_direct(
        &self,
        connection: &ConnectionId,
        message: &ServerMessage,
    ) -> Result<(), BroadcastError> {
        let frame = encode(message)?;
        let sender = self
            .connections
            .read()
            .await
            .get(connection)
            .cloned()
            .ok_or(BroadcastError::UnknownConnection(*connection))?;

        deliver(frame_name(message), frame, vec![sender])
    }

    /// Number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Connections currently in a room's group.
    pub async fn group_members(&self, room: &RoomId) -> HashSet<ConnectionId> {
        self.groups
            .read()
            .await
            .get(room)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for WebSocketBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_OUTBOUND_BUFFER)
    }
}

#[async_trait]
impl Broadcaster for WebSocketBroadcaster {
    async fn send_to_connection(
        &self,
        connection: &ConnectionId,
        event: &RelayEvent,
    ) -> Result<(), BroadcastError> {
        let frame = encode(event)?;
        let sender = self
            .connections
            .read()
            .await
            .get(connection)
            .cloned()
            .ok_or(BroadcastError::UnknownConnection(*connection))?;

        deliver(event.name(), frame, vec![sender])
    }

    async fn send_to_others(
        &self,
        exclude: &ConnectionId,
        event: &RelayEvent,
    ) -> Result<(), BroadcastError> {
        let frame = encode(event)?;
        let targets: Vec<_> = self
            .connections
            .read()
            .await
            .iter()
            .filter(|(id, _)| *id != exclude)
            .map(|(_, sender)| sender.clone())
            .collect();

        deliver(event.name(), frame, targets)
    }

    async fn send_to_group(&self, room: &RoomId, event: &RelayEvent) -> Result<(), BroadcastError> {
        let frame = encode(event)?;
        let members = self.group_members(room).await;
        let targets: Vec<_> = {
            let connections = self.connections.read().await;
            members
                .iter()
                .filter_map(|id| connections.get(id).cloned())
                .collect()
        };

        deliver(event.name(), frame, targets)
    }

    async fn add_to_group(
        &self,
        connection: &ConnectionId,
        room: &RoomId,
    ) -> Result<(), BroadcastError> {
        self.groups
            .write()
            .await
            .entry(room.clone())
            .or_default()
            .insert(*connection);
        Ok(())
    }

    async fn remove_from_group(
        &self,
        connection: &ConnectionId,
        room: &RoomId,
    ) -> Result<(), BroadcastError> {
        let mut groups = self.groups.write().await;
        if let Some(members) = groups.get_mut(room) {
            members.remove(connection);
            if members.is_empty() {
                groups.remove(room);
            }
        }
        Ok(())
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Frame, BroadcastError> {
    serde_json::to_string(value)
        .map(Frame::from)
        .map_err(|e| BroadcastError::Serialization(e.to_string()))
}

fn frame_name(message: &ServerMessage) -> &'static str {
    match message {
        ServerMessage::Connected { .. } => "Connected",
        ServerMessage::Pong { .. } => "Pong",
        ServerMessage::Error { .. } => "Error",
    }
}

/// Push one frame into every target queue, counting the ones that refuse it.
fn deliver(
    event: &'static str,
    frame: Frame,
    targets: Vec<mpsc::Sender<Frame>>,
) -> Result<(), BroadcastError> {
    let attempted = targets.len();
    let failed = targets
        .iter()
        .filter(|sender| sender.try_send(frame.clone()).is_err())
        .count();

    if failed > 0 {
        tracing::warn!(event, failed, attempted, "Frame not delivered to every target");
        return Err(BroadcastError::Undelivered {
            event,
            failed,
            attempted,
        });
    }
    Ok(())
}

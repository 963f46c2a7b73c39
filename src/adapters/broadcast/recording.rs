//! Recording broadcaster for tests and local tooling.
//!
//! Captures every call made through the `Broadcaster` port, in order, so
//! tests can assert on exactly which events went where. Delivery failures
//! can be injected per connection or for every event.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::domain::chat::RelayEvent;
use crate::domain::foundation::{ConnectionId, RoomId};
use crate::ports::{BroadcastError, Broadcaster};

/// Who an event was addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    Connection(ConnectionId),
    /// Everyone except the given connection.
    Others(ConnectionId),
    Group(RoomId),
}

/// One call observed on the port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastRecord {
    Event {
        recipient: Recipient,
        event: RelayEvent,
    },
    AddedToGroup {
        connection_id: ConnectionId,
        room: RoomId,
    },
    RemovedFromGroup {
        connection_id: ConnectionId,
        room: RoomId,
    },
}

/// Broadcaster that records instead of delivering.
///
/// # Example
///
/// ```ignore
/// let broadcaster = Arc::new(RecordingBroadcaster::new());
/// hub.join_room(conn, "lobby", "alice").await?;
/// assert_eq!(broadcaster.event_names().await[0], "AvailableRooms");
/// ```
#[derive(Debug, Default)]
pub struct RecordingBroadcaster {
    records: Mutex<Vec<BroadcastRecord>>,
    unreachable: Mutex<HashSet<ConnectionId>>,
    fail_all: AtomicBool,
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    // === Failure Injection ===

    /// Direct sends to this connection fail with `UnknownConnection`.
    pub async fn make_unreachable(&self, connection_id: ConnectionId) {
        self.unreachable.lock().await.insert(connection_id);
    }

    /// Every event send fails with `Undelivered`.
    pub fn fail_all_events(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    // === Test Helpers ===

    /// Returns all records in call order.
    pub async fn records(&self) -> Vec<BroadcastRecord> {
        self.records.lock().await.clone()
    }

    /// Returns the events sent, with their recipients, in call order.
    pub async fn events(&self) -> Vec<(Recipient, RelayEvent)> {
        self.records
            .lock()
            .await
            .iter()
            .filter_map(|record| match record {
                BroadcastRecord::Event { recipient, event } => {
                    Some((recipient.clone(), event.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Returns just the event names, in call order.
    pub async fn event_names(&self) -> Vec<&'static str> {
        self.events()
            .await
            .iter()
            .map(|(_, event)| event.name())
            .collect()
    }

    /// Returns the events addressed to one recipient.
    pub async fn events_for(&self, recipient: &Recipient) -> Vec<RelayEvent> {
        self.events()
            .await
            .into_iter()
            .filter(|(to, _)| to == recipient)
            .map(|(_, event)| event)
            .collect()
    }

    /// Clears all records (for test isolation).
    pub async fn clear(&self) {
        self.records.lock().await.clear();
    }

    async fn record_event(
        &self,
        recipient: Recipient,
        event: &RelayEvent,
    ) -> Result<(), BroadcastError> {
        self.records.lock().await.push(BroadcastRecord::Event {
            recipient: recipient.clone(),
            event: event.clone(),
        });

        if self.fail_all.load(Ordering::SeqCst) {
            return Err(BroadcastError::Undelivered {
                event: event.name(),
                failed: 1,
                attempted: 1,
            });
        }
        if let Recipient::Connection(connection_id) = recipient {
            if self.unreachable.lock().await.contains(&connection_id) {
                return Err(BroadcastError::UnknownConnection(connection_id));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Broadcaster for RecordingBroadcaster {
    async fn send_to_connection(
        &self,
        connection_id: &ConnectionId,
        event: &RelayEvent,
    ) -> Result<(), BroadcastError> {
        self.record_event(Recipient::Connection(*connection_id), event)
            .await
    }

    async fn send_to_others(
        &self,
        exclude: &ConnectionId,
        event: &RelayEvent,
    ) -> Result<(), BroadcastError> {
        self.record_event(Recipient::Others(*exclude), event).await
    }

    async fn send_to_group(
        &self,
        room: &RoomId,
        event: &RelayEvent,
    ) -> Result<(), BroadcastError> {
        self.record_event(Recipient::Group(room.clone()), event).await
    }

    async fn add_to_group(
        &self,
        connection_id: &ConnectionId,
        room: &RoomId,
    ) -> Result<(), BroadcastError> {
        self.records.lock().await.push(BroadcastRecord::AddedToGroup {
            connection_id: *connection_id,
            room: room.clone(),
        });
        Ok(())
    }

    async fn remove_from_group(
        &self,
        connection_id: &ConnectionId,
        room: &RoomId,
    ) -> Result<(), BroadcastError> {
        self.records.lock().await.push(BroadcastRecord::RemovedFromGroup {
            connection_id: *connection_id,
            room: room.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(name: &str) -> RelayEvent {
        RelayEvent::UserJoined {
            username: name.to_string(),
        }
    }

    #[tokio::test]
    async fn records_events_in_call_order() {
        let broadcaster = RecordingBroadcaster::new();
        let conn = ConnectionId::new();
        let room = RoomId::new("lobby").unwrap();

        broadcaster.send_to_connection(&conn, &joined("a")).await.unwrap();
        broadcaster.send_to_group(&room, &joined("b")).await.unwrap();

        let events = broadcaster.events().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].0, Recipient::Connection(conn));
        assert_eq!(events[1].0, Recipient::Group(room));
    }

    #[tokio::test]
    async fn unreachable_connection_fails_direct_sends() {
        let broadcaster = RecordingBroadcaster::new();
        let conn = ConnectionId::new();
        broadcaster.make_unreachable(conn).await;

        let result = broadcaster.send_to_connection(&conn, &joined("a")).await;

        assert_eq!(result, Err(BroadcastError::UnknownConnection(conn)));
        assert!(broadcaster.send_to_others(&conn, &joined("a")).await.is_ok());
    }

    #[tokio::test]
    async fn fail_all_fails_every_event() {
        let broadcaster = RecordingBroadcaster::new();
        broadcaster.fail_all_events(true);

        let result = broadcaster
            .send_to_group(&RoomId::new("r").unwrap(), &joined("a"))
            .await;

        assert!(matches!(result, Err(BroadcastError::Undelivered { .. })));
        assert_eq!(broadcaster.event_names().await, vec!["UserJoined"]);
    }

    #[tokio::test]
    async fn clear_removes_records() {
        let broadcaster = RecordingBroadcaster::new();
        broadcaster
            .add_to_group(&ConnectionId::new(), &RoomId::new("r").unwrap())
            .await
            .unwrap();

        broadcaster.clear().await;

        assert!(broadcaster.records().await.is_empty());
    }
}

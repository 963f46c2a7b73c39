//! Integration tests for the chat hub.
//!
//! These tests drive `ChatHub` end-to-end through its public surface:
//! 1. Room operations mutate the registry and produce snapshots
//! 2. The coordinator turns snapshots into ordered notifications
//! 3. Messages fan out to the room and are persisted behind delivery
//!
//! Uses the recording broadcaster and in-memory store so no network or
//! database is needed.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chat_relay::adapters::broadcast::{BroadcastRecord, Recipient, RecordingBroadcaster};
use chat_relay::adapters::InMemoryMessageStore;
use chat_relay::application::{ChatHub, HubError};
use chat_relay::domain::chat::{ChatMessage, RelayEvent};
use chat_relay::domain::foundation::{ConnectionId, ErrorCode, RoomId};
use chat_relay::ports::{BroadcastError, Broadcaster, MessageStore, MessageStoreError};

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Store that rejects every write
#[derive(Default)]
struct FailingStore {
    attempts: AtomicUsize,
}

#[async_trait]
impl MessageStore for FailingStore {
    async fn save_message(&self, _message: &ChatMessage) -> Result<(), MessageStoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(MessageStoreError::Unavailable("store offline".to_string()))
    }

    async fn messages_for_room(&self, _room: &RoomId) -> Result<Vec<ChatMessage>, MessageStoreError> {
        Err(MessageStoreError::Unavailable("store offline".to_string()))
    }
}

/// Records like `RecordingBroadcaster`, but the first room list sent to a
/// single connection is held back before it goes out.
#[derive(Default)]
struct SlowFirstRoomList {
    inner: RecordingBroadcaster,
    delayed: AtomicBool,
}

#[async_trait]
impl Broadcaster for SlowFirstRoomList {
    async fn send_to_connection(
        &self,
        connection_id: &ConnectionId,
        event: &RelayEvent,
    ) -> Result<(), BroadcastError> {
        if matches!(event, RelayEvent::AvailableRooms { .. })
            && !self.delayed.swap(true, Ordering::SeqCst)
        {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        self.inner.send_to_connection(connection_id, event).await
    }

    async fn send_to_others(
        &self,
        exclude: &ConnectionId,
        event: &RelayEvent,
    ) -> Result<(), BroadcastError> {
        self.inner.send_to_others(exclude, event).await
    }

    async fn send_to_group(&self, room: &RoomId, event: &RelayEvent) -> Result<(), BroadcastError> {
        self.inner.send_to_group(room, event).await
    }

    async fn add_to_group(
        &self,
        connection_id: &ConnectionId,
        room: &RoomId,
    ) -> Result<(), BroadcastError> {
        self.inner.add_to_group(connection_id, room).await
    }

    async fn remove_from_group(
        &self,
        connection_id: &ConnectionId,
        room: &RoomId,
    ) -> Result<(), BroadcastError> {
        self.inner.remove_from_group(connection_id, room).await
    }
}

struct Harness {
    hub: ChatHub,
    broadcaster: Arc<RecordingBroadcaster>,
    store: InMemoryMessageStore,
}

impl Harness {
    fn new() -> Self {
        let broadcaster = Arc::new(RecordingBroadcaster::new());
        let store = InMemoryMessageStore::new();
        let hub = ChatHub::new(broadcaster.clone(), Arc::new(store.clone()));
        Self {
            hub,
            broadcaster,
            store,
        }
    }

    async fn connect(&self) -> ConnectionId {
        let conn = ConnectionId::new();
        self.hub.on_connect(conn).await.unwrap();
        conn
    }

    async fn active_rooms(&self) -> Vec<String> {
        self.hub
            .registry()
            .snapshot()
            .await
            .as_slice()
            .iter()
            .map(|r| r.to_string())
            .collect()
    }

    async fn members(&self, room: &str) -> Option<Vec<String>> {
        self.hub
            .registry()
            .snapshot_room(&RoomId::new(room).unwrap())
            .await
    }
}

fn room(name: &str) -> RoomId {
    RoomId::new(name).unwrap()
}

// =============================================================================
// Room scenarios
// =============================================================================

#[tokio::test]
async fn two_users_join_lobby_then_one_leaves() {
    let h = Harness::new();
    let alice = h.connect().await;
    let bob = h.connect().await;

    h.hub.join_room(alice, "lobby", "alice").await.unwrap();
    h.hub.join_room(bob, "lobby", "bob").await.unwrap();
    h.broadcaster.clear().await;

    let outcome = h.hub.leave_room(alice, "lobby", "alice").await.unwrap().unwrap();

    assert!(!outcome.room_removed);
    assert_eq!(outcome.members, vec!["bob".to_string()]);
    assert_eq!(h.members("lobby").await, Some(vec!["bob".to_string()]));
    assert_eq!(h.active_rooms().await, vec!["lobby"]);

    let group = h.broadcaster.events_for(&Recipient::Group(room("lobby"))).await;
    assert_eq!(
        group,
        vec![
            RelayEvent::UserLeft {
                username: "alice".to_string()
            },
            RelayEvent::UpdateUserList {
                room_id: room("lobby"),
                users: vec!["bob".to_string()]
            },
        ]
    );
}

#[tokio::test]
async fn join_then_disconnect_removes_room() {
    let h = Harness::new();
    let alice = h.connect().await;
    let bob = h.connect().await;

    h.hub.join_room(alice, "r1", "alice").await.unwrap();
    h.broadcaster.clear().await;

    let outcome = h.hub.on_disconnect(alice).await.unwrap().unwrap();

    assert!(outcome.room_removed);
    assert_eq!(outcome.username, "alice");
    assert!(h.active_rooms().await.is_empty());
    assert_eq!(h.hub.registry().connection_count().await, 1);

    // Only the remaining connection hears about the new room list
    let events = h.broadcaster.events().await;
    assert_eq!(
        events,
        vec![(Recipient::Others(alice), RelayEvent::AvailableRooms { rooms: vec![] })]
    );
    assert!(h
        .broadcaster
        .events_for(&Recipient::Connection(alice))
        .await
        .is_empty());
    assert_eq!(h.hub.registry().connection_room(&bob).await, None);
}

#[tokio::test]
async fn joining_second_room_moves_connection() {
    let h = Harness::new();
    let alice = h.connect().await;

    h.hub.join_room(alice, "r1", "alice").await.unwrap();
    let outcome = h.hub.join_room(alice, "r2", "alice").await.unwrap();

    let previous = outcome.previous.expect("left r1");
    assert_eq!(previous.room, room("r1"));
    assert!(previous.room_removed);
    assert_eq!(h.hub.registry().connection_room(&alice).await, Some(room("r2")));
    assert_eq!(h.active_rooms().await, vec!["r2"]);
    assert_eq!(h.members("r1").await, None);
}

#[tokio::test]
async fn join_sequence_is_ordered() {
    let h = Harness::new();
    let alice = h.connect().await;
    h.broadcaster.clear().await;

    h.hub.join_room(alice, "lobby", "alice").await.unwrap();

    let records = h.broadcaster.records().await;
    assert_eq!(
        records[0],
        BroadcastRecord::AddedToGroup {
            connection_id: alice,
            room: room("lobby")
        }
    );
    assert_eq!(
        h.broadcaster.event_names().await,
        vec!["AvailableRooms", "AvailableRooms", "UpdateUserList", "UserJoined"]
    );
}

#[tokio::test]
async fn double_create_yields_one_room() {
    let h = Harness::new();
    let alice = h.connect().await;

    let first = h.hub.create_room(alice, "lobby").await.unwrap();
    let second = h.hub.create_room(alice, "lobby").await.unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(h.active_rooms().await, vec!["lobby"]);
}

#[tokio::test]
async fn created_room_stays_active_without_members() {
    let h = Harness::new();
    let alice = h.connect().await;

    h.hub.create_room(alice, "quiet").await.unwrap();

    assert_eq!(h.active_rooms().await, vec!["quiet"]);
    assert_eq!(h.members("quiet").await, Some(vec![]));
}

#[tokio::test]
async fn room_is_fresh_after_last_member_leaves() {
    let h = Harness::new();
    let alice = h.connect().await;
    let bob = h.connect().await;

    h.hub.join_room(alice, "r1", "alice").await.unwrap();
    h.hub.leave_room(alice, "r1", "alice").await.unwrap();
    h.hub.join_room(bob, "r1", "bob").await.unwrap();

    assert_eq!(h.members("r1").await, Some(vec!["bob".to_string()]));
}

#[tokio::test]
async fn leave_of_unbound_connection_is_a_no_op() {
    let h = Harness::new();
    let alice = h.connect().await;
    let bob = h.connect().await;
    h.hub.join_room(alice, "lobby", "alice").await.unwrap();
    h.broadcaster.clear().await;

    let outcome = h.hub.leave_room(bob, "lobby", "bob").await.unwrap();

    assert!(outcome.is_none());
    assert_eq!(h.members("lobby").await, Some(vec!["alice".to_string()]));
    assert_eq!(
        h.broadcaster.records().await,
        vec![BroadcastRecord::RemovedFromGroup {
            connection_id: bob,
            room: room("lobby")
        }]
    );
}

#[tokio::test]
async fn leave_removes_recorded_username() {
    let h = Harness::new();
    let alice = h.connect().await;
    h.hub.join_room(alice, "lobby", "alice").await.unwrap();

    let outcome = h
        .hub
        .leave_room(alice, "lobby", "someone-else")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.username, "alice");
    assert!(h.active_rooms().await.is_empty());
}

#[tokio::test]
async fn shared_username_stays_until_last_connection_leaves() {
    let h = Harness::new();
    let tab1 = h.connect().await;
    let tab2 = h.connect().await;

    h.hub.join_room(tab1, "lobby", "alice").await.unwrap();
    h.hub.join_room(tab2, "lobby", "alice").await.unwrap();
    h.hub.on_disconnect(tab1).await.unwrap();

    assert_eq!(h.members("lobby").await, Some(vec!["alice".to_string()]));

    h.hub.on_disconnect(tab2).await.unwrap();
    assert_eq!(h.members("lobby").await, None);
}

// =============================================================================
// Validation and delivery failures
// =============================================================================

#[tokio::test]
async fn empty_arguments_are_rejected_before_mutation() {
    let h = Harness::new();
    let alice = h.connect().await;
    h.broadcaster.clear().await;

    let no_room = h.hub.join_room(alice, "", "alice").await;
    let no_user = h.hub.join_room(alice, "lobby", "").await;
    let blank_create = h.hub.create_room(alice, "   ").await;

    for result in [no_room.map(|_| ()), no_user.map(|_| ()), blank_create.map(|_| ())] {
        let err = result.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }
    assert!(h.active_rooms().await.is_empty());
    assert!(h.broadcaster.records().await.is_empty());
}

#[tokio::test]
async fn delivery_failure_keeps_mutation() {
    let h = Harness::new();
    let alice = h.connect().await;
    h.broadcaster.clear().await;
    h.broadcaster.fail_all_events(true);

    let result = h.hub.join_room(alice, "lobby", "alice").await;

    assert!(matches!(result, Err(HubError::DeliveryFailure(_))));
    assert_eq!(h.members("lobby").await, Some(vec!["alice".to_string()]));
    // Every step was still attempted
    assert_eq!(h.broadcaster.event_names().await.len(), 4);
}

// =============================================================================
// Messages
// =============================================================================

#[tokio::test]
async fn message_is_delivered_and_persisted() {
    let h = Harness::new();
    let alice = h.connect().await;
    h.hub.join_room(alice, "lobby", "alice").await.unwrap();
    h.broadcaster.clear().await;

    let receipt = h
        .hub
        .send_message(alice, "lobby", "alice", "hello")
        .await
        .unwrap();
    receipt.persistence.await.unwrap();

    let events = h.broadcaster.events_for(&Recipient::Group(room("lobby"))).await;
    assert_eq!(
        events,
        vec![RelayEvent::ReceiveMessage {
            username: "alice".to_string(),
            message: "hello".to_string(),
            timestamp: receipt.timestamp,
        }]
    );

    let stored = h.store.messages_for_room(&room("lobby")).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, receipt.message_id);
    assert_eq!(stored[0].content, "hello");
}

#[tokio::test]
async fn send_with_failing_store_still_succeeds() {
    let broadcaster = Arc::new(RecordingBroadcaster::new());
    let store = Arc::new(FailingStore::default());
    let hub = ChatHub::new(broadcaster.clone(), store.clone());
    let alice = ConnectionId::new();
    hub.join_room(alice, "lobby", "alice").await.unwrap();

    let receipt = hub.send_message(alice, "lobby", "alice", "hi").await.unwrap();
    receipt.persistence.await.unwrap();

    assert_eq!(store.attempts.load(Ordering::SeqCst), 1);
    assert!(broadcaster
        .event_names()
        .await
        .contains(&"ReceiveMessage"));
}

#[tokio::test]
async fn overlong_message_is_rejected() {
    let broadcaster = Arc::new(RecordingBroadcaster::new());
    let store = InMemoryMessageStore::new();
    let hub = ChatHub::with_max_message_len(broadcaster.clone(), Arc::new(store.clone()), 5);
    let alice = ConnectionId::new();

    let err = hub
        .send_message(alice, "lobby", "alice", "too long")
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::MessageTooLong);
    assert_eq!(store.message_count().await, 0);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sessions_leave_consistent_registry() {
    let h = Arc::new(Harness::new());
    let mut handles = Vec::new();

    for i in 0..32 {
        let h = h.clone();
        handles.push(tokio::spawn(async move {
            let conn = ConnectionId::new();
            h.hub.on_connect(conn).await.unwrap();
            let name = format!("user{i}");
            let first = format!("room{}", i % 4);
            let second = format!("room{}", (i + 1) % 4);

            h.hub.join_room(conn, &first, &name).await.unwrap();
            h.hub.join_room(conn, &second, &name).await.unwrap();
            if i % 2 == 0 {
                h.hub.leave_room(conn, &second, &name).await.unwrap();
            }
            if i % 3 == 0 {
                h.hub.on_disconnect(conn).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // Survivors: odd i not divisible by 3, each bound to room((i + 1) % 4)
    let survivors: Vec<usize> = (0..32).filter(|i| i % 2 == 1 && i % 3 != 0).collect();
    let mut expected_rooms: Vec<String> = survivors
        .iter()
        .map(|i| format!("room{}", (i + 1) % 4))
        .collect();
    expected_rooms.sort();
    expected_rooms.dedup();

    assert_eq!(h.active_rooms().await, expected_rooms);
    for room_name in &expected_rooms {
        let members = h.members(room_name).await.unwrap();
        let expected: Vec<String> = {
            let mut names: Vec<String> = survivors
                .iter()
                .filter(|i| format!("room{}", (*i + 1) % 4) == *room_name)
                .map(|i| format!("user{i}"))
                .collect();
            names.sort();
            names
        };
        assert_eq!(&members, &expected);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn room_lists_converge_when_an_earlier_publication_is_slow() {
    let broadcaster = Arc::new(SlowFirstRoomList::default());
    let hub = ChatHub::new(broadcaster.clone(), Arc::new(InMemoryMessageStore::new()));

    let first = {
        let hub = hub.clone();
        tokio::spawn(async move { hub.create_room(ConnectionId::new(), "a").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let second = {
        let hub = hub.clone();
        tokio::spawn(async move { hub.create_room(ConnectionId::new(), "b").await })
    };
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    let registry_rooms = hub.registry().snapshot().await.to_vec();
    let last_published = broadcaster
        .inner
        .events()
        .await
        .into_iter()
        .filter_map(|(_, event)| match event {
            RelayEvent::AvailableRooms { rooms } => Some(rooms),
            _ => None,
        })
        .last();

    assert_eq!(registry_rooms, vec![room("a"), room("b")]);
    assert_eq!(last_published, Some(registry_rooms));
}

//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the relay to external systems:
//! - `websocket` - Live client connections (production `Broadcaster`)
//! - `broadcast` - Recording broadcaster for tests and embedding
//! - `storage` - In-memory message store
//! - `postgres` - PostgreSQL message store
//! - `http` - Health and room status endpoints

pub mod broadcast;
pub mod http;
pub mod postgres;
pub mod storage;
pub mod websocket;

pub use broadcast::RecordingBroadcaster;
pub use postgres::PostgresMessageStore;
pub use storage::InMemoryMessageStore;
pub use websocket::{WebSocketBroadcaster, WebSocketState};

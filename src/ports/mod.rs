//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the relay core and the outside world. Adapters implement these ports.
//!
//! - `Broadcaster` - Delivers named events to one, some, or all connections
//! - `MessageStore` - Best-effort durable storage of chat messages

mod broadcaster;
mod message_store;

pub use broadcaster::{BroadcastError, Broadcaster};
pub use message_store::{MessageStore, MessageStoreError};

//! Application layer - the relay's operations and their orchestration.
//!
//! - `ChatHub` - Public operation surface, one call per client request
//! - `BroadcastCoordinator` - Notification sequencing after mutations
//! - `ConnectionLifecycle` - Connect/disconnect reconciliation
//! - `MessageRelay` - Message fan-out with write-behind persistence

mod broadcast_coordinator;
mod chat_hub;
mod connection_lifecycle;
mod error;
mod message_relay;

pub use broadcast_coordinator::BroadcastCoordinator;
pub use chat_hub::ChatHub;
pub use connection_lifecycle::ConnectionLifecycle;
pub use error::HubError;
pub use message_relay::{MessageRelay, RelayReceipt, DEFAULT_MAX_MESSAGE_LEN};

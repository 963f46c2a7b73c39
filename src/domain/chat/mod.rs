//! Chat vocabulary - message records and the events clients receive.

mod events;
mod message;

pub use events::RelayEvent;
pub use message::{validate_content, validate_username, ChatMessage};

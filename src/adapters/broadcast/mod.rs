//! Non-network broadcaster adapters.
//!
//! - `RecordingBroadcaster` - Captures port calls for assertions

mod recording;

pub use recording::{BroadcastRecord, Recipient, RecordingBroadcaster};

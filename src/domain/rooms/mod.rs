//! Room membership - the registry and the snapshots it hands out.

mod registry;
mod snapshot;

pub use registry::RoomRegistry;
pub use snapshot::{CreateOutcome, JoinOutcome, LeaveOutcome, RoomList};

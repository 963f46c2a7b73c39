//! Domain layer containing the relay's state and vocabulary.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, errors)
//! - `chat` - Message records and client-facing events
//! - `rooms` - Room registry and its snapshots

pub mod chat;
pub mod foundation;
pub mod rooms;

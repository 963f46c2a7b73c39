//! Storage adapters
//!
//! Provides in-process implementations of the message store port.

mod in_memory_message_store;

pub use in_memory_message_store::InMemoryMessageStore;

//! PostgreSQL adapters - Database implementations for storage ports.
//!
//! - `PostgresMessageStore` - Durable chat message log

mod message_store;

pub use message_store::PostgresMessageStore;

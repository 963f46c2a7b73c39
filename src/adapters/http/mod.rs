//! HTTP adapters - REST status endpoints.

pub mod rooms;

// Re-export key types for convenience
pub use rooms::rooms_routes;

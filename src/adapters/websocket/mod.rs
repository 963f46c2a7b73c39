//! WebSocket adapters for real-time chat connections.
//!
//! This module carries relay events to connected clients and client
//! requests to the `ChatHub`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                            ChatHub                                   │
//! │   RoomRegistry → BroadcastCoordinator → Broadcaster port            │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ publishes
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    WebSocketBroadcaster                              │
//! │   Group: lobby         Group: rust                                  │
//! │   ├── conn-a           ├── conn-c                                   │
//! │   └── conn-b           └── conn-d                                   │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ per-connection queues
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                 handle_socket (one per client)                       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`messages`] - WebSocket message protocol types
//! - [`connections`] - Connection queues and transport groups
//! - [`handler`] - Axum WebSocket upgrade handler

pub mod connections;
pub mod handler;
pub mod messages;

pub use connections::{WebSocketBroadcaster, DEFAULT_OUTBOUND_BUFFER};
pub use handler::{websocket_router, ws_handler, WebSocketState};
pub use messages::{ClientMessage, ServerMessage};

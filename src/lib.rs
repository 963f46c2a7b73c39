//! Chat Relay - Real-time room-based chat over WebSockets
//!
//! This crate keeps a consistent in-process registry of rooms and their
//! members, fans out room events to connected clients, and persists chat
//! messages behind the delivery path.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

//! Rooms HTTP adapter module.
//!
//! Read-only status endpoints over the live room registry.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{ErrorResponse, RoomDetailResponse, RoomsResponse};
pub use routes::rooms_routes;

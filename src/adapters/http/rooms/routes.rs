//! HTTP routes for room status endpoints.

use axum::routing::get;
use axum::Router;

use crate::application::ChatHub;

use super::handlers::{get_room, health, list_rooms};

/// Creates the status router with all routes.
pub fn rooms_routes(hub: ChatHub) -> Router {
    Router::new()
        // GET /health
        .route("/health", get(health))
        // GET /api/rooms
        .route("/api/rooms", get(list_rooms))
        // GET /api/rooms/:room_id
        .route("/api/rooms/:room_id", get(get_room))
        .with_state(hub)
}

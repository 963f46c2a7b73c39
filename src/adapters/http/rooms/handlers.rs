//! HTTP handlers for room status endpoints.
//!
//! These handlers read registry snapshots; they never mutate state or
//! trigger notifications.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::ChatHub;
use crate::domain::foundation::RoomId;

use super::dto::{ErrorResponse, RoomDetailResponse, RoomsResponse};

/// Rooms API error that implements IntoResponse.
pub enum RoomsApiError {
    BadRequest(String),
    NotFound(String),
}

impl IntoResponse for RoomsApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            RoomsApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(msg))
            }
            RoomsApiError::NotFound(id) => {
                (StatusCode::NOT_FOUND, ErrorResponse::not_found("Room", &id))
            }
        };
        (status, Json(error)).into_response()
    }
}

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}

/// GET /api/rooms
pub async fn list_rooms(State(hub): State<ChatHub>) -> Json<RoomsResponse> {
    let registry = hub.registry();
    let rooms = registry.snapshot().await.to_vec();
    let connections = registry.connection_count().await;

    Json(RoomsResponse { rooms, connections })
}

/// GET /api/rooms/:room_id
pub async fn get_room(
    State(hub): State<ChatHub>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailResponse>, RoomsApiError> {
    let room = RoomId::new(room_id).map_err(|e| RoomsApiError::BadRequest(e.to_string()))?;

    let users = hub
        .registry()
        .snapshot_room(&room)
        .await
        .ok_or_else(|| RoomsApiError::NotFound(room.to_string()))?;

    Ok(Json(RoomDetailResponse {
        room_id: room,
        users,
    }))
}

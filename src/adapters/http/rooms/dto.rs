//! HTTP DTOs for room status endpoints.

use serde::Serialize;

use crate::domain::foundation::RoomId;

/// Response for `GET /api/rooms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomsResponse {
    pub rooms: Vec<RoomId>,
    pub connections: usize,
}

/// Response for `GET /api/rooms/:room_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailResponse {
    pub room_id: RoomId,
    pub users: Vec<String>,
}

/// Standard error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(resource_type: &str, id: &str) -> Self {
        Self {
            code: "NOT_FOUND".to_string(),
            message: format!("{} '{}' not found", resource_type, id),
        }
    }
}

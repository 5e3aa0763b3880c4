// Common DTOs for public API
//
// These types are shared across multiple API endpoints.

use axum::http::StatusCode;
use axum::Json;
use meetbrief_core::MeetingError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of every 401 produced by the sync and MCP endpoints
pub const UNAUTHORIZED: &str = "Unauthorized";

/// Standard error response for API endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message describing what went wrong.
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    /// Convert to axum response tuple
    pub fn into_response(self, status: StatusCode) -> (StatusCode, Json<Self>) {
        (status, Json(self))
    }

    pub fn unauthorized() -> (StatusCode, Json<Self>) {
        Self::new(UNAUTHORIZED).into_response(StatusCode::UNAUTHORIZED)
    }

    /// Map a core error to a response without leaking its detail.
    ///
    /// Authentication problems become 401 `Unauthorized`, everything else a
    /// 500 carrying `message`.
    pub fn from_meeting_error(err: &MeetingError, message: &str) -> (StatusCode, Json<Self>) {
        if err.is_authentication() {
            tracing::debug!("Rejecting request: {}", err);
            return Self::unauthorized();
        }

        tracing::error!("{}: {}", message, err);
        Self::new(message).into_response(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_maps_to_401() {
        let (status, Json(body)) =
            ErrorResponse::from_meeting_error(&MeetingError::auth("no session"), "Failed");
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.error, "Unauthorized");
    }

    #[test]
    fn test_other_errors_map_to_500_without_detail() {
        let (status, Json(body)) = ErrorResponse::from_meeting_error(
            &MeetingError::calendar("googleapis returned 503 for token ya29.secret"),
            "Failed to fetch meetings",
        );
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Failed to fetch meetings");

        let (status, _) = ErrorResponse::from_meeting_error(
            &MeetingError::protocol(-32601, "Method not found"),
            "Failed to call MCP tool",
        );
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}

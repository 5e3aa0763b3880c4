// Meetings HTTP route
// Decision: Every request re-syncs from the calendar; there is no read-only listing

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use meetbrief_core::{MeetingsOverview, SyncPipeline};
use std::sync::Arc;

use super::common::ErrorResponse;
use crate::auth::{AuthState, FromRef, OptionalAuthUser};

/// App state for meetings routes
#[derive(Clone)]
pub struct MeetingsState {
    pub pipeline: Arc<SyncPipeline>,
    pub auth: AuthState,
}

impl FromRef<MeetingsState> for AuthState {
    fn from_ref(input: &MeetingsState) -> Self {
        input.auth.clone()
    }
}

/// Create meetings routes
pub fn routes(state: MeetingsState) -> Router {
    Router::new()
        .route("/meetings", get(list_meetings))
        .with_state(state)
}

/// GET /meetings - Sync the caller's calendar and return the dashboard
#[utoipa::path(
    get,
    path = "/meetings",
    responses(
        (status = 200, description = "Upcoming and past meetings", body = MeetingsOverview),
        (status = 401, description = "Not signed in or no calendar access", body = ErrorResponse),
        (status = 500, description = "Calendar or storage failure", body = ErrorResponse)
    ),
    tag = "meetings"
)]
pub async fn list_meetings(
    State(state): State<MeetingsState>,
    user: OptionalAuthUser,
) -> Result<Json<MeetingsOverview>, (StatusCode, Json<ErrorResponse>)> {
    let session = user.session();

    let overview = state
        .pipeline
        .sync_and_summarize(session.as_ref())
        .await
        .map_err(|e| ErrorResponse::from_meeting_error(&e, "Failed to fetch meetings"))?;

    Ok(Json(overview))
}

// OpenAPI specification generation
//
// Served at /api-doc/openapi.json and printed by the export-openapi binary.

use crate::api;
use crate::auth;
use meetbrief_core::{MeetingView, MeetingsOverview};
use utoipa::OpenApi;

/// OpenAPI documentation for the Meetbrief API
#[derive(OpenApi)]
#[openapi(
    paths(
        api::meetings::list_meetings,
        api::mcp::get_mcp_status,
        api::mcp::call_mcp_tool,
        auth::routes::get_auth_config,
        auth::routes::get_current_user,
        auth::routes::logout,
    ),
    components(
        schemas(
            MeetingView, MeetingsOverview,
            api::ErrorResponse,
            api::mcp::McpIntegration, api::mcp::McpStatusResponse,
            api::mcp::CallToolRequest, api::mcp::CallToolResponse,
            auth::routes::UserInfoResponse, auth::routes::AuthConfigResponse,
        )
    ),
    tags(
        (name = "meetings", description = "Calendar sync and meeting summaries"),
        (name = "mcp", description = "Model Context Protocol integration"),
        (name = "auth", description = "Google sign-in and session endpoints")
    ),
    info(
        title = "Meetbrief API",
        description = "Calendar dashboard with AI meeting summaries",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate the OpenAPI spec as a pretty-printed JSON string
    pub fn to_json() -> String {
        Self::openapi()
            .to_pretty_json()
            .expect("Failed to serialize OpenAPI spec")
    }
}

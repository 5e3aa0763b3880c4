// MCP HTTP routes
// Decision: Status is probed live on every request (initialize + tools/list)
// Decision: Tool calls always carry the caller's stored calendar token, never one from the body

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use meetbrief_core::{CalendarService, McpClient};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use super::common::ErrorResponse;
use crate::auth::{AuthState, FromRef, OptionalAuthUser};

pub const MCP_MESSAGE: &str = "Model Context Protocol integration for Google Calendar";
pub const PROTOCOL_NAME: &str = "MCP";

/// App state for MCP routes
#[derive(Clone)]
pub struct McpState {
    pub client: Arc<McpClient>,
    /// Used to resolve the caller's calendar token
    pub calendar: CalendarService,
    /// Whether meetings are fetched through MCP
    pub enabled: bool,
    pub auth: AuthState,
}

impl FromRef<McpState> for AuthState {
    fn from_ref(input: &McpState) -> Self {
        input.auth.clone()
    }
}

/// MCP integration details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct McpIntegration {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    pub available_tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub fallback_mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response of `GET /mcp`, also returned (degraded) with a 500
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct McpStatusResponse {
    pub mcp_integration: McpIntegration,
}

/// Request to call an MCP tool
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallToolRequest {
    /// Name of the remote tool
    #[schema(example = "google_calendar_list_events")]
    pub tool_name: Option<String>,
    /// Tool arguments; `access_token` is always overwritten server-side
    pub args: Option<Value>,
}

/// Result of an MCP tool call
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CallToolResponse {
    pub tool: String,
    pub result: Value,
    pub protocol: String,
}

/// Create MCP routes
pub fn routes(state: McpState) -> Router {
    Router::new()
        .route("/mcp", get(get_mcp_status).post(call_mcp_tool))
        .with_state(state)
}

fn fallback_mode(enabled: bool) -> &'static str {
    if enabled {
        "Direct MCP communication"
    } else {
        "MCP wrapper around Google API"
    }
}

/// GET /mcp - MCP integration status
#[utoipa::path(
    get,
    path = "/mcp",
    responses(
        (status = 200, description = "MCP server reachable", body = McpStatusResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 500, description = "MCP server unavailable", body = McpStatusResponse)
    ),
    tag = "mcp"
)]
pub async fn get_mcp_status(
    State(state): State<McpState>,
    user: OptionalAuthUser,
) -> Response {
    if user.0.is_none() {
        return ErrorResponse::unauthorized().into_response();
    }

    match state.client.status(state.enabled).await {
        Ok(status) => Json(McpStatusResponse {
            mcp_integration: McpIntegration {
                enabled: status.enabled,
                server_url: Some(status.server_url),
                available_tools: status.available_tools,
                implementation: Some(status.implementation),
                message: Some(MCP_MESSAGE.to_string()),
                fallback_mode: fallback_mode(status.enabled).to_string(),
                error: None,
            },
        })
        .into_response(),
        Err(e) => {
            tracing::error!(server_url = %state.client.server_url(), "MCP status check failed: {}", e);
            let body = McpStatusResponse {
                mcp_integration: McpIntegration {
                    enabled: false,
                    server_url: None,
                    available_tools: Vec::new(),
                    implementation: None,
                    message: None,
                    fallback_mode: "Direct Google API with MCP wrapper".to_string(),
                    error: Some("MCP server unavailable".to_string()),
                },
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

/// POST /mcp - Call an MCP tool on behalf of the caller
#[utoipa::path(
    post,
    path = "/mcp",
    request_body = CallToolRequest,
    responses(
        (status = 200, description = "Tool result", body = CallToolResponse),
        (status = 400, description = "Malformed body, missing tool name or invalid arguments", body = ErrorResponse),
        (status = 401, description = "Not signed in or no calendar access", body = ErrorResponse),
        (status = 500, description = "Tool call failed", body = ErrorResponse)
    ),
    tag = "mcp"
)]
pub async fn call_mcp_tool(
    State(state): State<McpState>,
    user: OptionalAuthUser,
    body: Result<Json<CallToolRequest>, JsonRejection>,
) -> Result<Json<CallToolResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Some(session) = user.session() else {
        return Err(ErrorResponse::unauthorized());
    };

    // Extractor detail stays in the log
    let Json(req) = body.map_err(|e| {
        tracing::debug!("Rejecting MCP tool call body: {}", e);
        ErrorResponse::new("Invalid request body").into_response(StatusCode::BAD_REQUEST)
    })?;

    let tool_name = req
        .tool_name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| {
            ErrorResponse::new("Tool name is required").into_response(StatusCode::BAD_REQUEST)
        })?;

    let mut arguments = match req.args {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(ErrorResponse::new("Tool arguments must be an object")
                .into_response(StatusCode::BAD_REQUEST))
        }
    };

    let access_token = state
        .calendar
        .access_token(Some(&session))
        .await
        .map_err(|e| ErrorResponse::from_meeting_error(&e, "Failed to call MCP tool"))?;
    arguments.insert("access_token".to_string(), Value::String(access_token));

    tracing::debug!(tool = %tool_name, user_id = %session.user_id, "Calling MCP tool");

    let result = state
        .client
        .call_tool(&tool_name, arguments)
        .await
        .map_err(|e| ErrorResponse::from_meeting_error(&e, "Failed to call MCP tool"))?;

    Ok(Json(CallToolResponse {
        tool: tool_name,
        result,
        protocol: PROTOCOL_NAME.to_string(),
    }))
}

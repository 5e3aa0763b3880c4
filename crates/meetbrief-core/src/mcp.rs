// Model Context Protocol client
//
// Minimal JSON-RPC 2.0 over HTTP: one POST per call, no retries, no batching.
// Request ids start at 1 and increase per call on a client instance.
// Transport and HTTP failures map to `Transport`; error envelopes map to `Protocol`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::calendar::EventQuery;
use crate::error::{MeetingError, Result};
use crate::event::RawEvent;
use crate::traits::CalendarBackend;

pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
pub const DEFAULT_MCP_SERVER_URL: &str = "http://localhost:8080/mcp";
pub const MCP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Tool that lists Google Calendar events on the MCP server
pub const LIST_EVENTS_TOOL: &str = "google_calendar_list_events";

pub const MCP_IMPLEMENTATION: &str = "Model Context Protocol with Google Calendar API wrapper";

const CLIENT_NAME: &str = "meetbrief";

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// Error envelope returned by the server
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Tool advertised by `tools/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

/// MCP client bound to one server URL
pub struct McpClient {
    client: Client,
    server_url: String,
    next_id: AtomicU64,
}

impl McpClient {
    pub fn new(server_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(server_url, MCP_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(server_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MeetingError::config(format!("Failed to build MCP HTTP client: {}", e)))?;

        Ok(Self {
            client,
            server_url: server_url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Capability negotiation handshake
    pub async fn initialize(&self) -> Result<Value> {
        self.request(
            "initialize",
            json!({
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": {
                    "roots": { "listChanged": true },
                    "sampling": {}
                },
                "clientInfo": {
                    "name": CLIENT_NAME,
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        )
        .await
    }

    /// Tools advertised by the server; empty if it reports none
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let result = self.request("tools/list", json!({})).await?;
        match result.get("tools") {
            Some(tools) if !tools.is_null() => serde_json::from_value(tools.clone())
                .map_err(|e| MeetingError::transport(format!("Malformed tools/list result: {}", e))),
            _ => Ok(Vec::new()),
        }
    }

    /// Invoke a named tool and return its raw result payload
    pub async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<Value> {
        self.request(
            "tools/call",
            json!({
                "name": name,
                "arguments": arguments
            }),
        )
        .await
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        tracing::debug!(id, method, server_url = %self.server_url, "MCP request");

        let response = self
            .client
            .post(&self.server_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MeetingError::transport(format!("MCP request {} timed out", method))
                } else {
                    MeetingError::transport(format!("MCP request {} failed: {}", method, e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(MeetingError::transport(format!(
                "MCP server returned status {} for {}",
                status, method
            )));
        }

        let envelope: JsonRpcResponse = response.json().await.map_err(|e| {
            MeetingError::transport(format!("Malformed MCP response for {}: {}", method, e))
        })?;

        if let Some(error) = envelope.error {
            tracing::debug!(id, method, code = error.code, data = ?error.data, "MCP error envelope");
            return Err(MeetingError::protocol(error.code, error.message));
        }

        Ok(envelope.result.unwrap_or(Value::Null))
    }
}

impl std::fmt::Debug for McpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpClient")
            .field("server_url", &self.server_url)
            .field("next_id", &self.next_id.load(Ordering::SeqCst))
            .finish()
    }
}

// ============================================================================
// Status
// ============================================================================

/// What the MCP path looks like from here
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpStatus {
    /// Whether events are fetched through MCP
    pub enabled: bool,
    pub server_url: String,
    pub available_tools: Vec<String>,
    pub implementation: String,
}

impl McpClient {
    /// Handshake and list tools; fails if the server is unreachable
    pub async fn status(&self, enabled: bool) -> Result<McpStatus> {
        self.initialize().await?;
        let tools = self.list_tools().await?;
        Ok(McpStatus {
            enabled,
            server_url: self.server_url.clone(),
            available_tools: tools.into_iter().map(|t| t.name).collect(),
            implementation: MCP_IMPLEMENTATION.to_string(),
        })
    }
}

// ============================================================================
// McpCalendarBackend
// ============================================================================

/// Calendar backend that delegates listing to an MCP tool
#[derive(Debug, Clone)]
pub struct McpCalendarBackend {
    client: Arc<McpClient>,
}

impl McpCalendarBackend {
    pub fn new(client: Arc<McpClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CalendarBackend for McpCalendarBackend {
    async fn list_events(&self, access_token: &str, query: &EventQuery) -> Result<Vec<RawEvent>> {
        let mut arguments = query.to_tool_arguments();
        arguments.insert("access_token".to_string(), json!(access_token));

        let result = self.client.call_tool(LIST_EVENTS_TOOL, arguments).await?;
        events_from_tool_result(result)
    }

    fn name(&self) -> &'static str {
        "mcp"
    }
}

/// Pull raw events out of a tool result.
///
/// Accepts `{"items": [...]}`, a bare array, or MCP text content whose text is
/// one of those as JSON.
pub fn events_from_tool_result(result: Value) -> Result<Vec<RawEvent>> {
    let payload = if result.get("items").is_some() || result.is_array() {
        result
    } else if let Some(parts) = result.get("content").and_then(Value::as_array) {
        let text = parts
            .iter()
            .find(|p| p.get("type").and_then(Value::as_str) == Some("text"))
            .and_then(|p| p.get("text"))
            .and_then(Value::as_str)
            .ok_or_else(|| MeetingError::calendar("Tool result has no text content"))?;
        serde_json::from_str(text)
            .map_err(|e| MeetingError::calendar(format!("Tool text content is not JSON: {}", e)))?
    } else {
        return Err(MeetingError::calendar("Unexpected tool result shape"));
    };

    let items = match payload {
        Value::Object(mut map) => map.remove("items").unwrap_or(Value::Array(Vec::new())),
        other => other,
    };

    serde_json::from_value(items)
        .map_err(|e| MeetingError::calendar(format!("Malformed events in tool result: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> McpClient {
        McpClient::new(format!("{}/mcp", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_sends_handshake() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/mcp"))
            .and(body_partial_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2024-11-05",
                    "capabilities": { "roots": { "listChanged": true }, "sampling": {} }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": { "protocolVersion": "2024-11-05", "capabilities": {} }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let result = client.initialize().await.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
    }

    #[tokio::test]
    async fn test_request_ids_increment() {
        let server = MockServer::start().await;

        for id in 1..=3 {
            Mock::given(method("POST"))
                .and(body_partial_json(json!({ "id": id })))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": { "tools": [] }
                })))
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = client_for(&server).await;
        for _ in 0..3 {
            assert!(client.list_tools().await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_list_tools() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "tools/list" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": { "tools": [
                    { "name": "google_calendar_list_events", "description": "List events" },
                    { "name": "google_calendar_get_event" }
                ]}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let tools = client.list_tools().await.unwrap();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["google_calendar_list_events", "google_calendar_get_event"]
        );
    }

    #[tokio::test]
    async fn test_list_tools_missing_field() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(client.list_tools().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_error_envelope_is_protocol_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32602, "message": "Unknown tool", "data": { "name": "nope" } }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.call_tool("nope", Map::new()).await.unwrap_err();
        match err {
            MeetingError::Protocol { code, message } => {
                assert_eq!(code, -32602);
                assert_eq!(message, "Unknown tool");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_error_is_transport_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.initialize().await.unwrap_err();
        assert!(matches!(err, MeetingError::Transport(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": {} }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client =
            McpClient::with_timeout(format!("{}/mcp", server.uri()), Duration::from_millis(50))
                .unwrap();
        let err = client.initialize().await.unwrap_err();
        assert!(matches!(err, MeetingError::Transport(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let client = McpClient::new("http://127.0.0.1:9/mcp").unwrap();
        let err = client.list_tools().await.unwrap_err();
        assert!(matches!(err, MeetingError::Transport(_)));
    }

    #[tokio::test]
    async fn test_calendar_backend_forwards_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "tools/call",
                "params": {
                    "name": "google_calendar_list_events",
                    "arguments": {
                        "access_token": "ya29.token",
                        "calendarId": "primary",
                        "maxResults": 5
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {
                    "content": [{
                        "type": "text",
                        "text": "{\"items\":[{\"id\":\"e1\",\"summary\":\"Standup\"}]}"
                    }]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = McpCalendarBackend::new(Arc::new(client_for(&server).await));
        let query = EventQuery::upcoming("primary", Utc::now(), 5);
        let events = backend.list_events("ya29.token", &query).await.unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id.as_deref(), Some("e1"));
    }

    #[tokio::test]
    async fn test_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "initialize" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1, "result": {}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "tools/list" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 2,
                "result": { "tools": [{ "name": "google_calendar_list_events" }] }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let status = client.status(true).await.unwrap();
        assert!(status.enabled);
        assert_eq!(status.available_tools, vec!["google_calendar_list_events"]);
        assert_eq!(status.implementation, MCP_IMPLEMENTATION);
        assert!(status.server_url.ends_with("/mcp"));
    }

    #[test]
    fn test_events_from_tool_result_shapes() {
        let direct = json!({ "items": [{ "id": "a" }] });
        assert_eq!(events_from_tool_result(direct).unwrap().len(), 1);

        let bare = json!([{ "id": "a" }, { "id": "b" }]);
        assert_eq!(events_from_tool_result(bare).unwrap().len(), 2);

        let text = json!({ "content": [{ "type": "text", "text": "[{\"id\":\"a\"}]" }] });
        assert_eq!(events_from_tool_result(text).unwrap().len(), 1);

        assert!(events_from_tool_result(json!("nope")).is_err());
        assert!(events_from_tool_result(json!({ "content": [] })).is_err());
    }
}

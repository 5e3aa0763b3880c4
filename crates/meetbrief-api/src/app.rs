// Application wiring
// Decision: Router assembly lives in the library so integration tests drive the real app
// Decision: The calendar backend is picked once from CALENDAR_MODE

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::{extract::State, routing::get, Json, Router};
use meetbrief_core::{
    CalendarBackend, CalendarMode, CalendarService, GoogleCalendarClient, McpCalendarBackend,
    McpClient, SummarizationService, SyncPipeline,
};
use meetbrief_openai::OpenAiTextGenerator;
use meetbrief_storage::{create_db_credential_store, create_db_meeting_store, StorageBackend};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::api;
use crate::auth::{self, AuthConfig, AuthState};
use crate::config::AppConfig;
use crate::openapi::ApiDoc;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    calendar_mode: &'static str,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        calendar_mode: state.calendar_mode.as_str(),
    })
}

/// State for health endpoint
#[derive(Clone)]
struct HealthState {
    calendar_mode: CalendarMode,
}

/// Everything the routes need, built once at startup
#[derive(Clone)]
pub struct AppServices {
    pub calendar_mode: CalendarMode,
    pub pipeline: Arc<SyncPipeline>,
    pub mcp_client: Arc<McpClient>,
    pub auth: AuthState,
}

impl AppServices {
    /// Wire storage, calendar backend and summarization from configuration
    pub fn from_config(
        config: &AppConfig,
        auth_config: AuthConfig,
        db: Arc<StorageBackend>,
    ) -> Result<Self> {
        let mcp_client = Arc::new(
            McpClient::new(config.mcp_server_url.clone()).context("Failed to create MCP client")?,
        );

        let backend: Arc<dyn CalendarBackend> = match config.calendar_mode {
            CalendarMode::Direct => Arc::new(GoogleCalendarClient::with_base_url(
                config.google_calendar_api_base.clone(),
            )),
            CalendarMode::Mcp => Arc::new(McpCalendarBackend::new(mcp_client.clone())),
        };

        let calendar = CalendarService::new(backend, Arc::new(create_db_credential_store(db.clone())))
            .with_settings(config.calendar.clone());

        let summarizer = match &config.openai_api_key {
            Some(api_key) => SummarizationService::new(Arc::new(OpenAiTextGenerator::with_base_url(
                api_key.clone(),
                config.openai_api_url.clone(),
            )))
            .with_model(config.openai_model.clone()),
            None => {
                tracing::warn!("OPENAI_API_KEY not set, summaries will use the fallback template");
                SummarizationService::fallback_only()
            }
        };

        let pipeline = SyncPipeline::new(
            calendar,
            Arc::new(create_db_meeting_store(db.clone())),
            summarizer,
        );

        tracing::info!(
            calendar_mode = config.calendar_mode.as_str(),
            backend = pipeline.calendar().backend_name(),
            "Calendar integration configured"
        );

        Ok(Self {
            calendar_mode: config.calendar_mode,
            pipeline: Arc::new(pipeline),
            mcp_client,
            auth: AuthState::new(auth_config, db),
        })
    }
}

/// Build the full application router
pub fn build_app(services: AppServices, api_prefix: &str, cors_origins: &[String]) -> Router {
    let meetings_state = api::meetings::MeetingsState {
        pipeline: services.pipeline.clone(),
        auth: services.auth.clone(),
    };
    let mcp_state = api::mcp::McpState {
        client: services.mcp_client.clone(),
        calendar: services.pipeline.calendar().clone(),
        enabled: services.calendar_mode == CalendarMode::Mcp,
        auth: services.auth.clone(),
    };
    let health_state = HealthState {
        calendar_mode: services.calendar_mode,
    };

    let api_routes = Router::new()
        .merge(api::meetings::routes(meetings_state))
        .merge(api::mcp::routes(mcp_state))
        .merge(auth::routes(services.auth));

    // Health is never prefixed
    let app = Router::new()
        .route("/health", get(health).with_state(health_state))
        .route("/api-doc/openapi.json", get(openapi_json))
        .merge(build_router_with_prefix(api_routes, api_prefix));

    let cors_origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    // Add CORS layer only if origins are configured
    let app = if !cors_origins.is_empty() {
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::ORIGIN,
                ])
                .allow_credentials(true),
        )
    } else {
        app
    };

    app.layer(TraceLayer::new_for_http())
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build router with optional API prefix (extracted for testing)
pub fn build_router_with_prefix<S: Clone + Send + Sync + 'static>(
    api_routes: Router<S>,
    api_prefix: &str,
) -> Router<S> {
    if api_prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(api_prefix, api_routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_routes() -> Router {
        Router::new().route("/meetings", get(|| async { "ok" }))
    }

    fn services() -> AppServices {
        AppServices::from_config(
            &AppConfig::default(),
            AuthConfig::default(),
            Arc::new(StorageBackend::in_memory()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_api_prefix_empty() {
        let app = build_router_with_prefix(test_routes(), "");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/meetings")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_api_prefix_set() {
        let app = build_router_with_prefix(test_routes(), "/api");

        // Route should work with prefix
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/meetings")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);

        // Route should NOT work without prefix
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/meetings")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_health_not_prefixed() {
        let app = build_app(services(), "/api", &[]);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["calendarMode"], "direct");
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let app = build_app(services(), "", &["https://app.example.com".to_string()]);

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/meetings")
                    .header("origin", "https://app.example.com")
                    .header("access-control-request-method", "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "https://app.example.com"
        );
    }
}

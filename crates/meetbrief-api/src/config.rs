// Application configuration loaded from environment variables.
// Decision: Calendar mode is read once at startup, never per request
// Decision: No DATABASE_URL means in-memory storage (dev mode)

use chrono::Duration;
use meetbrief_core::calendar::{
    DEFAULT_CALENDAR_ID, DEFAULT_PAGE_SIZE, DEFAULT_PAST_LOOKBACK_DAYS,
};
use meetbrief_core::google::GOOGLE_CALENDAR_API_BASE;
use meetbrief_core::mcp::DEFAULT_MCP_SERVER_URL;
use meetbrief_core::summarize::DEFAULT_SUMMARY_MODEL;
use meetbrief_core::{CalendarMode, CalendarSettings};
use meetbrief_openai::OPENAI_API_URL;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:9000";

/// Server and integration settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub calendar_mode: CalendarMode,
    pub mcp_server_url: String,
    pub google_calendar_api_base: String,
    pub calendar: CalendarSettings,
    /// Without a key, summaries always use the fallback template
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_api_url: String,
    pub database_url: Option<String>,
    pub bind_addr: String,
    /// Example: "/api" results in routes like /api/meetings
    pub api_prefix: String,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            calendar_mode: CalendarMode::Direct,
            mcp_server_url: DEFAULT_MCP_SERVER_URL.to_string(),
            google_calendar_api_base: GOOGLE_CALENDAR_API_BASE.to_string(),
            calendar: CalendarSettings::default(),
            openai_api_key: None,
            openai_model: DEFAULT_SUMMARY_MODEL.to_string(),
            openai_api_url: OPENAI_API_URL.to_string(),
            database_url: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            api_prefix: String::new(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from any variable source; empty values count as unset
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let calendar_mode = var("CALENDAR_MODE")
            .and_then(|s| {
                s.parse::<CalendarMode>()
                    .map_err(|e| tracing::warn!("{}, using direct", e))
                    .ok()
            })
            .unwrap_or_default();

        let page_size = var("CALENDAR_PAGE_SIZE")
            .and_then(|s| s.parse().ok())
            .filter(|n: &u32| *n > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let lookback_days = var("CALENDAR_PAST_LOOKBACK_DAYS")
            .and_then(|s| s.parse().ok())
            .filter(|n: &i64| *n > 0)
            .unwrap_or(DEFAULT_PAST_LOOKBACK_DAYS);

        let calendar = CalendarSettings {
            calendar_id: var("CALENDAR_ID").unwrap_or_else(|| DEFAULT_CALENDAR_ID.to_string()),
            page_size,
            past_lookback: Duration::days(lookback_days),
        };

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            calendar_mode,
            mcp_server_url: var("MCP_SERVER_URL")
                .unwrap_or_else(|| DEFAULT_MCP_SERVER_URL.to_string()),
            google_calendar_api_base: var("GOOGLE_CALENDAR_API_BASE")
                .unwrap_or_else(|| GOOGLE_CALENDAR_API_BASE.to_string()),
            calendar,
            openai_api_key: var("OPENAI_API_KEY"),
            openai_model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_SUMMARY_MODEL.to_string()),
            openai_api_url: var("OPENAI_API_URL").unwrap_or_else(|| OPENAI_API_URL.to_string()),
            database_url: var("DATABASE_URL"),
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            api_prefix: var("API_PREFIX").unwrap_or_default(),
            cors_allowed_origins,
        }
    }
}

// Calendar integration service
//
// Resolves the caller's calendar credential and lists the upcoming and past
// windows through whichever CalendarBackend was configured at startup.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::{MeetingError, Result};
use crate::event::{transform, CalendarEvent, RawEvent};
use crate::traits::{CalendarBackend, CredentialStore};

pub const DEFAULT_CALENDAR_ID: &str = "primary";
pub const DEFAULT_PAGE_SIZE: u32 = 5;
pub const DEFAULT_PAST_LOOKBACK_DAYS: i64 = 30;
/// Upper bound on raw events scanned to find the most recent past ones
pub const PAST_SCAN_LIMIT: u32 = 250;

/// How events are fetched. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalendarMode {
    /// Google Calendar REST API
    #[default]
    Direct,
    /// `google_calendar_list_events` tool on an MCP server
    Mcp,
}

impl FromStr for CalendarMode {
    type Err = MeetingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "direct" => Ok(CalendarMode::Direct),
            "mcp" => Ok(CalendarMode::Mcp),
            other => Err(MeetingError::config(format!(
                "Unknown calendar mode '{}', expected 'direct' or 'mcp'",
                other
            ))),
        }
    }
}

impl CalendarMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarMode::Direct => "direct",
            CalendarMode::Mcp => "mcp",
        }
    }
}

/// Signed-in caller, as resolved by the HTTP layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    pub user_id: Uuid,
    pub email: String,
}

/// Time-window query against a calendar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub calendar_id: String,
    pub time_min: Option<DateTime<Utc>>,
    pub time_max: Option<DateTime<Utc>>,
    pub max_results: u32,
    /// Follow `nextPageToken` until the window is exhausted
    pub all_pages: bool,
}

impl EventQuery {
    /// Events starting from `now`, first `page_size` only
    pub fn upcoming(calendar_id: &str, now: DateTime<Utc>, page_size: u32) -> Self {
        Self {
            calendar_id: calendar_id.to_string(),
            time_min: Some(now),
            time_max: None,
            max_results: page_size,
            all_pages: false,
        }
    }

    /// Every event in `[now - lookback, now]`
    pub fn past(calendar_id: &str, now: DateTime<Utc>, lookback: Duration) -> Self {
        Self {
            calendar_id: calendar_id.to_string(),
            time_min: Some(now - lookback),
            time_max: Some(now),
            max_results: PAST_SCAN_LIMIT,
            all_pages: true,
        }
    }

    /// Query string for `GET /calendars/{id}/events`
    pub fn to_query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
            ("maxResults", self.max_results.to_string()),
        ];
        if let Some(time_min) = self.time_min {
            params.push(("timeMin", format_time(time_min)));
        }
        if let Some(time_max) = self.time_max {
            params.push(("timeMax", format_time(time_max)));
        }
        params
    }

    /// Arguments for the `google_calendar_list_events` tool
    pub fn to_tool_arguments(&self) -> Map<String, Value> {
        let mut args = Map::new();
        args.insert("calendarId".to_string(), json!(self.calendar_id));
        args.insert("maxResults".to_string(), json!(self.max_results));
        args.insert("singleEvents".to_string(), json!(true));
        args.insert("orderBy".to_string(), json!("startTime"));
        if let Some(time_min) = self.time_min {
            args.insert("timeMin".to_string(), json!(format_time(time_min)));
        }
        if let Some(time_max) = self.time_max {
            args.insert("timeMax".to_string(), json!(format_time(time_max)));
        }
        args
    }
}

fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Normalized upcoming and past events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarEvents {
    /// Ascending by start time
    pub upcoming: Vec<CalendarEvent>,
    /// The most recent past events, ascending by start time
    pub past: Vec<CalendarEvent>,
}

/// Tunables for event listing
#[derive(Debug, Clone)]
pub struct CalendarSettings {
    pub calendar_id: String,
    pub page_size: u32,
    pub past_lookback: Duration,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            past_lookback: Duration::days(DEFAULT_PAST_LOOKBACK_DAYS),
        }
    }
}

/// Calendar integration service
#[derive(Clone)]
pub struct CalendarService {
    backend: Arc<dyn CalendarBackend>,
    credentials: Arc<dyn CredentialStore>,
    settings: CalendarSettings,
}

impl CalendarService {
    pub fn new(backend: Arc<dyn CalendarBackend>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            backend,
            credentials,
            settings: CalendarSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: CalendarSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &CalendarSettings {
        &self.settings
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Stored calendar credential of the caller.
    ///
    /// Fails with `Authentication` when there is no session or the user has
    /// no stored credential.
    pub async fn access_token(&self, session: Option<&UserSession>) -> Result<String> {
        let session = session.ok_or_else(|| MeetingError::auth("No authenticated session"))?;

        self.credentials
            .access_token(session.user_id)
            .await?
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                MeetingError::auth(format!(
                    "No calendar credential stored for user {}",
                    session.user_id
                ))
            })
    }

    /// Upcoming and past events for the caller.
    ///
    /// Both listings run concurrently; either failing fails the whole call.
    pub async fn get_events(&self, session: Option<&UserSession>) -> Result<CalendarEvents> {
        let access_token = self.access_token(session).await?;
        let now = Utc::now();

        let upcoming_query =
            EventQuery::upcoming(&self.settings.calendar_id, now, self.settings.page_size);
        let past_query =
            EventQuery::past(&self.settings.calendar_id, now, self.settings.past_lookback);

        let (upcoming_raw, past_raw) = tokio::try_join!(
            self.list(&access_token, &upcoming_query),
            self.list(&access_token, &past_query),
        )?;

        let upcoming: Vec<CalendarEvent> = upcoming_raw
            .into_iter()
            .take(self.settings.page_size as usize)
            .filter_map(transform)
            .collect();

        // The API only sorts ascending, so walk back from now and restore order
        let mut past: Vec<CalendarEvent> = past_raw
            .into_iter()
            .rev()
            .take(self.settings.page_size as usize)
            .filter_map(transform)
            .collect();
        past.reverse();

        tracing::debug!(
            backend = self.backend.name(),
            upcoming = upcoming.len(),
            past = past.len(),
            "Fetched calendar events"
        );

        Ok(CalendarEvents { upcoming, past })
    }

    async fn list(&self, access_token: &str, query: &EventQuery) -> Result<Vec<RawEvent>> {
        self.backend
            .list_events(access_token, query)
            .await
            .map_err(|e| match e {
                MeetingError::CalendarFetch(_) => e,
                other => MeetingError::calendar(format!(
                    "{} backend failed: {}",
                    self.backend.name(),
                    other
                )),
            })
    }
}

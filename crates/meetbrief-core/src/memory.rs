// In-memory implementations for testing
//
// These implementations keep all data in memory, useful for:
// - Unit tests of the calendar service and the sync pipeline
// - Running the pipeline without a database or network

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::calendar::EventQuery;
use crate::error::{MeetingError, Result};
use crate::event::{CalendarEvent, RawEvent};
use crate::meeting::{Meeting, Summary};
use crate::summarize::GenerationRequest;
use crate::traits::{CalendarBackend, CredentialStore, MeetingStore, TextGenerator};

// ============================================================================
// InMemoryCredentialStore
// ============================================================================

/// Access tokens keyed by user ID
#[derive(Debug, Default, Clone)]
pub struct InMemoryCredentialStore {
    tokens: Arc<RwLock<HashMap<Uuid, String>>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, user_id: Uuid, token: impl Into<String>) {
        self.tokens.write().await.insert(user_id, token.into());
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn access_token(&self, user_id: Uuid) -> Result<Option<String>> {
        Ok(self.tokens.read().await.get(&user_id).cloned())
    }
}

// ============================================================================
// InMemoryMeetingStore
// ============================================================================

#[derive(Debug, Default)]
struct MeetingTables {
    meetings: HashMap<String, Meeting>,
    summaries: HashMap<Uuid, Summary>,
}

/// Meetings keyed by external ID, summaries keyed by meeting ID
#[derive(Debug, Default, Clone)]
pub struct InMemoryMeetingStore {
    tables: Arc<RwLock<MeetingTables>>,
}

impl InMemoryMeetingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn meeting_count(&self) -> usize {
        self.tables.read().await.meetings.len()
    }

    pub async fn summary_count(&self) -> usize {
        self.tables.read().await.summaries.len()
    }

    pub async fn meeting_by_google_id(&self, google_id: &str) -> Option<Meeting> {
        self.tables.read().await.meetings.get(google_id).cloned()
    }
}

#[async_trait]
impl MeetingStore for InMemoryMeetingStore {
    async fn upsert_meeting(&self, user_id: Uuid, event: &CalendarEvent) -> Result<Meeting> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        let meeting = tables
            .meetings
            .entry(event.id.clone())
            .and_modify(|m| {
                m.title = event.title.clone();
                m.description = event.description.clone();
                m.start_time = event.start_time;
                m.end_time = event.end_time;
                m.attendees = event.attendees.clone();
                m.location = event.location.clone();
                m.updated_at = now;
            })
            .or_insert_with(|| Meeting {
                id: Uuid::now_v7(),
                google_id: event.id.clone(),
                title: event.title.clone(),
                description: event.description.clone(),
                start_time: event.start_time,
                end_time: event.end_time,
                attendees: event.attendees.clone(),
                location: event.location.clone(),
                user_id,
                created_at: now,
                updated_at: now,
            });
        Ok(meeting.clone())
    }

    async fn find_summary(&self, meeting_id: Uuid) -> Result<Option<Summary>> {
        Ok(self.tables.read().await.summaries.get(&meeting_id).cloned())
    }

    async fn create_summary(&self, meeting_id: Uuid, content: &str) -> Result<Summary> {
        let mut tables = self.tables.write().await;
        let summary = tables
            .summaries
            .entry(meeting_id)
            .or_insert_with(|| Summary {
                id: Uuid::now_v7(),
                meeting_id,
                content: content.to_string(),
                created_at: Utc::now(),
            });
        Ok(summary.clone())
    }
}

// ============================================================================
// StaticCalendarBackend
// ============================================================================

/// Calendar backend returning canned events.
///
/// Queries with a `time_max` are answered from the past list, all others from
/// the upcoming list.
#[derive(Debug, Default, Clone)]
pub struct StaticCalendarBackend {
    upcoming: Vec<RawEvent>,
    past: Vec<RawEvent>,
    failure: Option<String>,
    seen_tokens: Arc<RwLock<Vec<String>>>,
}

impl StaticCalendarBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_upcoming(mut self, events: Vec<RawEvent>) -> Self {
        self.upcoming = events;
        self
    }

    pub fn with_past(mut self, events: Vec<RawEvent>) -> Self {
        self.past = events;
        self
    }

    /// Make every call fail with a transport error
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Access tokens passed to `list_events`, in call order
    pub async fn seen_tokens(&self) -> Vec<String> {
        self.seen_tokens.read().await.clone()
    }
}

#[async_trait]
impl CalendarBackend for StaticCalendarBackend {
    async fn list_events(&self, access_token: &str, query: &EventQuery) -> Result<Vec<RawEvent>> {
        self.seen_tokens
            .write()
            .await
            .push(access_token.to_string());

        if let Some(message) = &self.failure {
            return Err(MeetingError::transport(message.clone()));
        }

        Ok(if query.time_max.is_some() {
            self.past.clone()
        } else {
            self.upcoming.clone()
        })
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

// ============================================================================
// ScriptedTextGenerator
// ============================================================================

/// Text generator that replays a fixed answer and records requests
#[derive(Debug, Clone)]
pub struct ScriptedTextGenerator {
    reply: std::result::Result<String, String>,
    requests: Arc<RwLock<Vec<GenerationRequest>>>,
}

impl ScriptedTextGenerator {
    /// Always answer with `text`
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            requests: Arc::default(),
        }
    }

    /// Always fail with a generation error
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            requests: Arc::default(),
        }
    }

    pub async fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedTextGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.write().await.push(request.clone());
        self.reply.clone().map_err(MeetingError::generation)
    }
}

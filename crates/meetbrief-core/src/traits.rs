// Core traits for pluggable backends
//
// These traits keep the sync pipeline independent of where data lives:
// - PostgreSQL or in-memory storage (meetbrief-storage)
// - Direct Google Calendar API or an MCP tool server
// - OpenAI or any other chat-completion endpoint

use async_trait::async_trait;
use uuid::Uuid;

use crate::calendar::EventQuery;
use crate::error::Result;
use crate::event::{CalendarEvent, RawEvent};
use crate::meeting::{Meeting, Summary};
use crate::summarize::GenerationRequest;

// ============================================================================
// MeetingStore - Persisted meetings and their summaries
// ============================================================================

/// Trait for persisting meetings and summaries
#[async_trait]
pub trait MeetingStore: Send + Sync {
    /// Create or update the meeting for `event.id`.
    ///
    /// Mutable fields are overwritten with the event's values on every call.
    async fn upsert_meeting(&self, user_id: Uuid, event: &CalendarEvent) -> Result<Meeting>;

    /// Existing summary for a meeting, if any
    async fn find_summary(&self, meeting_id: Uuid) -> Result<Option<Summary>>;

    /// Store a summary for a meeting.
    ///
    /// If one already exists (for example written by a concurrent sync), the
    /// stored one is returned and `content` is discarded.
    async fn create_summary(&self, meeting_id: Uuid, content: &str) -> Result<Summary>;
}

// ============================================================================
// CredentialStore - Calendar access tokens per user
// ============================================================================

/// Trait for looking up the calendar access credential of a signed-in user
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Stored access token, or `None` if the user never granted calendar access
    async fn access_token(&self, user_id: Uuid) -> Result<Option<String>>;
}

// ============================================================================
// CalendarBackend - Where raw events come from
// ============================================================================

/// Trait for listing raw events from an external calendar
#[async_trait]
pub trait CalendarBackend: Send + Sync {
    /// List raw events for the query window, in the order the source returns them
    async fn list_events(&self, access_token: &str, query: &EventQuery) -> Result<Vec<RawEvent>>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}

// ============================================================================
// TextGenerator - External text generation
// ============================================================================

/// Trait for a text-generation API
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for the request
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

// Meeting sync core
//
// DB-agnostic calendar sync and summarization.
//
// Key design decisions:
// - Uses traits (MeetingStore, CredentialStore, CalendarBackend, TextGenerator) for pluggable backends
// - Direct Google Calendar access and MCP tool delegation are two CalendarBackend impls, picked at startup
// - Summarization is two-stage: try_generate may fail, summarize always returns text
// - Per-event sync work runs concurrently, results keep the calendar's order

// Domain types
pub mod event;
pub mod meeting;

pub mod calendar;
pub mod error;
pub mod summarize;
pub mod sync;
pub mod traits;

// Calendar backends
pub mod google;
pub mod mcp;

// In-memory implementations for testing
pub mod memory;

// Re-exports for convenience
pub use calendar::{
    CalendarEvents, CalendarMode, CalendarService, CalendarSettings, EventQuery, UserSession,
};
pub use error::{MeetingError, Result};
pub use event::{transform, CalendarEvent, RawEvent};
pub use google::GoogleCalendarClient;
pub use mcp::{McpCalendarBackend, McpClient, McpStatus};
pub use meeting::{format_duration, Meeting, MeetingView, MeetingsOverview, Summary};
pub use summarize::{fallback_summary, GenerationRequest, SummarizationService};
pub use sync::SyncPipeline;
pub use traits::{CalendarBackend, CredentialStore, MeetingStore, TextGenerator};

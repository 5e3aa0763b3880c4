// Meeting domain types
//
// Meeting and Summary are the persisted entities; MeetingView is what the
// dashboard receives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Persisted meeting, one per external calendar event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: Uuid,
    /// External calendar event id (unique)
    pub google_id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub attendees: Vec<String>,
    pub location: Option<String>,
    /// Owning user
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persisted meeting summary, at most one per meeting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub id: Uuid,
    pub meeting_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Meeting as rendered by `GET /meetings`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct MeetingView {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub attendees: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Human readable length, e.g. "45m" or "1h 30m"
    #[cfg_attr(feature = "openapi", schema(example = "1h 30m"))]
    pub duration: String,
    /// Always null for upcoming meetings
    pub summary: Option<String>,
}

impl MeetingView {
    pub fn new(meeting: Meeting, summary: Option<String>) -> Self {
        let duration = format_duration(meeting.start_time, meeting.end_time);
        Self {
            id: meeting.id,
            title: meeting.title,
            description: meeting.description,
            start_time: meeting.start_time,
            end_time: meeting.end_time,
            attendees: meeting.attendees,
            location: meeting.location,
            duration,
            summary,
        }
    }
}

/// Both halves of the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct MeetingsOverview {
    pub upcoming: Vec<MeetingView>,
    pub past: Vec<MeetingView>,
}

/// Render a meeting length in whole minutes: "45m", "1h", "1h 30m".
///
/// Negative spans (end before start) render as "0m".
pub fn format_duration(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let minutes = (end - start).num_minutes().max(0);
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    let remainder = minutes % 60;
    if remainder > 0 {
        format!("{}h {}m", hours, remainder)
    } else {
        format!("{}h", hours)
    }
}

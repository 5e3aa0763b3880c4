// Calendar event types
//
// RawEvent mirrors the Google Calendar v3 event resource (only the fields we read).
// CalendarEvent is the normalized shape that enters the sync pipeline.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Normalized calendar event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    /// External identifier, unique within the source calendar
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Event as returned by the calendar API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<RawAttendee>>,
}

/// Start or end of a raw event. All-day events only carry `date`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAttendee {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// List response of `GET /calendars/{id}/events`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsPage {
    #[serde(default)]
    pub items: Vec<RawEvent>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Normalize a raw event.
///
/// Returns `None` when id, title, start or end is missing or unusable; the
/// caller filters those out rather than failing the batch.
pub fn transform(raw: RawEvent) -> Option<CalendarEvent> {
    let id = raw.id.filter(|id| !id.is_empty())?;
    let title = raw.summary.filter(|s| !s.is_empty())?;
    let start_time = parse_event_time(raw.start.as_ref()?)?;
    let end_time = parse_event_time(raw.end.as_ref()?)?;

    let attendees = raw
        .attendees
        .unwrap_or_default()
        .into_iter()
        .filter_map(|a| a.email.filter(|e| !e.is_empty()))
        .collect();

    Some(CalendarEvent {
        id,
        title,
        description: raw.description.filter(|d| !d.is_empty()),
        start_time,
        end_time,
        attendees,
        location: raw.location.filter(|l| !l.is_empty()),
    })
}

fn parse_event_time(value: &EventDateTime) -> Option<DateTime<Utc>> {
    if let Some(date_time) = value.date_time.as_deref().filter(|s| !s.is_empty()) {
        return match DateTime::parse_from_rfc3339(date_time) {
            Ok(parsed) => Some(parsed.with_timezone(&Utc)),
            Err(e) => {
                tracing::warn!(value = date_time, "Unparseable event dateTime: {}", e);
                None
            }
        };
    }

    // All-day events: midnight UTC of the given day
    let date = value.date.as_deref().filter(|s| !s.is_empty())?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

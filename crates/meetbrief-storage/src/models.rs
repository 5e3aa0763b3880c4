// Database models (internal, may differ from public DTOs)

use chrono::{DateTime, Utc};
use meetbrief_core::{CalendarEvent, Meeting, Summary};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================
// Auth models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create or update a user by email
#[derive(Debug, Clone)]
pub struct UpsertUser {
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    pub provider_account_id: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scope: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create or update an account by (provider, provider_account_id).
/// A `None` refresh token keeps the stored one.
#[derive(Debug, Clone)]
pub struct UpsertAccount {
    pub user_id: Uuid,
    pub provider: String,
    pub provider_account_id: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scope: Option<String>,
}

// ============================================
// Meeting models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct MeetingRow {
    pub id: Uuid,
    pub google_id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub attendees: Vec<String>,
    pub location: Option<String>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create or update a meeting by google_id.
/// `user_id` is only written on create.
#[derive(Debug, Clone)]
pub struct UpsertMeeting {
    pub google_id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub attendees: Vec<String>,
    pub location: Option<String>,
    pub user_id: Uuid,
}

impl UpsertMeeting {
    pub fn from_event(user_id: Uuid, event: &CalendarEvent) -> Self {
        Self {
            google_id: event.id.clone(),
            title: event.title.clone(),
            description: event.description.clone(),
            start_time: event.start_time,
            end_time: event.end_time,
            attendees: event.attendees.clone(),
            location: event.location.clone(),
            user_id,
        }
    }
}

impl From<MeetingRow> for Meeting {
    fn from(row: MeetingRow) -> Self {
        Meeting {
            id: row.id,
            google_id: row.google_id,
            title: row.title,
            description: row.description,
            start_time: row.start_time,
            end_time: row.end_time,
            attendees: row.attendees,
            location: row.location,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct SummaryRow {
    pub id: Uuid,
    pub meeting_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<SummaryRow> for Summary {
    fn from(row: SummaryRow) -> Self {
        Summary {
            id: row.id,
            meeting_id: row.meeting_id,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

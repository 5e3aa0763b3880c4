// In-memory storage implementation for dev mode
// Decision: Use parking_lot for thread-safe access
//
// Mirrors the PostgreSQL repository, including its unique keys,
// so the server can run without a database.

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::models::*;

/// In-memory database for dev mode
/// All data is stored in memory and lost on restart
#[derive(Default)]
pub struct InMemoryDatabase {
    users: RwLock<HashMap<Uuid, UserRow>>,
    accounts: RwLock<HashMap<Uuid, AccountRow>>,
    meetings: RwLock<HashMap<Uuid, MeetingRow>>,
    summaries: RwLock<HashMap<Uuid, SummaryRow>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    // ============================================
    // Users
    // ============================================

    pub async fn upsert_user(&self, input: UpsertUser) -> Result<UserRow> {
        let now = Self::now();
        let mut users = self.users.write();

        if let Some(existing) = users.values_mut().find(|u| u.email == input.email) {
            existing.name = input.name;
            if input.avatar_url.is_some() {
                existing.avatar_url = input.avatar_url;
            }
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let row = UserRow {
            id: Uuid::now_v7(),
            email: input.email,
            name: input.name,
            avatar_url: input.avatar_url,
            created_at: now,
            updated_at: now,
        };
        users.insert(row.id, row.clone());
        Ok(row)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<UserRow>> {
        Ok(self.users.read().get(&id).cloned())
    }

    // ============================================
    // Accounts
    // ============================================

    pub async fn upsert_account(&self, input: UpsertAccount) -> Result<AccountRow> {
        let now = Self::now();
        let mut accounts = self.accounts.write();

        if let Some(existing) = accounts.values_mut().find(|a| {
            a.provider == input.provider && a.provider_account_id == input.provider_account_id
        }) {
            existing.user_id = input.user_id;
            existing.access_token = input.access_token;
            if input.refresh_token.is_some() {
                existing.refresh_token = input.refresh_token;
            }
            existing.expires_at = input.expires_at;
            existing.scope = input.scope;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let row = AccountRow {
            id: Uuid::now_v7(),
            user_id: input.user_id,
            provider: input.provider,
            provider_account_id: input.provider_account_id,
            access_token: input.access_token,
            refresh_token: input.refresh_token,
            expires_at: input.expires_at,
            scope: input.scope,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(row.id, row.clone());
        Ok(row)
    }

    pub async fn get_account(&self, user_id: Uuid, provider: &str) -> Result<Option<AccountRow>> {
        Ok(self
            .accounts
            .read()
            .values()
            .filter(|a| a.user_id == user_id && a.provider == provider)
            .max_by_key(|a| a.updated_at)
            .cloned())
    }

    // ============================================
    // Meetings
    // ============================================

    pub async fn upsert_meeting(&self, input: UpsertMeeting) -> Result<MeetingRow> {
        let now = Self::now();
        let mut meetings = self.meetings.write();

        if let Some(existing) = meetings
            .values_mut()
            .find(|m| m.google_id == input.google_id)
        {
            existing.title = input.title;
            existing.description = input.description;
            existing.start_time = input.start_time;
            existing.end_time = input.end_time;
            existing.attendees = input.attendees;
            existing.location = input.location;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let row = MeetingRow {
            id: Uuid::now_v7(),
            google_id: input.google_id,
            title: input.title,
            description: input.description,
            start_time: input.start_time,
            end_time: input.end_time,
            attendees: input.attendees,
            location: input.location,
            user_id: input.user_id,
            created_at: now,
            updated_at: now,
        };
        meetings.insert(row.id, row.clone());
        Ok(row)
    }

    pub async fn get_meeting_by_google_id(&self, google_id: &str) -> Result<Option<MeetingRow>> {
        Ok(self
            .meetings
            .read()
            .values()
            .find(|m| m.google_id == google_id)
            .cloned())
    }

    // ============================================
    // Summaries
    // ============================================

    pub async fn get_summary(&self, meeting_id: Uuid) -> Result<Option<SummaryRow>> {
        Ok(self
            .summaries
            .read()
            .values()
            .find(|s| s.meeting_id == meeting_id)
            .cloned())
    }

    pub async fn create_summary(&self, meeting_id: Uuid, content: &str) -> Result<SummaryRow> {
        let mut summaries = self.summaries.write();

        if let Some(existing) = summaries.values().find(|s| s.meeting_id == meeting_id) {
            return Ok(existing.clone());
        }

        let row = SummaryRow {
            id: Uuid::now_v7(),
            meeting_id,
            content: content.to_string(),
            created_at: Self::now(),
        };
        summaries.insert(row.id, row.clone());
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn meeting_input(google_id: &str, title: &str, user_id: Uuid) -> UpsertMeeting {
        UpsertMeeting {
            google_id: google_id.to_string(),
            title: title.to_string(),
            description: None,
            start_time: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap(),
            attendees: vec!["a@example.com".to_string()],
            location: None,
            user_id,
        }
    }

    fn google_account(user_id: Uuid, token: &str, refresh: Option<&str>) -> UpsertAccount {
        UpsertAccount {
            user_id,
            provider: "google".to_string(),
            provider_account_id: "sub-123".to_string(),
            access_token: Some(token.to_string()),
            refresh_token: refresh.map(str::to_string),
            expires_at: None,
            scope: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_user_by_email() {
        let db = InMemoryDatabase::new();

        let first = db
            .upsert_user(UpsertUser {
                email: "ann@example.com".to_string(),
                name: "Ann".to_string(),
                avatar_url: Some("https://example.com/a.png".to_string()),
            })
            .await
            .unwrap();

        let second = db
            .upsert_user(UpsertUser {
                email: "ann@example.com".to_string(),
                name: "Ann B".to_string(),
                avatar_url: None,
            })
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Ann B");
        assert_eq!(
            second.avatar_url.as_deref(),
            Some("https://example.com/a.png")
        );
        assert!(db.get_user(first.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_upsert_account_keeps_refresh_token() {
        let db = InMemoryDatabase::new();
        let user_id = Uuid::now_v7();

        db.upsert_account(google_account(user_id, "token-1", Some("refresh-1")))
            .await
            .unwrap();
        let updated = db
            .upsert_account(google_account(user_id, "token-2", None))
            .await
            .unwrap();

        assert_eq!(updated.access_token.as_deref(), Some("token-2"));
        assert_eq!(updated.refresh_token.as_deref(), Some("refresh-1"));

        let fetched = db.get_account(user_id, "google").await.unwrap().unwrap();
        assert_eq!(fetched.id, updated.id);
        assert!(db.get_account(user_id, "github").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_meeting_is_idempotent() {
        let db = InMemoryDatabase::new();
        let owner = Uuid::now_v7();
        let other = Uuid::now_v7();

        let created = db
            .upsert_meeting(meeting_input("evt-1", "Standup", owner))
            .await
            .unwrap();
        let updated = db
            .upsert_meeting(meeting_input("evt-1", "Daily Standup", other))
            .await
            .unwrap();

        assert_eq!(created.id, updated.id);
        assert_eq!(updated.title, "Daily Standup");
        // Owner is set on create only
        assert_eq!(updated.user_id, owner);

        let fetched = db.get_meeting_by_google_id("evt-1").await.unwrap().unwrap();
        assert_eq!(fetched.title, "Daily Standup");
        assert!(db.get_meeting_by_google_id("evt-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_summary_keeps_first() {
        let db = InMemoryDatabase::new();
        let meeting = db
            .upsert_meeting(meeting_input("evt-1", "Retro", Uuid::now_v7()))
            .await
            .unwrap();

        let first = db.create_summary(meeting.id, "first").await.unwrap();
        let second = db.create_summary(meeting.id, "second").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.content, "first");
        assert_eq!(
            db.get_summary(meeting.id).await.unwrap().unwrap().content,
            "first"
        );
    }
}

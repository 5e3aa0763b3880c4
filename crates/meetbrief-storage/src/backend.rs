// Storage backend abstraction
// Decision: Use enum dispatch for simplicity over trait objects
//
// Works with either PostgreSQL (production) or in-memory (dev mode) storage.

use anyhow::Result;
use std::sync::Arc;
use uuid::Uuid;

use super::memory::InMemoryDatabase;
use super::models::*;
use super::repositories::Database;

/// Storage backend that can be either PostgreSQL or in-memory
#[derive(Clone)]
pub enum StorageBackend {
    /// PostgreSQL database (production)
    Postgres(Database),
    /// In-memory database (dev mode)
    InMemory(Arc<InMemoryDatabase>),
}

impl StorageBackend {
    /// Create a PostgreSQL storage backend from a database URL
    pub async fn postgres(database_url: &str) -> Result<Self> {
        let db = Database::from_url(database_url).await?;
        Ok(Self::Postgres(db))
    }

    /// Create an in-memory storage backend
    pub fn in_memory() -> Self {
        Self::InMemory(Arc::new(InMemoryDatabase::new()))
    }

    /// Apply migrations; no-op for the in-memory backend
    pub async fn migrate(&self) -> Result<()> {
        match self {
            Self::Postgres(db) => db.migrate().await,
            Self::InMemory(_) => Ok(()),
        }
    }

    // ============================================
    // Users
    // ============================================

    pub async fn upsert_user(&self, input: UpsertUser) -> Result<UserRow> {
        match self {
            Self::Postgres(db) => db.upsert_user(input).await,
            Self::InMemory(db) => db.upsert_user(input).await,
        }
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<UserRow>> {
        match self {
            Self::Postgres(db) => db.get_user(id).await,
            Self::InMemory(db) => db.get_user(id).await,
        }
    }

    // ============================================
    // Accounts
    // ============================================

    pub async fn upsert_account(&self, input: UpsertAccount) -> Result<AccountRow> {
        match self {
            Self::Postgres(db) => db.upsert_account(input).await,
            Self::InMemory(db) => db.upsert_account(input).await,
        }
    }

    pub async fn get_account(&self, user_id: Uuid, provider: &str) -> Result<Option<AccountRow>> {
        match self {
            Self::Postgres(db) => db.get_account(user_id, provider).await,
            Self::InMemory(db) => db.get_account(user_id, provider).await,
        }
    }

    // ============================================
    // Meetings
    // ============================================

    pub async fn upsert_meeting(&self, input: UpsertMeeting) -> Result<MeetingRow> {
        match self {
            Self::Postgres(db) => db.upsert_meeting(input).await,
            Self::InMemory(db) => db.upsert_meeting(input).await,
        }
    }

    pub async fn get_meeting_by_google_id(&self, google_id: &str) -> Result<Option<MeetingRow>> {
        match self {
            Self::Postgres(db) => db.get_meeting_by_google_id(google_id).await,
            Self::InMemory(db) => db.get_meeting_by_google_id(google_id).await,
        }
    }

    // ============================================
    // Summaries
    // ============================================

    pub async fn get_summary(&self, meeting_id: Uuid) -> Result<Option<SummaryRow>> {
        match self {
            Self::Postgres(db) => db.get_summary(meeting_id).await,
            Self::InMemory(db) => db.get_summary(meeting_id).await,
        }
    }

    pub async fn create_summary(&self, meeting_id: Uuid, content: &str) -> Result<SummaryRow> {
        match self {
            Self::Postgres(db) => db.create_summary(meeting_id, content).await,
            Self::InMemory(db) => db.create_summary(meeting_id, content).await,
        }
    }
}

// Database-backed MeetingStore implementation
//
// Used by the sync pipeline to upsert meetings and find-or-create summaries.

use async_trait::async_trait;
use meetbrief_core::{
    traits::MeetingStore, CalendarEvent, Meeting, MeetingError, Result, Summary,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::backend::StorageBackend;
use crate::models::UpsertMeeting;

// ============================================================================
// DbMeetingStore
// ============================================================================

#[derive(Clone)]
pub struct DbMeetingStore {
    db: Arc<StorageBackend>,
}

impl DbMeetingStore {
    pub fn new(db: Arc<StorageBackend>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MeetingStore for DbMeetingStore {
    async fn upsert_meeting(&self, user_id: Uuid, event: &CalendarEvent) -> Result<Meeting> {
        let row = self
            .db
            .upsert_meeting(UpsertMeeting::from_event(user_id, event))
            .await
            .map_err(|e| MeetingError::store(e.to_string()))?;

        Ok(row.into())
    }

    async fn find_summary(&self, meeting_id: Uuid) -> Result<Option<Summary>> {
        let row = self
            .db
            .get_summary(meeting_id)
            .await
            .map_err(|e| MeetingError::store(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    async fn create_summary(&self, meeting_id: Uuid, content: &str) -> Result<Summary> {
        let row = self
            .db
            .create_summary(meeting_id, content)
            .await
            .map_err(|e| MeetingError::store(e.to_string()))?;

        Ok(row.into())
    }
}

/// Create a meeting store backed by the given storage
pub fn create_db_meeting_store(db: Arc<StorageBackend>) -> DbMeetingStore {
    DbMeetingStore::new(db)
}

// ============================================================================
// Tests
// ============================================================================

// Synchronization pipeline
//
// Per request: authenticate, fetch both windows, upsert every event as a
// Meeting, attach a cached or freshly generated summary to past meetings.
// Per-event work runs concurrently; results keep the fetch order.

use std::sync::Arc;

use futures::future::try_join_all;
use uuid::Uuid;

use crate::calendar::{CalendarService, UserSession};
use crate::error::{MeetingError, Result};
use crate::event::CalendarEvent;
use crate::meeting::{MeetingView, MeetingsOverview};
use crate::summarize::SummarizationService;
use crate::traits::MeetingStore;

#[derive(Clone)]
pub struct SyncPipeline {
    calendar: CalendarService,
    store: Arc<dyn MeetingStore>,
    summarizer: SummarizationService,
}

impl SyncPipeline {
    pub fn new(
        calendar: CalendarService,
        store: Arc<dyn MeetingStore>,
        summarizer: SummarizationService,
    ) -> Self {
        Self {
            calendar,
            store,
            summarizer,
        }
    }

    pub fn calendar(&self) -> &CalendarService {
        &self.calendar
    }

    /// Fetch, persist and summarize the caller's meetings.
    ///
    /// Fails with `Authentication` without a session or credential, with
    /// `CalendarFetch` when listing fails, and with the first per-event error
    /// otherwise. Summarization problems never fail the call.
    pub async fn sync_and_summarize(
        &self,
        session: Option<&UserSession>,
    ) -> Result<MeetingsOverview> {
        let session = session.ok_or_else(|| MeetingError::auth("No authenticated session"))?;
        let events = self.calendar.get_events(Some(session)).await?;

        let user_id = session.user_id;
        let upcoming = try_join_all(
            events
                .upcoming
                .iter()
                .map(|event| self.sync_upcoming(user_id, event)),
        );
        let past = try_join_all(
            events
                .past
                .iter()
                .map(|event| self.sync_past(user_id, event)),
        );
        let (upcoming, past) = tokio::try_join!(upcoming, past)?;

        tracing::info!(
            user_id = %user_id,
            upcoming = upcoming.len(),
            past = past.len(),
            "Meetings synced"
        );

        Ok(MeetingsOverview { upcoming, past })
    }

    async fn sync_upcoming(&self, user_id: Uuid, event: &CalendarEvent) -> Result<MeetingView> {
        let meeting = self.store.upsert_meeting(user_id, event).await?;
        Ok(MeetingView::new(meeting, None))
    }

    async fn sync_past(&self, user_id: Uuid, event: &CalendarEvent) -> Result<MeetingView> {
        let meeting = self.store.upsert_meeting(user_id, event).await?;

        let content = match self.store.find_summary(meeting.id).await? {
            Some(summary) => summary.content,
            None => {
                let generated = self
                    .summarizer
                    .summarize(
                        &meeting.title,
                        meeting.description.as_deref(),
                        &meeting.attendees,
                    )
                    .await;
                // A concurrent sync may have stored one first; keep whichever won
                self.store
                    .create_summary(meeting.id, &generated)
                    .await?
                    .content
            }
        };

        Ok(MeetingView::new(meeting, Some(content)))
    }
}

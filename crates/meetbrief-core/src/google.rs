// Google Calendar v3 REST backend
//
// Lists events with the user's OAuth access token. Base URL is configurable
// so tests can point it at a mock server.

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::calendar::EventQuery;
use crate::error::{MeetingError, Result};
use crate::event::{EventsPage, RawEvent};
use crate::traits::CalendarBackend;

pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Stop following `nextPageToken` after this many pages
const MAX_PAGES: usize = 10;

/// Direct Google Calendar backend
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    client: Client,
    base_url: String,
}

impl GoogleCalendarClient {
    pub fn new() -> Self {
        Self::with_base_url(GOOGLE_CALENDAR_API_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/calendars/{id}/events` with the calendar id as one encoded segment
    fn events_url(&self, calendar_id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            MeetingError::config(format!("Invalid Google Calendar base URL: {}", e))
        })?;
        url.path_segments_mut()
            .map_err(|_| MeetingError::config("Google Calendar base URL cannot have a path"))?
            .pop_if_empty()
            .extend(["calendars", calendar_id, "events"]);
        Ok(url)
    }

    async fn fetch_page(
        &self,
        access_token: &str,
        query: &EventQuery,
        page_token: Option<&str>,
    ) -> Result<EventsPage> {
        let url = self.events_url(&query.calendar_id)?;
        let mut params = query.to_query_params();
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .query(&params)
            .send()
            .await
            .map_err(|e| MeetingError::calendar(format!("Google API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(MeetingError::calendar(format!(
                "Google API error ({}): {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| MeetingError::calendar(format!("Failed to parse Google response: {}", e)))
    }
}

impl Default for GoogleCalendarClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CalendarBackend for GoogleCalendarClient {
    async fn list_events(&self, access_token: &str, query: &EventQuery) -> Result<Vec<RawEvent>> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let page = self
                .fetch_page(access_token, query, page_token.as_deref())
                .await?;
            events.extend(page.items);

            match page.next_page_token {
                Some(next) if query.all_pages => page_token = Some(next),
                _ => return Ok(events),
            }
        }

        tracing::warn!(
            calendar_id = %query.calendar_id,
            pages = MAX_PAGES,
            "Stopped paging Google Calendar events"
        );
        Ok(events)
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_list_events_sends_query() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .and(header("authorization", "Bearer ya29.token"))
            .and(query_param("singleEvents", "true"))
            .and(query_param("orderBy", "startTime"))
            .and(query_param("maxResults", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "calendar#events",
                "items": [{
                    "id": "evt-1",
                    "summary": "Standup",
                    "start": { "dateTime": "2099-01-01T09:00:00Z" },
                    "end": { "dateTime": "2099-01-01T09:15:00Z" }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GoogleCalendarClient::with_base_url(server.uri());
        let query = EventQuery::upcoming("primary", Utc::now(), 5);
        let events = client.list_events("ya29.token", &query).await.unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary.as_deref(), Some("Standup"));
    }

    #[test]
    fn test_events_url_encodes_calendar_id() {
        let client = GoogleCalendarClient::new();
        let url = client
            .events_url("en.usa#holiday@group.v.calendar.google.com")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/en.usa%23holiday@group.v.calendar.google.com/events"
        );
    }

    #[tokio::test]
    async fn test_list_events_for_holiday_calendar() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(
                "/calendars/en.usa%23holiday@group.v.calendar.google.com/events",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{ "id": "new-year" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GoogleCalendarClient::with_base_url(server.uri());
        let query = EventQuery::upcoming(
            "en.usa#holiday@group.v.calendar.google.com",
            Utc::now(),
            5,
        );
        let events = client.list_events("token", &query).await.unwrap();

        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_list_events_follows_pages_for_past_window() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .and(query_param("pageToken", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{ "id": "b" }]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{ "id": "a" }],
                "nextPageToken": "page-2"
            })))
            .mount(&server)
            .await;

        let client = GoogleCalendarClient::with_base_url(server.uri());
        let query = EventQuery::past("primary", Utc::now(), Duration::days(30));
        let events = client.list_events("token", &query).await.unwrap();

        let ids: Vec<_> = events.iter().filter_map(|e| e.id.as_deref()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_upcoming_window_does_not_page() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{ "id": "a" }],
                "nextPageToken": "page-2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GoogleCalendarClient::with_base_url(server.uri());
        let query = EventQuery::upcoming("primary", Utc::now(), 5);
        let events = client.list_events("token", &query).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_list_events_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid Credentials"))
            .mount(&server)
            .await;

        let client = GoogleCalendarClient::with_base_url(server.uri());
        let query = EventQuery::upcoming("primary", Utc::now(), 5);
        let err = client.list_events("expired", &query).await.unwrap_err();

        match err {
            MeetingError::CalendarFetch(msg) => assert!(msg.contains("401")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = GoogleCalendarClient::with_base_url("http://localhost:1234/");
        assert_eq!(client.base_url(), "http://localhost:1234");
    }
}

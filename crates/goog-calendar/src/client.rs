//! Google Calendar API client.

use goog_auth::{ContextOptions, GoogleApp, ServiceContext};
use tracing::instrument;

use crate::error::CalendarError;
use crate::types::*;

const CALENDAR_API_BASE: &str = "https://www.googleapis.com";

pub struct CalendarClient {
    client: reqwest::Client,
    ctx: ServiceContext,
    base_url: String,
}

impl CalendarClient {
    /// Build a client from configured `calendar` credentials.
    pub fn new(opts: ContextOptions) -> Result<Self, CalendarError> {
        let ctx = ServiceContext::new(GoogleApp::Calendar, opts)?;
        Ok(Self::from_context(ctx))
    }

    pub fn from_context(ctx: ServiceContext) -> Self {
        Self {
            client: reqwest::Client::new(),
            ctx,
            base_url: CALENDAR_API_BASE.to_string(),
        }
    }

    /// Point the client at another host (mock servers, proxies).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/calendar/{}{}", self.base_url, self.ctx.version(), path)
    }

    /// List the calendars of the account, following pagination.
    #[instrument(skip(self), level = "info")]
    pub async fn list_calendar(&self) -> Result<Vec<CalendarEntry>, CalendarError> {
        let mut calendars = vec![];
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.url("/users/me/calendarList");
            if let Some(pt) = &page_token {
                url.push_str(&format!("?pageToken={}", urlencoding::encode(pt)));
            }

            let response = self
                .client
                .get(&url)
                .header("Authorization", self.ctx.auth_header().await?)
                .send()
                .await?;

            let resp: CalendarListResponse = self.handle_response(response).await?;
            calendars.extend(resp.items.into_iter().map(CalendarEntry::from));

            match resp.next_page_token {
                Some(pt) => page_token = Some(pt),
                None => break,
            }
        }

        Ok(calendars)
    }

    /// List one page of events from a calendar.
    #[instrument(skip(self), level = "info")]
    pub async fn list_events(
        &self,
        calendar_id: &str,
        query: &EventQuery,
    ) -> Result<EventPage, CalendarError> {
        let mut url = self.url(&format!("/calendars/{}/events", urlencoding::encode(calendar_id)));
        let qs = query.to_query_string();
        if !qs.is_empty() {
            url = format!("{}?{}", url, qs);
        }

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.ctx.auth_header().await?)
            .send()
            .await?;

        let resp: EventListResponse = self.handle_response(response).await?;
        Ok(EventPage {
            events: resp
                .items
                .into_iter()
                .filter_map(|e| match Event::from_api(e, calendar_id) {
                    Ok(event) => Some(event),
                    Err(e) => {
                        tracing::warn!("Skipping event: {}", e);
                        None
                    }
                })
                .collect(),
            next_page_token: resp.next_page_token,
        })
    }

    /// Get a single event.
    #[instrument(skip(self), level = "info")]
    pub async fn get_events(
        &self,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<Event, CalendarError> {
        let url = self.url(&format!(
            "/calendars/{}/events/{}",
            urlencoding::encode(calendar_id),
            urlencoding::encode(event_id),
        ));

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.ctx.auth_header().await?)
            .send()
            .await?;

        let api_event: ApiEvent = self.handle_response(response).await?;
        Event::from_api(api_event, calendar_id)
    }

    /// Delete an event.
    #[instrument(skip(self), level = "info")]
    pub async fn delete_events(
        &self,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<(), CalendarError> {
        tracing::info!("Deleting calendar events");
        let url = self.url(&format!(
            "/calendars/{}/events/{}",
            urlencoding::encode(calendar_id),
            urlencoding::encode(event_id),
        ));

        let response = self
            .client
            .delete(&url)
            .header("Authorization", self.ctx.auth_header().await?)
            .send()
            .await?;

        // Delete returns 204 No Content on success
        if response.status().is_success() {
            Ok(())
        } else {
            self.handle_response::<serde_json::Value>(response).await.map(|_| ())
        }
    }

    /// Create a new event.
    #[instrument(skip(self, event), fields(summary = %event.summary), level = "info")]
    pub async fn insert_events(
        &self,
        calendar_id: &str,
        event: &NewEvent,
    ) -> Result<Event, CalendarError> {
        tracing::info!("Creating calendar events");
        let body = event.to_api().map_err(CalendarError::InvalidEventData)?;
        let url = self.url(&format!("/calendars/{}/events", urlencoding::encode(calendar_id)));

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.ctx.auth_header().await?)
            .json(&body)
            .send()
            .await?;

        let api_event: ApiEvent = self.handle_response(response).await?;
        Event::from_api(api_event, calendar_id)
    }

    /// Helper to handle API responses and errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, CalendarError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| CalendarError::ApiError(format!("JSON parse error: {}", e)))
        } else if status.as_u16() == 401 {
            Err(CalendarError::TokenExpired)
        } else if status.as_u16() == 403 {
            Err(CalendarError::AuthRequired)
        } else if status.as_u16() == 404 {
            let text = response.text().await.unwrap_or_default();
            Err(CalendarError::NotFound(text))
        } else if status.as_u16() == 409 {
            Err(CalendarError::Conflict)
        } else if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            Err(CalendarError::RateLimited(retry_after))
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(CalendarError::ApiError(format!("{}: {}", status, text)))
        }
    }
}

//! Calendar API types and data structures.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

/// Calendar event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub calendar_id: String,
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    pub all_day: bool,
    pub attendees: Vec<Attendee>,
    pub organizer: Option<String>,
    pub status: EventStatus,
    pub html_link: Option<String>,
    pub etag: Option<String>,
}

/// Event time - can be a specific datetime or an all-day date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventTime {
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
}

impl EventTime {
    pub fn as_datetime(&self) -> DateTime<Utc> {
        match self {
            EventTime::DateTime(dt) => *dt,
            EventTime::Date(d) => d.and_time(NaiveTime::MIN).and_utc(),
        }
    }

    /// API representation: `{"dateTime": ...}` or `{"date": ...}`.
    pub fn to_api(&self) -> serde_json::Value {
        match self {
            EventTime::DateTime(dt) => serde_json::json!({ "dateTime": dt.to_rfc3339() }),
            EventTime::Date(d) => serde_json::json!({ "date": d.format("%Y-%m-%d").to_string() }),
        }
    }
}

/// Event status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum EventStatus {
    Confirmed,
    Tentative,
    Cancelled,
}

impl Default for EventStatus {
    fn default() -> Self {
        Self::Confirmed
    }
}

/// Event attendee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
    pub display_name: Option<String>,
    pub response_status: ResponseStatus,
    pub is_organizer: bool,
}

/// Attendee response status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ResponseStatus {
    NeedsAction,
    Declined,
    Tentative,
    Accepted,
}

impl Default for ResponseStatus {
    fn default() -> Self {
        Self::NeedsAction
    }
}

/// Entry of the account's calendar list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub id: String,
    pub summary: String,
    pub description: Option<String>,
    pub time_zone: Option<String>,
    pub background_color: Option<String>,
    pub foreground_color: Option<String>,
    pub is_primary: bool,
    pub access_role: AccessRole,
}

/// Calendar access role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum AccessRole {
    Owner,
    Writer,
    Reader,
    FreeBusyReader,
}

impl Default for AccessRole {
    fn default() -> Self {
        Self::Reader
    }
}

/// Filters for listing events. Unset fields are omitted from the request.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub time_min: Option<DateTime<Utc>>,
    pub time_max: Option<DateTime<Utc>>,
    /// Free-text search
    pub q: Option<String>,
    /// Expand recurring events into instances
    pub single_events: bool,
    /// `startTime` (requires `single_events`) or `updated`
    pub order_by: Option<String>,
    pub max_results: Option<u32>,
    pub page_token: Option<String>,
}

impl EventQuery {
    pub fn between(time_min: DateTime<Utc>, time_max: DateTime<Utc>) -> Self {
        Self {
            time_min: Some(time_min),
            time_max: Some(time_max),
            single_events: true,
            order_by: Some("startTime".to_string()),
            ..Default::default()
        }
    }

    /// Encoded query string, without the leading `?`.
    pub fn to_query_string(&self) -> String {
        let mut params = vec![];

        if let Some(t) = self.time_min {
            params.push(format!("timeMin={}", urlencoding::encode(&t.to_rfc3339())));
        }
        if let Some(t) = self.time_max {
            params.push(format!("timeMax={}", urlencoding::encode(&t.to_rfc3339())));
        }
        if let Some(q) = &self.q {
            params.push(format!("q={}", urlencoding::encode(q)));
        }
        if self.single_events {
            params.push("singleEvents=true".to_string());
        }
        if let Some(order) = &self.order_by {
            params.push(format!("orderBy={}", urlencoding::encode(order)));
        }
        if let Some(n) = self.max_results {
            params.push(format!("maxResults={}", n));
        }
        if let Some(pt) = &self.page_token {
            params.push(format!("pageToken={}", urlencoding::encode(pt)));
        }

        params.join("&")
    }
}

/// One page of events.
#[derive(Debug, Clone)]
pub struct EventPage {
    pub events: Vec<Event>,
    pub next_page_token: Option<String>,
}

/// Event to insert.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub summary: String,
    pub start: EventTime,
    pub end: EventTime,
    pub description: Option<String>,
    pub location: Option<String>,
    /// Attendee email addresses
    pub attendees: Vec<String>,
}

impl NewEvent {
    pub fn new(summary: impl Into<String>, start: EventTime, end: EventTime) -> Self {
        Self {
            summary: summary.into(),
            start,
            end,
            description: None,
            location: None,
            attendees: vec![],
        }
    }

    /// Request body for `events.insert`.
    pub fn to_api(&self) -> Result<serde_json::Value, String> {
        if self.summary.trim().is_empty() {
            return Err("summary must not be empty".to_string());
        }
        if self.end.as_datetime() < self.start.as_datetime() {
            return Err("end is before start".to_string());
        }

        let mut body = serde_json::json!({
            "summary": self.summary,
            "start": self.start.to_api(),
            "end": self.end.to_api(),
        });

        if let Some(desc) = &self.description {
            body["description"] = serde_json::Value::String(desc.clone());
        }
        if let Some(loc) = &self.location {
            body["location"] = serde_json::Value::String(loc.clone());
        }
        if !self.attendees.is_empty() {
            body["attendees"] = self
                .attendees
                .iter()
                .map(|email| serde_json::json!({ "email": email }))
                .collect();
        }

        Ok(body)
    }
}

// API Response Types

/// Google Calendar API event response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: Option<ApiEventTime>,
    pub end: Option<ApiEventTime>,
    #[serde(default)]
    pub attendees: Vec<ApiAttendee>,
    pub organizer: Option<ApiOrganizer>,
    pub status: Option<String>,
    pub html_link: Option<String>,
    pub etag: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEventTime {
    pub date_time: Option<String>,
    pub date: Option<String>,
    pub time_zone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAttendee {
    pub email: String,
    pub display_name: Option<String>,
    pub response_status: Option<String>,
    #[serde(default)]
    pub organizer: bool,
}

#[derive(Debug, Deserialize)]
pub struct ApiOrganizer {
    pub email: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

/// API response for event list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListResponse {
    #[serde(default)]
    pub items: Vec<ApiEvent>,
    pub next_page_token: Option<String>,
}

/// API response for calendar list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListResponse {
    #[serde(default)]
    pub items: Vec<ApiCalendar>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCalendar {
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub time_zone: Option<String>,
    pub background_color: Option<String>,
    pub foreground_color: Option<String>,
    #[serde(default)]
    pub primary: bool,
    pub access_role: Option<String>,
}

impl Event {
    /// Convert API response to local Event. The start time is required; a
    /// missing end means the event ends when it starts.
    pub fn from_api(api: ApiEvent, calendar_id: &str) -> Result<Self, CalendarError> {
        let start = api.start.as_ref().ok_or_else(|| {
            CalendarError::InvalidEventData(format!("event {} has no start time", api.id))
        })?;
        let (start, all_day) = parse_event_time(&api.id, start)?;

        let end = match &api.end {
            Some(t) => parse_event_time(&api.id, t)?.0,
            None => start.clone(),
        };

        let status = match api.status.as_deref() {
            Some("confirmed") => EventStatus::Confirmed,
            Some("tentative") => EventStatus::Tentative,
            Some("cancelled") => EventStatus::Cancelled,
            _ => EventStatus::Confirmed,
        };

        let attendees = api
            .attendees
            .into_iter()
            .map(|a| {
                let response_status = match a.response_status.as_deref() {
                    Some("accepted") => ResponseStatus::Accepted,
                    Some("declined") => ResponseStatus::Declined,
                    Some("tentative") => ResponseStatus::Tentative,
                    _ => ResponseStatus::NeedsAction,
                };
                Attendee {
                    email: a.email,
                    display_name: a.display_name,
                    response_status,
                    is_organizer: a.organizer,
                }
            })
            .collect();

        Ok(Self {
            id: api.id,
            calendar_id: calendar_id.to_string(),
            summary: api.summary.unwrap_or_default(),
            description: api.description,
            location: api.location,
            start,
            end,
            all_day,
            attendees,
            organizer: api.organizer.and_then(|o| o.email),
            status,
            html_link: api.html_link,
            etag: api.etag,
        })
    }
}

impl From<ApiCalendar> for CalendarEntry {
    fn from(api: ApiCalendar) -> Self {
        let access_role = match api.access_role.as_deref() {
            Some("owner") => AccessRole::Owner,
            Some("writer") => AccessRole::Writer,
            Some("reader") => AccessRole::Reader,
            Some("freeBusyReader") => AccessRole::FreeBusyReader,
            _ => AccessRole::Reader,
        };

        Self {
            id: api.id,
            summary: api.summary.unwrap_or_default(),
            description: api.description,
            time_zone: api.time_zone,
            background_color: api.background_color,
            foreground_color: api.foreground_color,
            is_primary: api.primary,
            access_role,
        }
    }
}

fn parse_event_time(event_id: &str, api: &ApiEventTime) -> Result<(EventTime, bool), CalendarError> {
    let invalid = |value: &str| {
        CalendarError::InvalidEventData(format!("event {} has unparseable time {:?}", event_id, value))
    };

    if let Some(dt_str) = &api.date_time {
        let dt = DateTime::parse_from_rfc3339(dt_str).map_err(|_| invalid(dt_str))?;
        return Ok((EventTime::DateTime(dt.with_timezone(&Utc)), false));
    }
    if let Some(date_str) = &api.date {
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|_| invalid(date_str))?;
        return Ok((EventTime::Date(date), true));
    }
    Err(invalid(""))
}

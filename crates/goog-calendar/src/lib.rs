//! Google Calendar facade: calendar list and event CRUD.

pub mod client;
pub mod error;
pub mod types;

pub use client::CalendarClient;
pub use error::CalendarError;
pub use types::{
    AccessRole, Attendee, CalendarEntry, Event, EventPage, EventQuery, EventStatus, EventTime,
    NewEvent, ResponseStatus,
};

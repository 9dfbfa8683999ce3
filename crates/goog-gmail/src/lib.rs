//! Gmail facade: search, fetch, label and send on behalf of the configured account.

pub mod client;
pub mod compose;
pub mod error;
pub mod types;

pub use client::GmailClient;
pub use error::GmailError;
pub use types::{
    MessageListResponse, MessageRef, Outgoing, Profile, RawEmail, SearchQuery, SentMessage,
};

//! Gmail API types and data structures.

use std::path::PathBuf;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::GmailError;

/// Gmail search query: either a raw `q` string or `key:value` criteria.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchQuery {
    Raw(String),
    Criteria(Vec<(String, String)>),
}

impl SearchQuery {
    pub fn raw(q: impl Into<String>) -> Self {
        Self::Raw(q.into())
    }

    /// `[("from", "a@b.com"), ("is", "unread")]` becomes `from:a@b.com is:unread`.
    pub fn criteria<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Criteria(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Value of the `q` parameter.
    pub fn to_q(&self) -> String {
        match self {
            Self::Raw(q) => q.clone(),
            Self::Criteria(pairs) => pairs
                .iter()
                .map(|(k, v)| format!("{}:{}", k, v))
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// Profile of the mailbox owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub email_address: String,
    #[serde(default)]
    pub messages_total: Option<u64>,
    #[serde(default)]
    pub threads_total: Option<u64>,
    #[serde(default)]
    pub history_id: Option<String>,
}

/// API response for message list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageListResponse {
    #[serde(default)]
    pub messages: Vec<MessageRef>,
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub result_size_estimate: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub label_ids: Vec<String>,
}

/// Gmail API message in `raw` format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRawMessage {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub label_ids: Vec<String>,
    #[serde(default)]
    pub snippet: String,
    pub raw: String,
}

/// A fetched email: parsed headers plus the undecoded body.
#[derive(Debug, Clone)]
pub struct RawEmail {
    pub id: String,
    pub thread_id: String,
    pub labels: Vec<String>,
    pub snippet: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Complete RFC 822 message
    pub raw: Vec<u8>,
}

impl RawEmail {
    pub fn from_api(api: ApiRawMessage) -> Result<Self, GmailError> {
        let raw = decode_base64url(&api.raw)?;
        let (headers, body) = split_message(&raw);

        Ok(Self {
            id: api.id,
            thread_id: api.thread_id,
            labels: api.label_ids,
            snippet: api.snippet,
            headers,
            body: body.to_vec(),
            raw,
        })
    }

    /// First header with this name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn sender(&self) -> &str {
        self.header("From").unwrap_or_default()
    }

    pub fn subject(&self) -> &str {
        self.header("Subject").unwrap_or_default()
    }
}

/// Gmail pads inconsistently; accept both padded and unpadded base64url.
fn decode_base64url(data: &str) -> Result<Vec<u8>, GmailError> {
    let trimmed = data.trim_end_matches('=');
    base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|e| GmailError::InvalidMessageFormat(e.to_string()))
}

/// Split an RFC 822 message into unfolded headers and body.
fn split_message(raw: &[u8]) -> (Vec<(String, String)>, &[u8]) {
    let (head, body) = match find_subslice(raw, b"\r\n\r\n") {
        Some(i) => (&raw[..i], &raw[i + 4..]),
        None => match find_subslice(raw, b"\n\n") {
            Some(i) => (&raw[..i], &raw[i + 2..]),
            None => (raw, &raw[raw.len()..]),
        },
    };

    let text = String::from_utf8_lossy(head);
    let mut headers: Vec<(String, String)> = vec![];
    for line in text.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some((_, value)) = headers.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    (headers, body)
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// An email to send.
#[derive(Debug, Clone, Default)]
pub struct Outgoing {
    /// Falls back to the configured `mail_from`
    pub sender: Option<String>,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<PathBuf>,
}

impl Outgoing {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: vec![to.into()],
            subject: subject.into(),
            body: body.into(),
            ..Default::default()
        }
    }
}

/// Response of `messages.send`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessage {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub label_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_criteria_query() {
        let q = SearchQuery::criteria([("from", "boss@example.com"), ("is", "unread")]);
        assert_eq!(q.to_q(), "from:boss@example.com is:unread");
    }

    #[test]
    fn test_raw_query_passes_through() {
        assert_eq!(SearchQuery::raw("subject:(a b)").to_q(), "subject:(a b)");
    }

    #[test]
    fn test_raw_email_from_api() {
        let message = "From: sender@example.com\r\nSubject: Quarterly\r\n numbers\r\nTo: me@example.com\r\n\r\nHello body";
        let encoded = base64::engine::general_purpose::URL_SAFE.encode(message);

        let api = ApiRawMessage {
            id: "m1".into(),
            thread_id: "t1".into(),
            label_ids: vec!["INBOX".into()],
            snippet: "Hello".into(),
            raw: encoded,
        };
        let email = RawEmail::from_api(api).unwrap();

        assert_eq!(email.sender(), "sender@example.com");
        assert_eq!(email.subject(), "Quarterly numbers");
        assert_eq!(email.header("to"), Some("me@example.com"));
        assert_eq!(email.body, b"Hello body");
        assert_eq!(email.raw, message.as_bytes());
    }

    #[test]
    fn test_raw_email_bare_newlines() {
        let encoded =
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode("Subject: hi\n\nbody\n");
        let api = ApiRawMessage {
            id: "m2".into(),
            thread_id: String::new(),
            label_ids: vec![],
            snippet: String::new(),
            raw: encoded,
        };
        let email = RawEmail::from_api(api).unwrap();
        assert_eq!(email.subject(), "hi");
        assert_eq!(email.body, b"body\n");
    }

    #[test]
    fn test_invalid_raw_is_error() {
        let api = ApiRawMessage {
            id: "bad".into(),
            thread_id: String::new(),
            label_ids: vec![],
            snippet: String::new(),
            raw: "!!!".into(),
        };
        assert!(matches!(
            RawEmail::from_api(api),
            Err(GmailError::InvalidMessageFormat(_))
        ));
    }

    #[test]
    fn test_message_list_response_parsing() {
        let json = r#"{
            "messages": [
                {"id": "msg1", "threadId": "thread1"},
                {"id": "msg2", "threadId": "thread2"}
            ],
            "nextPageToken": "token123",
            "resultSizeEstimate": 100
        }"#;

        let response: MessageListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.messages.len(), 2);
        assert_eq!(response.next_page_token, Some("token123".into()));
        assert_eq!(response.result_size_estimate, 100);
    }

    #[test]
    fn test_empty_message_list() {
        let response: MessageListResponse =
            serde_json::from_str(r#"{"resultSizeEstimate": 0}"#).unwrap();
        assert!(response.messages.is_empty());
        assert!(response.next_page_token.is_none());
    }
}

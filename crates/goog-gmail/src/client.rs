//! Gmail API client.

use goog_auth::{ContextOptions, GoogleApp, ServiceContext};
use tracing::instrument;

use crate::compose;
use crate::error::GmailError;
use crate::types::*;

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com";

pub struct GmailClient {
    client: reqwest::Client,
    ctx: ServiceContext,
    base_url: String,
    mail_from: Option<String>,
}

impl GmailClient {
    /// Build a client from configured `gmail` credentials.
    pub fn new(opts: ContextOptions) -> Result<Self, GmailError> {
        let ctx = ServiceContext::new(GoogleApp::Gmail, opts)?;
        Ok(Self::from_context(ctx))
    }

    pub fn from_context(ctx: ServiceContext) -> Self {
        Self {
            client: reqwest::Client::new(),
            ctx,
            base_url: GMAIL_API_BASE.to_string(),
            mail_from: goog_core::settings().mail_from,
        }
    }

    /// Point the client at another host (mock servers, proxies).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Default sender for [`send_mail`](Self::send_mail).
    pub fn with_mail_from(mut self, mail_from: Option<String>) -> Self {
        self.mail_from = mail_from;
        self
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/gmail/{}/users/{}{}",
            self.base_url,
            self.ctx.version(),
            self.ctx.account(),
            path
        )
    }

    #[instrument(skip(self), level = "info")]
    pub async fn get_profile(&self) -> Result<Profile, GmailError> {
        let response = self
            .client
            .get(self.url("/profile"))
            .header("Authorization", self.ctx.auth_header().await?)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// One page of message IDs matching the query.
    #[instrument(skip(self), level = "info")]
    pub async fn list_emails(
        &self,
        query: &SearchQuery,
        page_token: Option<&str>,
    ) -> Result<MessageListResponse, GmailError> {
        let q = query.to_q();
        tracing::info!("Searching emails with query {}", q);

        let mut url = format!("{}?q={}", self.url("/messages"), urlencoding::encode(&q));
        if let Some(pt) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(pt)));
        }

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.ctx.auth_header().await?)
            .send()
            .await?;

        let resp: MessageListResponse = self.handle_response(response).await?;
        tracing::info!("Result size estimate {}", resp.result_size_estimate);
        Ok(resp)
    }

    /// Fetch one message in `raw` format.
    #[instrument(skip(self), level = "info")]
    pub async fn get_raw(&self, message_id: &str) -> Result<RawEmail, GmailError> {
        let url = format!(
            "{}?format=raw",
            self.url(&format!("/messages/{}", urlencoding::encode(message_id)))
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.ctx.auth_header().await?)
            .send()
            .await?;

        let api_msg: ApiRawMessage = self.handle_response(response).await?;
        RawEmail::from_api(api_msg)
    }

    /// Every message matching the query, across all result pages.
    ///
    /// Messages that fail to fetch or decode are logged and skipped.
    #[instrument(skip(self), level = "info")]
    pub async fn get_emails(&self, query: &SearchQuery) -> Result<Vec<RawEmail>, GmailError> {
        let mut emails = vec![];

        for msg in self.all_message_refs(query).await? {
            match self.get_raw(&msg.id).await {
                Ok(email) => emails.push(email),
                Err(e) => tracing::warn!("Failed to fetch message {}: {}", msg.id, e),
            }
        }

        Ok(emails)
    }

    async fn all_message_refs(&self, query: &SearchQuery) -> Result<Vec<MessageRef>, GmailError> {
        let mut refs = vec![];
        let mut page_token: Option<String> = None;

        loop {
            let resp = self.list_emails(query, page_token.as_deref()).await?;
            refs.extend(resp.messages);

            match resp.next_page_token {
                Some(pt) => page_token = Some(pt),
                None => break,
            }
        }

        Ok(refs)
    }

    /// Add and remove labels on one message.
    #[instrument(skip(self), level = "info")]
    pub async fn modify_labels(
        &self,
        message_id: &str,
        add_labels: &[&str],
        remove_labels: &[&str],
    ) -> Result<(), GmailError> {
        let url = self.url(&format!("/messages/{}/modify", urlencoding::encode(message_id)));

        let body = serde_json::json!({
            "addLabelIds": add_labels,
            "removeLabelIds": remove_labels,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.ctx.auth_header().await?)
            .json(&body)
            .send()
            .await?;

        self.handle_response::<serde_json::Value>(response).await.map(|_| ())
    }

    /// Add (or remove) `label` on every message matching the query.
    ///
    /// Returns how many messages were modified.
    #[instrument(skip(self), level = "info")]
    pub async fn mark_as(
        &self,
        label: &str,
        add: bool,
        query: &SearchQuery,
    ) -> Result<usize, GmailError> {
        let labels = [label];
        let (add_labels, remove_labels): (&[&str], &[&str]) =
            if add { (&labels, &[]) } else { (&[], &labels) };

        let mut modified = 0;
        for msg in self.all_message_refs(query).await? {
            match self.modify_labels(&msg.id, add_labels, remove_labels).await {
                Ok(()) => modified += 1,
                Err(e) => tracing::warn!("Failed to modify labels of {}: {}", msg.id, e),
            }
        }

        tracing::info!("Modified {} messages", modified);
        Ok(modified)
    }

    /// Send an email, with attachments when any are given.
    #[instrument(skip(self, mail), fields(subject = %mail.subject), level = "info")]
    pub async fn send_mail(&self, mail: &Outgoing) -> Result<SentMessage, GmailError> {
        let sender = mail
            .sender
            .clone()
            .or_else(|| self.mail_from.clone())
            .ok_or(GmailError::MissingSetting("sender"))?;

        let raw = compose::build_message(
            &sender,
            &mail.to.join(","),
            &mail.subject,
            &mail.body,
            mail.attachments.as_slice(),
        )?;

        let response = self
            .client
            .post(self.url("/messages/send"))
            .header("Authorization", self.ctx.auth_header().await?)
            .json(&serde_json::json!({ "raw": compose::encode_raw(&raw) }))
            .send()
            .await?;

        let sent: SentMessage = self.handle_response(response).await?;
        tracing::info!("Sent message {}", sent.id);
        Ok(sent)
    }

    /// Helper to handle API responses and errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, GmailError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| GmailError::ApiError(format!("JSON parse error: {}", e)))
        } else if status.as_u16() == 401 {
            Err(GmailError::TokenExpired)
        } else if status.as_u16() == 403 {
            Err(GmailError::AuthRequired)
        } else if status.as_u16() == 404 {
            let text = response.text().await.unwrap_or_default();
            Err(GmailError::MessageNotFound(text))
        } else if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            Err(GmailError::RateLimited(retry_after))
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(GmailError::ApiError(format!("{}: {}", status, text)))
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use base64::Engine;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GmailClient {
        let ctx = ServiceContext::with_token(GoogleApp::Gmail, "me@example.com", "test_token");
        GmailClient::from_context(ctx)
            .with_base_url(&server.uri())
            .with_mail_from(None)
    }

    fn raw_message(body: &str) -> String {
        base64::engine::general_purpose::URL_SAFE.encode(body)
    }

    #[tokio::test]
    async fn test_get_profile() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me@example.com/profile"))
            .and(header("Authorization", "Bearer test_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "emailAddress": "me@example.com",
                "messagesTotal": 42,
                "threadsTotal": 40,
                "historyId": "1234"
            })))
            .mount(&mock_server)
            .await;

        let profile = client(&mock_server).get_profile().await.unwrap();
        assert_eq!(profile.email_address, "me@example.com");
        assert_eq!(profile.messages_total, Some(42));
    }

    #[tokio::test]
    async fn test_list_emails_with_criteria() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me@example.com/messages"))
            .and(query_param("q", "from:boss@example.com is:unread"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [{"id": "msg1", "threadId": "t1"}],
                "resultSizeEstimate": 1
            })))
            .mount(&mock_server)
            .await;

        let query = SearchQuery::criteria([("from", "boss@example.com"), ("is", "unread")]);
        let resp = client(&mock_server).list_emails(&query, None).await.unwrap();

        assert_eq!(resp.messages.len(), 1);
        assert_eq!(resp.messages[0].id, "msg1");
    }

    #[tokio::test]
    async fn test_get_emails_follows_pages_and_skips_failures() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me@example.com/messages"))
            .and(query_param("pageToken", "p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [{"id": "m2"}, {"id": "gone"}],
                "resultSizeEstimate": 2
            })))
            .with_priority(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me@example.com/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [{"id": "m1"}],
                "nextPageToken": "p2",
                "resultSizeEstimate": 3
            })))
            .with_priority(2)
            .mount(&mock_server)
            .await;

        for id in ["m1", "m2"] {
            Mock::given(method("GET"))
                .and(path(format!("/gmail/v1/users/me@example.com/messages/{}", id)))
                .and(query_param("format", "raw"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "id": id,
                    "raw": raw_message(&format!("Subject: {}\r\n\r\nbody", id))
                })))
                .mount(&mock_server)
                .await;
        }

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me@example.com/messages/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let emails = client(&mock_server)
            .get_emails(&SearchQuery::raw("label:reports"))
            .await
            .unwrap();

        let subjects: Vec<_> = emails.iter().map(|e| e.subject()).collect();
        assert_eq!(subjects, vec!["m1", "m2"]);
    }

    #[tokio::test]
    async fn test_mark_as_counts_modified() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me@example.com/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [{"id": "a"}, {"id": "b"}],
                "resultSizeEstimate": 2
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me@example.com/messages/a/modify"))
            .and(body_partial_json(serde_json::json!({"removeLabelIds": ["UNREAD"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "a"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me@example.com/messages/b/modify"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let modified = client(&mock_server)
            .mark_as("UNREAD", false, &SearchQuery::raw("is:unread"))
            .await
            .unwrap();

        assert_eq!(modified, 1);
    }

    #[tokio::test]
    async fn test_send_mail_uses_configured_sender() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me@example.com/messages/send"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "sent1",
                "threadId": "t9",
                "labelIds": ["SENT"]
            })))
            .mount(&mock_server)
            .await;

        let mut mail = Outgoing::new("a@example.com", "Report", "Numbers attached");
        mail.to.push("b@example.com".into());

        let sent = client(&mock_server)
            .with_mail_from(Some("robot@example.com".into()))
            .send_mail(&mail)
            .await
            .unwrap();

        assert_eq!(sent.id, "sent1");
        assert_eq!(sent.label_ids, vec!["SENT".to_string()]);

        let requests = mock_server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let raw = base64::engine::general_purpose::URL_SAFE
            .decode(body["raw"].as_str().unwrap())
            .unwrap();
        let text = String::from_utf8(raw).unwrap();
        assert!(text.contains("From: robot@example.com\r\n"));
        assert!(text.contains("To: a@example.com,b@example.com\r\n"));
    }

    #[tokio::test]
    async fn test_send_mail_without_sender() {
        let mock_server = MockServer::start().await;
        let mail = Outgoing::new("a@example.com", "s", "b");

        let result = client(&mock_server).send_mail(&mail).await;
        assert!(matches!(result, Err(GmailError::MissingSetting("sender"))));
    }

    #[tokio::test]
    async fn test_token_expired_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me@example.com/profile"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let result = client(&mock_server).get_profile().await;
        assert!(matches!(result, Err(GmailError::TokenExpired)));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me@example.com/messages"))
            .respond_with(ResponseTemplate::new(429).append_header("Retry-After", "30"))
            .mount(&mock_server)
            .await;

        let result = client(&mock_server)
            .list_emails(&SearchQuery::raw(""), None)
            .await;
        assert!(matches!(result, Err(GmailError::RateLimited(30))));
    }
}

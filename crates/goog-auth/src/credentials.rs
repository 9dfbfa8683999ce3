//! Bearer tokens for API calls.

use goog_core::AuthError;
use tokio::sync::OnceCell;
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

enum TokenSource {
    ServiceAccount {
        key: ServiceAccountKey,
        scopes: Vec<String>,
        subject: Option<String>,
        authenticator: OnceCell<DefaultAuthenticator>,
    },
    Static(String),
}

/// Source of bearer tokens for API calls.
///
/// Service account tokens come from a `yup-oauth2` authenticator, built on
/// first use, which caches and re-issues them before expiry.
pub struct Credentials {
    source: TokenSource,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.source {
            TokenSource::ServiceAccount { key, .. } => key.client_email.as_str(),
            TokenSource::Static(_) => "static",
        };
        f.debug_struct("Credentials").field("source", &kind).finish()
    }
}

impl Credentials {
    /// Service account credentials impersonating `subject` (domain-wide delegation).
    pub fn service_account(
        key: ServiceAccountKey,
        scopes: Vec<String>,
        subject: Option<String>,
    ) -> Self {
        Self {
            source: TokenSource::ServiceAccount {
                key,
                scopes,
                subject,
                authenticator: OnceCell::new(),
            },
        }
    }

    /// A pre-issued bearer token, used as-is.
    pub fn from_token(access_token: &str) -> Self {
        Self {
            source: TokenSource::Static(access_token.to_string()),
        }
    }

    /// Current access token for the configured scopes.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        let (key, scopes, subject, authenticator) = match &self.source {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::ServiceAccount {
                key,
                scopes,
                subject,
                authenticator,
            } => (key, scopes, subject, authenticator),
        };

        let auth = authenticator
            .get_or_try_init(|| async {
                let mut builder = ServiceAccountAuthenticator::builder(key.clone());
                if let Some(subject) = subject {
                    builder = builder.subject(subject.clone());
                }
                tracing::debug!(
                    "Building authenticator for {} as {}",
                    key.client_email,
                    subject.as_deref().unwrap_or("itself")
                );
                builder
                    .build()
                    .await
                    .map_err(|e| AuthError::Authenticator(e.to_string()))
            })
            .await?;

        let token = auth
            .token(scopes.as_slice())
            .await
            .map_err(|e| AuthError::Token(e.to_string()))?;

        token
            .token()
            .map(String::from)
            .ok_or_else(|| AuthError::Token("response carried no access token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn bogus_key(token_uri: &str) -> ServiceAccountKey {
        yup_oauth2::parse_service_account_key(
            serde_json::json!({
                "type": "service_account",
                "client_email": "robot@project.iam.gserviceaccount.com",
                "private_key": "not a pem",
                "private_key_id": "kid1",
                "token_uri": token_uri
            })
            .to_string(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_static_token() {
        let creds = Credentials::from_token("abc");
        assert_eq!(creds.access_token().await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_unusable_key_fails_before_token_request() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.token",
                "expires_in": 3599
            })))
            .expect(0)
            .mount(&mock_server)
            .await;

        let creds = Credentials::service_account(
            bogus_key(&format!("{}/token", mock_server.uri())),
            vec!["https://www.googleapis.com/auth/drive".into()],
            Some("me@example.com".into()),
        );
        let err = creds.access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::Token(_) | AuthError::Authenticator(_)));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let creds = Credentials::service_account(
            bogus_key("https://oauth2.googleapis.com/token"),
            vec![],
            None,
        );
        let shown = format!("{:?}", creds);
        assert!(shown.contains("robot@project.iam.gserviceaccount.com"));
        assert!(!shown.contains("not a pem"));

        assert!(!format!("{:?}", Credentials::from_token("secret")).contains("secret"));
    }
}

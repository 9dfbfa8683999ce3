//! Gmail-specific error types.

use goog_core::AuthError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GmailError {
    #[error("Authentication required")]
    AuthRequired,

    #[error("Token expired")]
    TokenExpired,

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("Invalid message format: {0}")]
    InvalidMessageFormat(String),

    #[error("Line break in {0} header")]
    InvalidHeader(&'static str),

    #[error("{0} required when not configured")]
    MissingSetting(&'static str),

    #[error("Failed to read attachment {path}: {source}")]
    Attachment {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Credentials error: {0}")]
    Auth(#[from] AuthError),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl GmailError {
    /// Short, non-technical description of the failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthRequired => "The account is not allowed to use Gmail".to_string(),
            Self::TokenExpired => "The access token was rejected".to_string(),
            Self::RateLimited(secs) => format!("Too many requests. Please wait {} seconds.", secs),
            Self::MessageNotFound(_) => "Message not found".to_string(),
            Self::InvalidMessageFormat(_) => "Invalid email format".to_string(),
            Self::InvalidHeader(name) => format!("The {} field must be a single line", name),
            Self::MissingSetting(name) => format!("No {} configured", name),
            Self::Attachment { path, .. } => format!("Could not attach {}", path),
            Self::ApiError(msg) => format!("Gmail error: {}", msg),
            Self::Auth(e) => e.user_message().to_string(),
            Self::NetworkError(_) => "Network error. Check your connection.".to_string(),
        }
    }

    /// Whether this error should trigger a token refresh.
    pub fn should_refresh_token(&self) -> bool {
        matches!(self, Self::TokenExpired)
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_) | Self::NetworkError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_user_messages() {
        let err = GmailError::RateLimited(30);
        assert!(err.user_message().contains("30"));

        let err = GmailError::MissingSetting("sender");
        assert_eq!(err.to_string(), "sender required when not configured");
    }

    #[test]
    fn test_should_refresh_token() {
        assert!(GmailError::TokenExpired.should_refresh_token());
        assert!(!GmailError::MessageNotFound("x".into()).should_refresh_token());
    }

    #[test]
    fn test_is_retryable() {
        assert!(GmailError::RateLimited(10).is_retryable());
        assert!(!GmailError::MessageNotFound("x".into()).is_retryable());
    }
}

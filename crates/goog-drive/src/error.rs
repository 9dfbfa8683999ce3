//! Drive-specific error types.

use goog_core::{AuthError, ConfigError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriveError {
    #[error("Authentication required")]
    AuthRequired,

    #[error("Token expired")]
    TokenExpired,

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// A path that does not resolve.
    #[error("{0}")]
    NotFound(String),

    /// HTTP 404 from the API itself.
    #[error("Not found: {0}")]
    ApiNotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("Can only {0} a file, not a folder")]
    NotAFile(&'static str),

    #[error("Invalid upload source: {0}")]
    InvalidSource(String),

    #[error("Cannot resolve mimetype of {0}")]
    UnknownMimeType(String),

    #[error("{0} required when not configured")]
    MissingSetting(&'static str),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("API error: {0}")]
    ApiError(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Credentials error: {0}")]
    Auth(#[from] AuthError),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl DriveError {
    /// Short, non-technical description of the failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthRequired => "The account is not allowed to use Drive".to_string(),
            Self::TokenExpired => "The access token was rejected".to_string(),
            Self::RateLimited(secs) => format!("Too many requests. Please wait {} seconds.", secs),
            Self::NotFound(msg) => msg.clone(),
            Self::ApiNotFound(_) => "Drive could not find the requested item".to_string(),
            Self::AlreadyExists(path) => format!("{} already exists", path),
            Self::NotAFile(_) => "That path is a folder".to_string(),
            Self::InvalidSource(msg) => msg.clone(),
            Self::UnknownMimeType(name) => format!("Unknown file type for {}", name),
            Self::MissingSetting(name) => format!("No {} configured", name),
            Self::Upload(_) => "Upload did not complete".to_string(),
            Self::Io { path, .. } => format!("Could not access {}", path),
            Self::ApiError(msg) => format!("Drive error: {}", msg),
            Self::Config(e) => e.user_message().to_string(),
            Self::Auth(e) => e.user_message().to_string(),
            Self::NetworkError(_) => "Network error. Check your connection.".to_string(),
        }
    }

    /// The path did not resolve: missing item or unknown root.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::Config(ConfigError::UnknownSharedDrive(_))
        )
    }

    /// Whether this error should trigger a token refresh.
    pub fn should_refresh_token(&self) -> bool {
        matches!(self, Self::TokenExpired)
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_) | Self::NetworkError(_) | Self::Upload(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_is_verbatim() {
        let err = DriveError::NotFound("No such file a.csv in folder Reports/q1".into());
        assert_eq!(err.to_string(), "No such file a.csv in folder Reports/q1");
        assert!(err.is_lookup_failure());
    }

    #[test]
    fn test_unknown_root_is_lookup_failure() {
        let err = DriveError::from(ConfigError::UnknownSharedDrive("Nope".into()));
        assert_eq!(err.to_string(), "Unknown Shared Drive Nope");
        assert!(err.is_lookup_failure());
        assert!(!DriveError::AuthRequired.is_lookup_failure());
        assert!(!DriveError::ApiNotFound("Shared drive not found".into()).is_lookup_failure());
    }

    #[test]
    fn test_not_a_file() {
        assert_eq!(
            DriveError::NotAFile("delete").to_string(),
            "Can only delete a file, not a folder"
        );
    }

    #[test]
    fn test_is_retryable() {
        assert!(DriveError::RateLimited(10).is_retryable());
        assert!(!DriveError::AlreadyExists("x".into()).is_retryable());
    }
}

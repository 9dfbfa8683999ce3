//! Sheets-specific error types.

use goog_core::AuthError;
use goog_drive::DriveError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetsError {
    #[error("Authentication required")]
    AuthRequired,

    #[error("Token expired")]
    TokenExpired,

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("Spreadsheet not found: {0}")]
    NotFound(String),

    #[error("{name} exists in folder {folder} and overwrite set to false")]
    AlreadyExists { name: String, folder: String },

    #[error("No permission found for {0}")]
    PermissionNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error(transparent)]
    Drive(#[from] DriveError),

    #[error("Credentials error: {0}")]
    Auth(#[from] AuthError),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl SheetsError {
    /// Short, non-technical description of the failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthRequired => "The account is not allowed to use Sheets".to_string(),
            Self::TokenExpired => "The access token was rejected".to_string(),
            Self::RateLimited(secs) => format!("Too many requests. Please wait {} seconds.", secs),
            Self::NotFound(_) => "Spreadsheet not found".to_string(),
            Self::AlreadyExists { name, .. } => format!("{} already exists", name),
            Self::PermissionNotFound(email) => format!("{} has no access", email),
            Self::InvalidArgument(msg) => msg.clone(),
            Self::ApiError(msg) => format!("Sheets error: {}", msg),
            Self::Drive(e) => e.user_message(),
            Self::Auth(e) => e.user_message().to_string(),
            Self::NetworkError(_) => "Network error. Check your connection.".to_string(),
        }
    }

    /// Whether the caller should build a fresh context and try again.
    pub fn should_refresh_token(&self) -> bool {
        match self {
            Self::TokenExpired => true,
            Self::Drive(e) => e.should_refresh_token(),
            _ => false,
        }
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited(_) | Self::NetworkError(_) => true,
            Self::Drive(e) => e.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_exists_message() {
        let err = SheetsError::AlreadyExists {
            name: "Budget".into(),
            folder: "Reports/2024".into(),
        };
        assert_eq!(
            err.to_string(),
            "Budget exists in folder Reports/2024 and overwrite set to false"
        );
    }

    #[test]
    fn test_drive_errors_pass_through() {
        let err = SheetsError::from(DriveError::NotFound("No such file x in folder y".into()));
        assert_eq!(err.to_string(), "No such file x in folder y");
        assert!(SheetsError::from(DriveError::RateLimited(5)).is_retryable());
        assert!(SheetsError::from(DriveError::TokenExpired).should_refresh_token());
    }
}

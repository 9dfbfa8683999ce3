//! Error types shared across the goog crates.
//!
//! Each API facade keeps its own error enum; the kinds here cover the
//! bootstrap steps every facade goes through (settings lookup, credentials).

use thiserror::Error;

/// Settings lookups that failed while building a client.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} required when not configured")]
    MissingSetting(&'static str),

    #[error("Unknown app: {0}")]
    UnknownApp(String),

    #[error("Unknown Shared Drive {0}")]
    UnknownSharedDrive(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::MissingSetting(_) => "A required setting is missing. Check your settings.",
            ConfigError::UnknownApp(_) => "No credentials are configured for this Google API.",
            ConfigError::UnknownSharedDrive(_) => {
                "The path does not start with a configured shared drive."
            }
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}

/// Credential errors (service account keys, token issuance).
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to read service account key {path}: {message}")]
    InvalidKey { path: String, message: String },

    #[error("Failed to set up service account authenticator: {0}")]
    Authenticator(String),

    #[error("Failed to obtain access token: {0}")]
    Token(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AuthError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::InvalidKey { .. } => "The service account key could not be read.",
            AuthError::Authenticator(_) => "Unable to prepare Google authentication.",
            AuthError::Token(_) => {
                "Google rejected the service account. Check delegation and scopes."
            }
            AuthError::Config(e) => e.user_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_setting_message() {
        let err = ConfigError::MissingSetting("account");
        assert_eq!(err.to_string(), "account required when not configured");
    }

    #[test]
    fn test_auth_error_wraps_config_error() {
        let err: AuthError = ConfigError::UnknownApp("drive".into()).into();
        assert_eq!(err.to_string(), "Unknown app: drive");
        assert_eq!(
            err.user_message(),
            "No credentials are configured for this Google API."
        );
    }

    #[test]
    fn test_token_error_message() {
        let err = AuthError::Token("unauthorized_client".into());
        assert_eq!(err.to_string(), "Failed to obtain access token: unauthorized_client");
    }
}

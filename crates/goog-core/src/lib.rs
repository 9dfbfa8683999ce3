//! Shared settings, errors and bootstrap for the goog crates.

pub mod config;
pub mod error;
pub mod mime;

pub use config::{
    configure, settings, AppConfig, ConfigValidationError, ConfigureOptions, Settings,
    ValidationResult,
};
pub use error::{AuthError, ConfigError};

use anyhow::Result;

/// Escape single quotes so a file name can sit inside a Drive query literal.
pub fn clean_filename(fname: &str) -> String {
    fname.replace('\'', "\\'")
}

/// Initialize tracing for binaries.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::debug!("goog core initialized");
    Ok(())
}

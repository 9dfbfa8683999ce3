//! Authenticated per-API context shared by the facades.

use std::path::PathBuf;
use std::sync::Arc;

use goog_core::{AuthError, ConfigError, Settings};

use crate::credentials::Credentials;
use crate::key::load_key;

/// The Google APIs this crate talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoogleApp {
    Calendar,
    Gmail,
    Drive,
    Sheets,
}

impl GoogleApp {
    /// Key used in `app_configs`.
    pub fn name(&self) -> &'static str {
        match self {
            GoogleApp::Calendar => "calendar",
            GoogleApp::Gmail => "gmail",
            GoogleApp::Drive => "drive",
            GoogleApp::Sheets => "sheets",
        }
    }

    pub fn default_version(&self) -> &'static str {
        match self {
            GoogleApp::Calendar => "v3",
            GoogleApp::Gmail => "v1",
            GoogleApp::Drive => "v3",
            GoogleApp::Sheets => "v4",
        }
    }
}

impl std::fmt::Display for GoogleApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Explicit overrides for building a context. Anything left `None` comes from settings.
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    pub account: Option<String>,
    pub key: Option<PathBuf>,
    pub scopes: Option<Vec<String>>,
    pub version: Option<String>,
}

impl ContextOptions {
    pub fn account(account: impl Into<String>) -> Self {
        Self {
            account: Some(account.into()),
            ..Default::default()
        }
    }
}

/// Credentials resolved for one API, before any key file is read.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedContext {
    pub account: String,
    pub key: PathBuf,
    pub scopes: Vec<String>,
    pub version: String,
}

/// Merge explicit options with configured defaults.
///
/// Without an explicit key the app must have an `app_configs` entry, which then
/// supplies key, scopes and version. An explicit key still borrows the configured
/// version (and scopes, when none are given).
pub fn resolve(
    app: GoogleApp,
    opts: ContextOptions,
    settings: &Settings,
) -> Result<ResolvedContext, ConfigError> {
    let account = opts
        .account
        .or_else(|| settings.account.clone())
        .ok_or(ConfigError::MissingSetting("account"))?;

    let configured = settings.app_config(app.name());

    let (key, scopes, version) = match opts.key {
        None => {
            let cfg = configured.ok_or_else(|| ConfigError::UnknownApp(app.name().to_string()))?;
            (
                cfg.key.clone(),
                opts.scopes.unwrap_or_else(|| cfg.scopes.clone()),
                opts.version.or_else(|| cfg.version.clone()),
            )
        }
        Some(key) => {
            let scopes = match opts.scopes {
                Some(scopes) => scopes,
                None => configured
                    .map(|c| c.scopes.clone())
                    .ok_or(ConfigError::MissingSetting("scopes"))?,
            };
            let version = opts.version.or_else(|| configured.and_then(|c| c.version.clone()));
            (key, scopes, version)
        }
    };

    Ok(ResolvedContext {
        account,
        key,
        scopes,
        version: version.unwrap_or_else(|| app.default_version().to_string()),
    })
}

/// Authentication context for one Google API on behalf of one account.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    app: GoogleApp,
    account: String,
    version: String,
    credentials: Arc<Credentials>,
}

impl ServiceContext {
    /// Build a context from explicit options layered over the process settings.
    pub fn new(app: GoogleApp, opts: ContextOptions) -> Result<Self, AuthError> {
        Self::with_settings(app, opts, &goog_core::settings())
    }

    pub fn with_settings(
        app: GoogleApp,
        opts: ContextOptions,
        settings: &Settings,
    ) -> Result<Self, AuthError> {
        let resolved = resolve(app, opts, settings)?;
        let key = load_key(&resolved.key)?;
        let credentials =
            Credentials::service_account(key, resolved.scopes, Some(resolved.account.clone()));

        tracing::info!(
            "Built Google API service for {} {} {}",
            app,
            resolved.version,
            resolved.account
        );

        Ok(Self {
            app,
            account: resolved.account,
            version: resolved.version,
            credentials: Arc::new(credentials),
        })
    }

    /// A context backed by a pre-issued bearer token.
    pub fn with_token(app: GoogleApp, account: &str, access_token: &str) -> Self {
        Self {
            app,
            account: account.to_string(),
            version: app.default_version().to_string(),
            credentials: Arc::new(Credentials::from_token(access_token)),
        }
    }

    /// The same account and credentials, addressed at another API.
    pub fn for_app(&self, app: GoogleApp, version: Option<String>) -> Self {
        Self {
            app,
            account: self.account.clone(),
            version: version.unwrap_or_else(|| app.default_version().to_string()),
            credentials: Arc::clone(&self.credentials),
        }
    }

    pub fn app(&self) -> GoogleApp {
        self.app
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub async fn access_token(&self) -> Result<String, AuthError> {
        self.credentials.access_token().await
    }

    /// `Bearer <token>` header value.
    pub async fn auth_header(&self) -> Result<String, AuthError> {
        Ok(format!("Bearer {}", self.access_token().await?))
    }
}

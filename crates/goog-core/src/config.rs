use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Environment variable prefix layered over the config file (`GOOG_ACCOUNT`, ...).
const ENV_PREFIX: &str = "GOOG";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Credential settings for one Google API (`gmail`, `drive`, `calendar`, `sheets`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the service account JSON key
    pub key: PathBuf,

    /// OAuth scopes requested for this API
    #[serde(default)]
    pub scopes: Vec<String>,

    /// API version, e.g. `v3` for Drive
    #[serde(default)]
    pub version: Option<String>,
}

/// Process-wide settings shared by every API facade.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Account impersonated by the service account
    #[serde(default)]
    pub account: Option<String>,

    /// Default download directory
    #[serde(default)]
    pub tmpdir: Option<PathBuf>,

    /// Shared drive name -> Drive folder ID
    #[serde(default)]
    pub rootid: BTreeMap<String, String>,

    /// Default sender for outgoing mail
    #[serde(default)]
    pub mail_from: Option<String>,

    /// Per-API credential settings, keyed by API name
    #[serde(default)]
    pub app_configs: BTreeMap<String, AppConfig>,
}

/// Partial settings update. Only `Some` fields are applied.
#[derive(Debug, Clone, Default)]
pub struct ConfigureOptions {
    pub account: Option<String>,
    pub tmpdir: Option<PathBuf>,
    pub rootid: Option<BTreeMap<String, String>>,
    pub mail_from: Option<String>,
    pub app_configs: Option<BTreeMap<String, AppConfig>>,
}

impl From<Settings> for ConfigureOptions {
    fn from(s: Settings) -> Self {
        Self {
            account: s.account,
            tmpdir: s.tmpdir,
            rootid: Some(s.rootid),
            mail_from: s.mail_from,
            app_configs: Some(s.app_configs),
        }
    }
}

impl ConfigureOptions {
    /// Scalar overrides from `GOOG_ACCOUNT`, `GOOG_TMPDIR` and `GOOG_MAIL_FROM`.
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(&format!("{}_{}", ENV_PREFIX, name)).filter(|v| !v.is_empty());
        Self {
            account: var("ACCOUNT"),
            tmpdir: var("TMPDIR").map(PathBuf::from),
            mail_from: var("MAIL_FROM"),
            ..Default::default()
        }
    }
}

impl Settings {
    /// Apply a partial update, leaving unset fields untouched.
    pub fn merge(&mut self, opts: ConfigureOptions) {
        if let Some(account) = opts.account {
            self.account = Some(account);
        }
        if let Some(tmpdir) = opts.tmpdir {
            self.tmpdir = Some(tmpdir);
        }
        if let Some(rootid) = opts.rootid {
            self.rootid = rootid;
        }
        if let Some(mail_from) = opts.mail_from {
            self.mail_from = Some(mail_from);
        }
        if let Some(app_configs) = opts.app_configs {
            self.app_configs = app_configs;
        }
    }

    /// Credential settings for an API, if configured.
    pub fn app_config(&self, app: &str) -> Option<&AppConfig> {
        self.app_configs.get(app)
    }

    /// Load settings from a TOML file, then apply `GOOG_*` environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let mut settings: Settings =
            toml::from_str(&contents).context("Failed to parse config file")?;

        settings.merge(ConfigureOptions::from_env(|key| std::env::var(key).ok()));

        Ok(settings)
    }

    /// Load settings and validate them.
    ///
    /// Returns an error if validation fails with critical errors; warnings are logged.
    pub fn load_validated(path: impl AsRef<Path>) -> Result<(Self, ValidationResult)> {
        let settings = Self::load(path)?;
        let validation = settings.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((settings, validation))
    }

    /// Default config file location: `<config_dir>/goog/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("goog");

        Ok(config_dir.join("config.toml"))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.account.is_none() {
            result.add_warning(
                "account",
                "No default account; every client must be given one explicitly",
            );
        }

        match &self.tmpdir {
            None => result.add_warning("tmpdir", "No tmpdir; downloads need an explicit directory"),
            Some(dir) if !dir.is_dir() => result.add_warning(
                "tmpdir",
                format!("Path is not a directory: {}", dir.display()),
            ),
            Some(_) => {}
        }

        for (name, id) in &self.rootid {
            if name.is_empty() || name.contains('/') {
                result.add_error("rootid", format!("Invalid shared drive name: {:?}", name));
            }
            if id.trim().is_empty() {
                result.add_error(format!("rootid.{}", name), "Drive ID must not be empty");
            }
        }

        for (app, cfg) in &self.app_configs {
            let field = format!("app_configs.{}", app);
            if cfg.key.as_os_str().is_empty() {
                result.add_error(format!("{}.key", field), "Key path must not be empty");
            } else if !cfg.key.exists() {
                result.add_warning(
                    format!("{}.key", field),
                    format!("Key file does not exist: {}", cfg.key.display()),
                );
            }
            if cfg.scopes.is_empty() {
                result.add_error(format!("{}.scopes", field), "At least one scope is required");
            }
        }

        result
    }
}

fn store() -> &'static RwLock<Settings> {
    static SETTINGS: OnceLock<RwLock<Settings>> = OnceLock::new();
    SETTINGS.get_or_init(|| RwLock::new(Settings::default()))
}

/// Configure module defaults.
///
/// Call once at startup; the values are shared by every client built afterwards.
pub fn configure(opts: ConfigureOptions) {
    store().write().merge(opts);
    tracing::debug!("Updated goog settings");
}

/// Snapshot of the current settings.
pub fn settings() -> Settings {
    store().read().clone()
}

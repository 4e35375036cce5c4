//! Client configuration persisted as YAML.
//!
//! # Storage layout
//!
//! ```text
//! ~/.choir/
//!   config.yaml       (mode 0600)
//!   cache/
//!     <account>.json  (attribute cache, see choir-sync)
//! ```
//!
//! # API pattern
//!
//! Every function has two forms:
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::AccountId;

pub const DEFAULT_TOKEN_ENV: &str = "CHOIR_TOKEN";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_REFRESH_WAIT_MS: u64 = 5_000;

/// Connection settings for one CHOIR site and the signed-in participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoirConfig {
    /// Base URL of the CHOIR API, e.g. `https://choir.example.org/api`.
    pub server_url: String,
    pub site_id: String,
    pub account_id: AccountId,
    /// Environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// How long the CLI waits for a background refresh before giving up.
    #[serde(default = "default_refresh_wait_ms")]
    pub refresh_wait_ms: u64,
}

impl ChoirConfig {
    pub fn new(
        server_url: impl Into<String>,
        site_id: impl Into<String>,
        account_id: AccountId,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            site_id: site_id.into(),
            account_id,
            token_env: default_token_env(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            refresh_wait_ms: DEFAULT_REFRESH_WAIT_MS,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn refresh_wait(&self) -> Duration {
        Duration::from_millis(self.refresh_wait_ms)
    }

    /// `<server_url>/sites/<site_id>/participant` with no duplicate slash.
    pub fn participant_url(&self) -> String {
        format!(
            "{}/sites/{}/participant",
            self.server_url.trim_end_matches('/'),
            self.site_id
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "server_url must start with http:// or https://, got '{}'",
                self.server_url
            )));
        }
        if self.site_id.trim().is_empty() {
            return Err(ConfigError::Invalid("site_id must not be empty".to_string()));
        }
        if self.account_id.as_str().trim().is_empty() {
            return Err(ConfigError::Invalid("account_id must not be empty".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_refresh_wait_ms() -> u64 {
    DEFAULT_REFRESH_WAIT_MS
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<home>/.choir/`
pub fn choir_root(home: &Path) -> PathBuf {
    home.join(".choir")
}

/// `<home>/.choir/config.yaml`
pub fn config_path_at(home: &Path) -> PathBuf {
    choir_root(home).join("config.yaml")
}

/// `<home>/.choir/cache/`
pub fn cache_dir_at(home: &Path) -> PathBuf {
    choir_root(home).join("cache")
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load and validate `<home>/.choir/config.yaml`.
///
/// Returns `ConfigError::NotFound` if absent, `ConfigError::Parse` (with
/// path) if malformed, `ConfigError::Invalid` if it fails validation.
pub fn load_at(home: &Path) -> Result<ChoirConfig, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Err(ConfigError::NotFound { path });
    }
    let contents = std::fs::read_to_string(&path)?;
    let config: ChoirConfig =
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })?;
    config.validate()?;
    Ok(config)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<ChoirConfig, ConfigError> {
    load_at(&home()?)
}

/// Validate and atomically save the config.
///
/// Write flow: serialize → `config.yaml.tmp` → `chmod 0600` → `rename`.
pub fn save_at(home: &Path, config: &ChoirConfig) -> Result<PathBuf, ConfigError> {
    config.validate()?;
    let root = choir_root(home);
    if !root.exists() {
        std::fs::create_dir_all(&root)?;
        set_dir_permissions(&root)?;
    }
    let path = config_path_at(home);
    let tmp_path = path.with_file_name("config.yaml.tmp");

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path)?;
    Ok(path)
}

/// `save_at` convenience wrapper.
pub fn save(config: &ChoirConfig) -> Result<PathBuf, ConfigError> {
    save_at(&home()?, config)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

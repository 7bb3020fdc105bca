//! Shared configuration for the stockpile CLI and TUI.
//!
//! TOML settings merged with `STOCKPILE_*` environment variables,
//! translation to `stockpile_core::ClientConfig`, and the on-disk session
//! cookie the CLI carries between invocations.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use stockpile_core::{ClientConfig, QueryDefaults, TlsVerification};

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const ENV_PREFIX: &str = "STOCKPILE_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("malformed session file: {0}")]
    Session(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Overall request timeout. Unset keeps the transport default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Skip TLS certificate verification.
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate (PEM).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default)]
    pub query: QuerySettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: None,
            insecure: false,
            ca_cert: None,
            query: QuerySettings::default(),
        }
    }
}

/// Read-cache tuning, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuerySettings {
    #[serde(default)]
    pub stale_time_ms: u64,

    #[serde(default = "default_retry")]
    pub retry: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            stale_time_ms: 0,
            retry: default_retry(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}
fn default_retry() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    1000
}

impl Config {
    /// Validate and translate into the core's runtime configuration.
    pub fn to_client_config(&self) -> Result<ClientConfig, ConfigError> {
        let url: url::Url = self
            .api_url
            .trim()
            .parse()
            .map_err(|e| ConfigError::Validation {
                field: "api_url".into(),
                reason: format!("invalid URL '{}': {e}", self.api_url),
            })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation {
                field: "api_url".into(),
                reason: format!("expected an http or https URL, got '{}'", url.scheme()),
            });
        }

        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Validation {
                field: "timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }

        let tls = if self.insecure {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsVerification::CustomCa(ca_path.clone())
        } else {
            TlsVerification::SystemDefaults
        };

        Ok(ClientConfig {
            url,
            tls,
            timeout: self.timeout_secs.map(Duration::from_secs),
            query: QueryDefaults {
                stale_time: Duration::from_millis(self.query.stale_time_ms),
                retry: self.query.retry,
                retry_delay: Duration::from_millis(self.query.retry_delay_ms),
            },
        })
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "stockpile", "stockpile")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || fallback_dir(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory for state written at runtime (session file, logs).
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || fallback_dir(".local/share"),
        |dirs| dirs.data_local_dir().to_path_buf(),
    )
}

fn fallback_dir(base: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(base);
    p.push("stockpile");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file path + environment. A missing file just
/// means defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Session persistence ─────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize)]
struct StoredSession {
    api_url: String,
    cookie: String,
}

/// The session cookie kept between CLI invocations.
///
/// Tied to the API URL it was issued by; a session saved for one backend
/// is never sent to another.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `session.toml` in the platform data directory.
    pub fn default_location() -> Self {
        Self::new(data_dir().join("session.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored cookie header for `api_url`, if any.
    pub fn load(&self, api_url: &str) -> Result<Option<String>, ConfigError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredSession = toml::from_str(&raw)?;

        if normalize_url(&stored.api_url) != normalize_url(api_url) {
            debug!(saved_for = %stored.api_url, "ignoring session for another API");
            return Ok(None);
        }
        Ok(Some(stored.cookie).filter(|c| !c.trim().is_empty()))
    }

    pub fn save(&self, api_url: &str, cookie: &str) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored = StoredSession {
            api_url: normalize_url(api_url).to_owned(),
            cookie: cookie.to_owned(),
        };
        std::fs::write(&self.path, toml::to_string_pretty(&stored)?)?;
        restrict_permissions(&self.path)?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Remove the stored session. Missing file is not an error.
    pub fn clear(&self) -> Result<(), ConfigError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn normalize_url(url: &str) -> &str {
    url.trim().trim_end_matches('/')
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

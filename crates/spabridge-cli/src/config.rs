//! Configuration – reads/writes `~/.spabridge/config.toml`.

use serde::{Deserialize, Serialize};
use spabridge_gateway::CloudAddress;
use spabridge_gateway::auth::DEFAULT_TOKEN_URL;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Persisted settings stored in `~/.spabridge/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Device cloud scheme (`http` or `https`).
    #[serde(default = "default_cloud_scheme")]
    pub cloud_scheme: String,

    #[serde(default = "default_cloud_host")]
    pub cloud_host: String,

    /// Device cloud port.  Empty means the scheme's default port.
    #[serde(default = "default_cloud_port")]
    pub cloud_port: String,

    /// Authorization server token endpoint.
    #[serde(default = "default_token_url")]
    pub token_url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_id: String,

    /// Client secret (stored as plain text; the file is written 0o600).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_secret: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("cloud_scheme", &self.cloud_scheme)
            .field("cloud_host", &self.cloud_host)
            .field("cloud_port", &self.cloud_port)
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                if self.client_secret.is_empty() { &"<not set>" } else { &"<redacted>" },
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_cloud_scheme() -> String {
    "http".to_string()
}
fn default_cloud_host() -> String {
    "localhost".to_string()
}
fn default_cloud_port() -> String {
    "3434".to_string()
}
fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}
fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cloud_scheme: default_cloud_scheme(),
            cloud_host: default_cloud_host(),
            cloud_port: default_cloud_port(),
            token_url: default_token_url(),
            client_id: String::new(),
            client_secret: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    pub fn cloud_address(&self) -> CloudAddress {
        CloudAddress::new(&self.cloud_scheme, &self.cloud_host, &self.cloud_port)
    }

    /// `None` disables the timeout.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

/// Return the path to `~/.spabridge/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".spabridge").join("config.toml")
}

/// Effective configuration: the file if present, defaults otherwise, then
/// `SPABRIDGE_*` overrides.
pub fn load() -> Result<Config, ConfigError> {
    load_or_default(&config_path())
}

pub(crate) fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    let mut cfg = load_from(path)?.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Load the file at `path` as-is.  Returns `None` if it does not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(cfg))
}

/// Apply `SPABRIDGE_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `SPABRIDGE_CLOUD_SCHEME` | `cloud_scheme` |
/// | `SPABRIDGE_CLOUD_HOST` | `cloud_host` |
/// | `SPABRIDGE_CLOUD_PORT` | `cloud_port` |
/// | `SPABRIDGE_TOKEN_URL` | `token_url` |
/// | `SPABRIDGE_CLIENT_ID` | `client_id` |
/// | `SPABRIDGE_CLIENT_SECRET` | `client_secret` |
/// | `SPABRIDGE_REQUEST_TIMEOUT_SECS` | `request_timeout_secs` |
pub fn apply_env_overrides(cfg: &mut Config) {
    let strings = [
        ("SPABRIDGE_CLOUD_SCHEME", &mut cfg.cloud_scheme),
        ("SPABRIDGE_CLOUD_HOST", &mut cfg.cloud_host),
        ("SPABRIDGE_CLOUD_PORT", &mut cfg.cloud_port),
        ("SPABRIDGE_TOKEN_URL", &mut cfg.token_url),
        ("SPABRIDGE_CLIENT_ID", &mut cfg.client_id),
        ("SPABRIDGE_CLIENT_SECRET", &mut cfg.client_secret),
    ];
    for (var, field) in strings {
        if let Ok(v) = std::env::var(var) {
            *field = v;
        }
    }
    if let Ok(v) = std::env::var("SPABRIDGE_REQUEST_TIMEOUT_SECS")
        && let Ok(secs) = v.parse::<u64>()
    {
        cfg.request_timeout_secs = secs;
    }
}

/// Save the config to disk, creating `~/.spabridge/` if necessary.
pub fn save(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_to(cfg, &path)?;
    Ok(path)
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
        // Owner-only directory (rwx------) on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700)).map_err(write_err)?;
        }
    }
    let raw = toml::to_string_pretty(cfg)?;
    // Owner-only file (rw-------) on Unix.
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(write_err)?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(write_err)?;
    Ok(())
}

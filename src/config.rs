//! Top-level application configuration.
//!
//! Configuration is stored in `config.yaml` under the platform config
//! directory (or the file named by `QVAULT_CONFIG`) and includes:
//! - The catalog API base URL
//! - The bearer token for authenticated actions
//! - Session tuning: page size, search debounce, request timeout
//! - Where downloaded papers are saved

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{QvaultError, Result};

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "QVAULT_CONFIG";
/// Environment variable overriding `base_url`
pub const BASE_URL_ENV: &str = "QVAULT_BASE_URL";
/// Environment variable overriding `auth.token`
pub const TOKEN_ENV: &str = "QVAULT_TOKEN";

/// Keys accepted by `config get` / `config set`
pub const VALID_KEYS: &[&str] = &[
    "base_url",
    "auth.token",
    "page_size",
    "debounce_ms",
    "request_timeout",
    "download_dir",
];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Catalog API root, e.g. `https://qvault.example.edu/api`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Authentication token
    #[serde(default)]
    pub auth: AuthConfig,

    /// Number of papers the backend returns per full page (default: 20).
    /// Must equal the backend's page size: it is not sent with requests, a
    /// page shorter than this is taken as the last one.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Quiet period before a typed search is sent, in milliseconds (default: 400)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Per-request timeout in seconds, at least 1 (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Directory downloads are written to (default: current directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_page_size() -> usize {
    20
}

fn default_debounce_ms() -> u64 {
    400
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            auth: AuthConfig::default(),
            page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
            request_timeout: default_request_timeout(),
            download_dir: None,
        }
    }
}

/// Authentication configuration
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        if let Ok(path) = env::var(CONFIG_ENV)
            && !path.is_empty()
        {
            return PathBuf::from(path);
        }

        directories::ProjectDirs::from("edu", "qvault", "qvault")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
            .unwrap_or_else(|| PathBuf::from(".qvault").join("config.yaml"))
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file, or return default if not found
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            QvaultError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                QvaultError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create directory for config at {}: {}",
                        parent.display(),
                        e
                    ),
                ))
            })?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content).map_err(|e| {
            QvaultError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write config at {}: {}", path.display(), e),
            ))
        })?;

        // The file may hold a token: owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, permissions)?;
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(QvaultError::Config(
                "page_size must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout == 0 {
            return Err(QvaultError::Config(
                "request_timeout must be at least one second".to_string(),
            ));
        }
        url::Url::parse(&self.base_url).map_err(|e| {
            QvaultError::Config(format!("invalid base_url '{}': {}", self.base_url, e))
        })?;
        Ok(())
    }

    /// Get the API base URL from environment variable or config
    pub fn base_url(&self) -> String {
        if let Ok(url) = env::var(BASE_URL_ENV)
            && !url.is_empty()
        {
            return url;
        }
        self.base_url.clone()
    }

    /// Get the bearer token from environment variable or config
    pub fn token(&self) -> Option<String> {
        // First check environment variable
        if let Ok(token) = env::var(TOKEN_ENV)
            && !token.is_empty()
        {
            return Some(token);
        }

        // Fall back to config file
        self.auth.token.clone().filter(|t| !t.is_empty())
    }

    /// Debounce window for typed search input
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Timeout applied to every catalog request
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Directory downloads are saved to
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Read a single value by dotted key
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "base_url" => Some(self.base_url.clone()),
            "auth.token" => self.auth.token.clone(),
            "page_size" => Some(self.page_size.to_string()),
            "debounce_ms" => Some(self.debounce_ms.to_string()),
            "request_timeout" => Some(self.request_timeout.to_string()),
            "download_dir" => self
                .download_dir
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Set a single value by dotted key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "base_url" => {
                url::Url::parse(value).map_err(|e| {
                    QvaultError::Config(format!("invalid base_url '{value}': {e}"))
                })?;
                self.base_url = value.trim_end_matches('/').to_string();
            }
            "auth.token" => self.auth.token = Some(value.to_string()),
            "page_size" => {
                let size = parse_number(key, value)?;
                if size == 0 {
                    return Err(QvaultError::Config(
                        "page_size must be greater than zero".to_string(),
                    ));
                }
                self.page_size = size as usize;
            }
            "debounce_ms" => self.debounce_ms = parse_number(key, value)?,
            "request_timeout" => {
                let seconds = parse_number(key, value)?;
                if seconds == 0 {
                    return Err(QvaultError::Config(
                        "request_timeout must be at least one second".to_string(),
                    ));
                }
                self.request_timeout = seconds;
            }
            "download_dir" => self.download_dir = Some(PathBuf::from(value)),
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| QvaultError::Config(format!("'{key}' expects a number, got '{value}'")))
}

fn unknown_key(key: &str) -> QvaultError {
    QvaultError::Config(format!(
        "unknown config key '{}'. Valid keys: {}",
        key,
        VALID_KEYS.join(", ")
    ))
}

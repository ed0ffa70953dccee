//! Configuration management for Headliner.
//!
//! Configuration is read from `~/.config/headliner/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::domain::IdentityKey;

pub const API_KEY_ENV: &str = "HEADLINER_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://newsdata.io/api/1/latest";

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub retry: RetryConfig,
    pub favorites: FavoritesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    /// Sent comma-joined as the `language` query parameter.
    pub languages: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            languages: default_languages(),
            timeout_secs: 15,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FavoritesConfig {
    pub identity: IdentityKey,
    /// Defaults to `<data dir>/headliner/favorites.db`.
    pub db_path: Option<PathBuf>,
}

/// Language code of the user's locale, e.g. `en` for `en_US.UTF-8`.
fn default_languages() -> Vec<String> {
    let lang = std::env::var("LC_ALL")
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| std::env::var("LANG").ok());

    vec![lang
        .as_deref()
        .and_then(language_code)
        .unwrap_or_else(|| "en".to_string())]
}

fn language_code(locale: &str) -> Option<String> {
    let code = locale
        .split(['.', '@'])
        .next()?
        .split(['_', '-'])
        .next()?
        .to_ascii_lowercase();

    if code.is_empty() || code == "c" || code == "posix" {
        None
    } else {
        Some(code)
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default().with_env_overrides());
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                self.api.api_key = key;
            }
        }
        self
    }

    /// Get the default config file path: `~/.config/headliner/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("headliner").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> String {
        r##"# Headliner Configuration
#
# The API key can also be supplied through the HEADLINER_API_KEY
# environment variable, which takes precedence over this file.

[api]
base_url = "https://newsdata.io/api/1/latest"
api_key = ""
# Language codes sent with every request. Defaults to the locale language.
# languages = ["en"]
timeout_secs = 15

[retry]
# Retries apply to server errors (HTTP 500) and network failures only.
max_retries = 2
base_delay_ms = 250

[favorites]
# How favorites are deduplicated: "title" or "link"
identity = "title"
# db_path = "/path/to/favorites.db"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Could not determine data directory")]
    NoDataDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid API base URL {url}: {source}")]
    BaseUrl {
        url: String,
        source: url::ParseError,
    },
}

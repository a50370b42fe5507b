//! Configuration management for the TeAdopto client.
//!
//! Loads configuration from `${TEADOPTO_HOME}/config.toml` with sensible defaults.
//! Environment variables win over the file, the file wins over built-in defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Environment variable overriding the API base URL.
pub const API_BASE_URL_ENV: &str = "TEADOPTO_API_BASE_URL";
/// Environment variable overriding the admin console URL.
pub const ADMIN_URL_ENV: &str = "TEADOPTO_ADMIN_URL";

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for TeAdopto configuration and data directories.
    //!
    //! TEADOPTO_HOME resolution order:
    //! 1. TEADOPTO_HOME environment variable (if set)
    //! 2. ~/.config/teadopto (default)
    //! 3. ./.teadopto when no home directory can be determined

    use std::path::PathBuf;

    /// Returns the TeAdopto home directory.
    pub fn teadopto_home() -> PathBuf {
        if let Ok(home) = std::env::var("TEADOPTO_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".teadopto"),
            |h| h.join(".config").join("teadopto"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        teadopto_home().join("config.toml")
    }

    /// Returns the path to the persisted session file.
    pub fn session_path() -> PathBuf {
        teadopto_home().join("session.json")
    }

    /// Returns the directory holding log files.
    pub fn logs_dir() -> PathBuf {
        teadopto_home().join("logs")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// REST API root (defaults to the local development backend)
    pub api_base_url: Option<String>,

    /// Backend admin console URL
    pub admin_url: Option<String>,

    /// Timeout for each backend request in seconds (0 disables)
    pub request_timeout_secs: u32,
}

impl Config {
    pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api/";
    pub const DEFAULT_ADMIN_URL: &str = "http://127.0.0.1:8000/admin";
    const DEFAULT_REQUEST_TIMEOUT_SECS: u32 = 30;

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Resolves the API base URL with precedence: env > config > default.
    ///
    /// The returned URL always ends with `/` so relative paths such as
    /// `pets/` join underneath it instead of replacing its last segment.
    ///
    /// # Errors
    /// Returns an error if the chosen value is not a valid URL.
    pub fn api_base_url(&self) -> Result<Url> {
        let raw = resolve_url(
            self.api_base_url.as_deref(),
            API_BASE_URL_ENV,
            Self::DEFAULT_API_BASE_URL,
            "API base",
        )?;
        let with_slash = if raw.ends_with('/') {
            raw
        } else {
            format!("{raw}/")
        };
        Url::parse(&with_slash).with_context(|| format!("Invalid API base URL: {with_slash}"))
    }

    /// Resolves the admin console URL with precedence: env > config > default.
    ///
    /// # Errors
    /// Returns an error if the chosen value is not a valid URL.
    pub fn admin_url(&self) -> Result<String> {
        resolve_url(
            self.admin_url.as_deref(),
            ADMIN_URL_ENV,
            Self::DEFAULT_ADMIN_URL,
            "admin",
        )
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(u64::from(self.request_timeout_secs)))
        }
    }

    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            admin_url: None,
            request_timeout_secs: Self::DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Resolves a URL with precedence: env > config > default.
///
/// Empty or whitespace-only values are treated as unset.
fn resolve_url(
    config_value: Option<&str>,
    env_var: &str,
    default_url: &str,
    label: &str,
) -> Result<String> {
    let from_env = std::env::var(env_var).ok();
    let chosen = [from_env.as_deref(), config_value]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty());

    match chosen {
        Some(value) => {
            Url::parse(value).with_context(|| format!("Invalid {label} URL: {value}"))?;
            Ok(value.to_string())
        }
        None => Ok(default_url.to_string()),
    }
}

//! Configuration management for PromiseTasks
//!
//! This module handles loading, parsing, and validation of configuration files.

use crate::constants::{
    APP_NAME, CONFIG_FILE_NAME, CONFIG_GENERATED, DATABASE_FILE_NAME, DEFAULT_API_BASE_URL, DEFAULT_CLIENT_ID_ENV,
    DEFAULT_CLIENT_SECRET_ENV, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TOKEN_URL, MAX_AUTO_SYNC_INTERVAL_MINUTES,
    XDG_CONFIG_FILE_NAME,
};
use crate::credentials::OAuthConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub google: GoogleConfig,
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Google API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// Environment variable holding the OAuth client id
    pub client_id_env: String,
    /// Environment variable holding the OAuth client secret
    pub client_secret_env: String,
    pub token_url: String,
    pub api_base_url: String,
    /// Timeout for each remote call, in seconds
    pub request_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite connection URL. Defaults to a file in the user data directory.
    pub url: Option<String>,
}

/// Sync configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// Auto-sync interval in minutes (0 = disabled, run once and exit)
    pub auto_sync_interval_minutes: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Minimum level: "error", "warn", "info", "debug" or "trace"
    pub level: String,
    /// Also write logs to a file in the user data directory
    pub file: bool,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id_env: DEFAULT_CLIENT_ID_ENV.to_string(),
            client_secret_env: DEFAULT_CLIENT_SECRET_ENV.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            file: false,
        }
    }
}

impl GoogleConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Build the OAuth client settings from the configured environment variables.
    pub fn oauth_config(&self) -> Result<OAuthConfig> {
        let client_id = std::env::var(&self.client_id_env)
            .with_context(|| format!("Environment variable '{}' not set", self.client_id_env))?;
        let client_secret = std::env::var(&self.client_secret_env)
            .with_context(|| format!("Environment variable '{}' not set", self.client_secret_env))?;

        Ok(OAuthConfig {
            client_id,
            client_secret,
            token_url: self.token_url.clone(),
        })
    }
}

impl DatabaseConfig {
    /// The configured URL, or a SQLite file in the user data directory.
    pub fn resolved_url(&self) -> Result<String> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }

        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?
            .join(APP_NAME);
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Ok(format!("sqlite://{}?mode=rwc", data_dir.join(DATABASE_FILE_NAME).display()))
    }
}

impl SyncConfig {
    /// Interval between automatic passes, if enabled.
    pub fn auto_sync_interval(&self) -> Option<Duration> {
        match self.auto_sync_interval_minutes {
            0 => None,
            minutes => Some(Duration::from_secs(minutes * 60)),
        }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> Result<log::LevelFilter> {
        log::LevelFilter::from_str(&self.level).map_err(|_| anyhow::anyhow!("Invalid logging level '{}'", self.level))
    }
}

impl Config {
    /// Load configuration from file or return defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file()?;

        if let Some(path) = config_path {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in order of precedence
    fn find_config_file() -> Result<Option<PathBuf>> {
        // 1. Check current directory
        let current_dir_config = PathBuf::from(CONFIG_FILE_NAME);
        if current_dir_config.exists() {
            return Ok(Some(current_dir_config));
        }

        // 2. Check XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join(APP_NAME).join(XDG_CONFIG_FILE_NAME);
            if xdg_config.exists() {
                return Ok(Some(xdg_config));
            }
        }

        Ok(None)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.sync.auto_sync_interval_minutes > MAX_AUTO_SYNC_INTERVAL_MINUTES {
            anyhow::bail!(
                "auto_sync_interval_minutes cannot exceed {} (24 hours)",
                MAX_AUTO_SYNC_INTERVAL_MINUTES
            );
        }

        for (name, url) in [
            ("api_base_url", &self.google.api_base_url),
            ("token_url", &self.google.token_url),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                anyhow::bail!("{} must be an http(s) URL, got '{}'", name, url);
            }
        }

        if self.google.client_id_env.is_empty() || self.google.client_secret_env.is_empty() {
            anyhow::bail!("client_id_env and client_secret_env cannot be empty");
        }

        if self.google.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if let Some(url) = &self.database.url {
            if !url.starts_with("sqlite:") {
                anyhow::bail!("database url must be a sqlite URL, got '{}'", url);
            }
        }

        self.logging.level_filter()?;

        Ok(())
    }

    /// Generate default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let toml_content = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

        let header = format!(
            "# PromiseTasks Configuration File\n# Generated on {}\n\n",
            chrono::Local::now().format("%Y-%m-%d")
        );

        let full_content = header + &toml_content;

        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(&path, full_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        println!("{}: {}", CONFIG_GENERATED, path.as_ref().display());
        Ok(())
    }

    /// Get the XDG config directory path
    pub fn get_xdg_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
            .map(|dir| dir.join(APP_NAME))
    }

    /// Get the default config file path
    pub fn get_default_config_path() -> Result<PathBuf> {
        Ok(Self::get_xdg_config_dir()?.join(XDG_CONFIG_FILE_NAME))
    }
}

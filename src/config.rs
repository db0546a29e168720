//! Configuration module for sixchan.

use serde::Deserialize;
use std::path::Path;

use crate::{ChanError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/sixchan.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Uploaded image configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Root directory under which `uploads/<resource>/` directories live.
    #[serde(default = "default_media_root")]
    pub root: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_media_root() -> String {
    "data/media".to_string()
}

fn default_max_upload_size() -> u64 {
    10
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: default_media_root(),
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/sixchan.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Web API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// JWT secret key (must be set).
    #[serde(default)]
    pub jwt_secret: String,
    /// Access token expiry in seconds.
    #[serde(default = "default_jwt_access_expiry")]
    pub jwt_access_token_expiry_secs: u64,
}

fn default_jwt_access_expiry() -> u64 {
    86400 // 1 day
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            cors_origins: vec![],
            jwt_secret: String::new(),
            jwt_access_token_expiry_secs: default_jwt_access_expiry(),
        }
    }
}

/// Bootstrap administrator account.
///
/// When all three fields are set, the account is created at startup if no
/// user with that username exists yet.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminConfig {
    /// Admin username.
    #[serde(default)]
    pub username: Option<String>,
    /// Admin email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Admin password (plain text, hashed on creation).
    #[serde(default)]
    pub password: Option<String>,
}

impl AdminConfig {
    /// Return `(username, email, password)` if the account is fully configured.
    pub fn credentials(&self) -> Option<(&str, &str, &str)> {
        match (&self.username, &self.email, &self.password) {
            (Some(u), Some(e), Some(p)) => Some((u, e, p)),
            _ => None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Media configuration.
    #[serde(default)]
    pub media: MediaConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Bootstrap administrator.
    #[serde(default)]
    pub admin: AdminConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ChanError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ChanError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `SIXCHAN_JWT_SECRET`: Override the JWT secret key
    /// - `SIXCHAN_DATABASE_PATH`: Override the database path
    pub fn apply_env_overrides(&mut self) {
        if let Ok(jwt_secret) = std::env::var("SIXCHAN_JWT_SECRET") {
            if !jwt_secret.is_empty() {
                self.web.jwt_secret = jwt_secret;
            }
        }
        if let Ok(path) = std::env::var("SIXCHAN_DATABASE_PATH") {
            if !path.is_empty() {
                self.database.path = path;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if the JWT secret is not set or the upload limit is zero.
    pub fn validate(&self) -> Result<()> {
        if self.web.jwt_secret.is_empty() {
            return Err(ChanError::Config(
                "jwt_secret is not set. \
                 Set it in config.toml or via SIXCHAN_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }
        if self.media.max_upload_size_mb == 0 {
            return Err(ChanError::Config(
                "media.max_upload_size_mb must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

//! Configuration file
//!
//! ```json
//! {
//!   "data_dir": "./couloir-data",
//!   "schema_version": 2,
//!   "transport": "auto",
//!   "bulletin_path": "./bulletin.geojson",
//!   "log_level": "info",
//!   "default_users": [{"username": "AK", "password_hash": "...", "role": "admin"}],
//!   "seed_on_init": true
//! }
//! ```
//!
//! Only `data_dir` is required.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::User;
use crate::bus::TransportChoice;
use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::store::LATEST_SCHEMA_VERSION;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// Schema version the store is opened at (default: latest)
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Change notification transport (default: auto)
    #[serde(default)]
    pub transport: TransportChoice,

    /// Already-fetched bulletin document to classify against
    #[serde(default)]
    pub bulletin_path: Option<String>,

    /// Minimum log severity (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Users inserted on init when their username is free
    #[serde(default)]
    pub default_users: Vec<User>,

    /// Insert the reference couloirs into an empty store on init
    #[serde(default = "default_seed_on_init")]
    pub seed_on_init: bool,
}

fn default_schema_version() -> u32 {
    LATEST_SCHEMA_VERSION
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_seed_on_init() -> bool {
    true
}

impl Config {
    /// Loads and validates the configuration file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Loads the configuration file and applies `log_level` before the
    /// first event is logged.
    pub fn load_and_apply(path: &Path) -> ConfigResult<Self> {
        let config = Self::load(path)?;
        config.apply_logging()?;

        let path_str = path.display().to_string();
        log_event_with_fields(
            Event::ConfigLoaded,
            &[("data_dir", config.data_dir.as_str()), ("path", path_str.as_str())],
        );
        Ok(config)
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(invalid("data_dir", "must not be empty"));
        }

        if self.schema_version == 0 || self.schema_version > LATEST_SCHEMA_VERSION {
            return Err(invalid(
                "schema_version",
                format!("{} (supported: 1..={})", self.schema_version, LATEST_SCHEMA_VERSION),
            ));
        }

        self.log_severity()?;

        for user in &self.default_users {
            if user.username.is_empty() {
                return Err(invalid("default_users", "username must not be empty"));
            }
            let is_sha256_hex = user.password_hash.len() == 64
                && user.password_hash.chars().all(|c| c.is_ascii_hexdigit());
            if !is_sha256_hex {
                return Err(invalid(
                    "default_users",
                    format!("password_hash of {} is not a hex SHA-256 digest", user.username),
                ));
            }
        }

        Ok(())
    }

    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    pub fn bulletin_path(&self) -> Option<&Path> {
        self.bulletin_path.as_deref().map(Path::new)
    }

    pub fn log_severity(&self) -> ConfigResult<Severity> {
        self.log_level
            .parse()
            .map_err(|e: String| invalid("log_level", e))
    }

    /// Applies `log_level` to the process-wide logger.
    pub fn apply_logging(&self) -> ConfigResult<()> {
        Logger::set_min_severity(self.log_severity()?);
        Ok(())
    }
}

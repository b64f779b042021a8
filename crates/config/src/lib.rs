//! Vigil Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use vigil_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[[pipeline]]\nprocessor = \"Exporter\"").unwrap();
//! assert_eq!(config.pipeline.len(), 1);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [global]
//! channel_capacity = 10000
//!
//! [log]
//! level = "info"
//!
//! [[pipeline]]
//! processor = "EventReader"
//! handler = "Flattener"
//! out = "flat RecordChan"
//! path = "-"
//!
//! [[pipeline]]
//! processor = "Exporter"
//! in = "flat RecordChan"
//! export = "stdout"
//! shape = "flat"
//! buffer = 100
//! ```

mod error;
mod global;
mod logging;
mod stage;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use global::{DEFAULT_CHANNEL_CAPACITY, GlobalConfig};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use stage::{StageConfig, StageOptions, parse_options};

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global settings
    pub global: GlobalConfig,

    /// Logging configuration
    pub log: LogConfig,

    /// Ordered pipeline stages
    pub pipeline: Vec<StageConfig>,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML,
    /// or fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Capacity for channels first created by `stage`
    pub fn capacity_for(&self, stage: &StageConfig) -> usize {
        stage.capacity.unwrap_or(self.global.channel_capacity)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

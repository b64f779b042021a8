//! Exporter stage options
//!
//! Read from the stage's `[[pipeline]]` table:
//!
//! ```toml
//! [[pipeline]]
//! processor = "Exporter"
//! in = "flat RecordChan"
//! export = "syslog"        # stdout | syslog | file
//! shape = "structured"     # flat | structured | ecs
//! buffer = 100             # flush once more than this many are buffered
//! host = "siem.local"
//! port = 514
//! proto = "tcp"            # udp | tcp
//! tag = "vigil"
//! facility = "daemon"
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use serde::de::{self, Deserializer};
use vigil_config::{StageOptions, parse_options};
use vigil_sinks::{Facility, Protocol, SyslogConfig};
use vigil_transform::{DEFAULT_VERSION, Shape};

use crate::error::ExporterError;

/// Default output file for `export = "file"`
pub const DEFAULT_PATH: &str = "./export.out";

/// Sink selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportTarget {
    #[default]
    Stdout,
    Syslog,
    File,
}

impl fmt::Display for ExportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stdout => "stdout",
            Self::Syslog => "syslog",
            Self::File => "file",
        })
    }
}

fn from_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(de::Error::custom)
}

/// Exporter configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Sink to deliver to
    pub export: ExportTarget,

    /// Output shape
    #[serde(deserialize_with = "from_str")]
    pub shape: Shape,

    /// Flush threshold: a flush happens once the buffer holds more than this
    pub buffer: usize,

    /// Output file (file sink)
    pub path: PathBuf,

    /// Syslog host
    pub host: String,

    /// Syslog port
    pub port: u16,

    /// Syslog transport
    #[serde(deserialize_with = "from_str")]
    pub proto: Protocol,

    /// Syslog tag
    pub tag: String,

    /// Syslog facility
    #[serde(deserialize_with = "from_str")]
    pub facility: Facility,

    /// Output format version written on every event
    pub version: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        let syslog = SyslogConfig::default();
        Self {
            export: ExportTarget::Stdout,
            shape: Shape::Flat,
            buffer: 0,
            path: PathBuf::from(DEFAULT_PATH),
            host: syslog.host,
            port: syslog.port,
            proto: syslog.protocol,
            tag: syslog.tag,
            facility: syslog.facility,
            version: DEFAULT_VERSION.to_string(),
        }
    }
}

impl ExportConfig {
    /// Parse and validate stage options
    pub fn from_options(options: &StageOptions) -> Result<Self, ExporterError> {
        let config: Self = parse_options(options)?;
        config.validate()?;
        Ok(config)
    }

    /// Check option combinations
    pub fn validate(&self) -> Result<(), ExporterError> {
        match self.export {
            ExportTarget::File if self.path.as_os_str().is_empty() => {
                Err(ExporterError::config("export = \"file\" requires a path"))
            }
            ExportTarget::Syslog if self.host.trim().is_empty() => {
                Err(ExporterError::config("export = \"syslog\" requires a host"))
            }
            ExportTarget::Syslog if self.port == 0 => {
                Err(ExporterError::config("export = \"syslog\" requires a non-zero port"))
            }
            _ => Ok(()),
        }
    }

    /// Syslog settings for the sink
    pub fn syslog(&self) -> SyslogConfig {
        SyslogConfig {
            host: self.host.clone(),
            port: self.port,
            protocol: self.proto,
            tag: self.tag.clone(),
            facility: self.facility,
        }
    }
}

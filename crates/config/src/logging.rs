//! Logging configuration
//!
//! Controls how vigil reports on itself. Exported telemetry never goes
//! through this path; the stdout sink writes events directly.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Log level
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing level filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console output (default)
    #[default]
    Console,
    /// JSON structured logging
    Json,
}

/// Log output destination
///
/// Diagnostics default to stderr so they never interleave with events
/// exported by the stdout sink.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    #[default]
    Stderr,
}

/// Logging configuration
///
/// # Example
///
/// ```toml
/// [log]
/// level = "info"
/// format = "console"
/// output = "stderr"
///
/// [log.targets]
/// vigil_exporter = "debug"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Base log level
    /// Default: info
    pub level: LogLevel,

    /// Output format (console, json)
    /// Default: console
    pub format: LogFormat,

    /// Output destination (stdout, stderr)
    /// Default: stderr
    pub output: LogOutput,

    /// Per-target level overrides, keyed by crate or module path
    pub targets: BTreeMap<String, LogLevel>,
}

impl LogConfig {
    /// Build an `EnvFilter`-compatible directive string
    ///
    /// `base` overrides the configured level (the CLI flag wins over the file).
    pub fn directive(&self, base: Option<&str>) -> String {
        let mut directive = base.unwrap_or(self.level.as_str()).to_string();
        for (target, level) in &self.targets {
            directive.push(',');
            directive.push_str(target);
            directive.push('=');
            directive.push_str(level.as_str());
        }
        directive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Console);
        assert_eq!(config.output, LogOutput::Stderr);
        assert!(config.targets.is_empty());
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
level = "debug"
format = "json"
output = "stdout"

[targets]
vigil_exporter = "trace"
vigil_sinks = "warn"
"#;
        let config: LogConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.output, LogOutput::Stdout);
        assert_eq!(config.targets.get("vigil_sinks"), Some(&LogLevel::Warn));
    }

    #[test]
    fn test_directive() {
        let mut config = LogConfig::default();
        assert_eq!(config.directive(None), "info");
        assert_eq!(config.directive(Some("trace")), "trace");

        config.targets.insert("vigil_exporter".into(), LogLevel::Debug);
        config.targets.insert("vigil_sinks".into(), LogLevel::Error);
        assert_eq!(
            config.directive(None),
            "info,vigil_exporter=debug,vigil_sinks=error"
        );
    }
}

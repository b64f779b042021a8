//! Exporter errors

use thiserror::Error;
use vigil_pipeline::StageError;
use vigil_sinks::SinkError;

#[derive(Debug, Error)]
pub enum ExporterError {
    /// Invalid option combination
    #[error("exporter config error: {0}")]
    Config(String),

    /// Options failed to deserialize
    #[error("exporter options: {0}")]
    Options(#[from] toml::de::Error),

    /// Sink could not be opened
    #[error("exporter sink: {0}")]
    Sink(#[from] SinkError),
}

impl ExporterError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<ExporterError> for StageError {
    fn from(err: ExporterError) -> Self {
        match err {
            ExporterError::Sink(e) => StageError::failed(e.to_string()),
            other => StageError::config(other.to_string()),
        }
    }
}

//! Pipeline error types
//!
//! Everything in `PipelineError` is a construction error: it is returned
//! by the builder before any stage is started. `StageError` is what a
//! stage reports about itself, during construction or while running.

use std::path::PathBuf;

use thiserror::Error;

/// Pipeline construction and supervision errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Channel reference is not `"<name> <Type>"`
    #[error("channel must be of the form <identifier> <type>, got '{spec}'")]
    InvalidChannelSpec { spec: String },

    /// Channel name already bound to another type
    #[error("channel '{name}' already exists with type {existing}, requested {requested}")]
    ChannelTypeMismatch {
        name: String,
        existing: String,
        requested: String,
    },

    /// Stage or channel type is neither built in nor resolvable
    #[error("unknown {kind} '{name}' (no module given), available: [{available}]")]
    UnknownComponent {
        kind: &'static str,
        name: String,
        available: String,
    },

    /// Resolved constructor has the wrong shape for its use
    #[error("'{name}' resolved to a {found} constructor, expected {expected}")]
    ConstructorMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Channel written to by a stage but read by none
    #[error("channel '{name}' has no consumer")]
    UnconsumedChannel { name: String },

    /// Extension module failure
    #[error(transparent)]
    Extension(#[from] ExtensionError),

    /// A stage rejected its configuration or channel bindings
    #[error("stage '{stage}': {source}")]
    Stage {
        stage: String,
        #[source]
        source: StageError,
    },

    /// One or more stages ended with an error
    #[error("{} stage(s) failed: {}", .0.len(), .0.join(", "))]
    StagesFailed(Vec<String>),
}

impl PipelineError {
    /// Wrap a stage error with the stage's label
    pub fn stage(stage: impl Into<String>, source: StageError) -> Self {
        Self::Stage {
            stage: stage.into(),
            source,
        }
    }

    /// Create an invalid channel spec error
    pub fn invalid_channel_spec(spec: impl Into<String>) -> Self {
        Self::InvalidChannelSpec { spec: spec.into() }
    }

    pub fn unconsumed_channel(name: impl Into<String>) -> Self {
        Self::UnconsumedChannel { name: name.into() }
    }
}

/// Extension module errors
#[derive(Debug, Error)]
pub enum ExtensionError {
    /// Shared library could not be opened
    #[error("failed to load module '{}': {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// Symbol not exported by the module
    #[error("module '{}' does not export '{symbol}'", path.display())]
    Symbol {
        path: PathBuf,
        symbol: String,
        #[source]
        source: libloading::Error,
    },

    /// Declaration built against an incompatible interface
    #[error(
        "'{symbol}' in module '{}' targets extension API {found} (vigil {found_version}), expected {expected} (vigil {expected_version})",
        path.display()
    )]
    Incompatible {
        path: PathBuf,
        symbol: String,
        expected: u32,
        found: u32,
        expected_version: &'static str,
        found_version: String,
    },
}

/// Errors reported by a stage
#[derive(Debug, Error)]
pub enum StageError {
    /// Invalid stage options
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Channel binding failed (wrong type, already consumed, unsupported)
    #[error("channel binding failed: {0}")]
    Channel(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stage-specific failure
    #[error("{0}")]
    Failed(String),
}

impl StageError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a channel binding error
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::Channel(msg.into())
    }

    /// Create a generic failure
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type for stage operations
pub type StageResult<T> = std::result::Result<T, StageError>;

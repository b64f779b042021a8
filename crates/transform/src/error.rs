//! Transcode error types
//!
//! Every variant is attributable to a single record; the exporter logs it
//! and moves on to the next one.

use thiserror::Error;
use vigil_protocol::{FieldKind, ProtocolError};

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

/// Errors that can occur while transcoding a record
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// Record carries a field path the schema does not know
    #[error("unknown field path '{0}'")]
    UnknownField(String),

    /// Field value kind differs from the declared kind
    #[error("field '{path}' expects {expected} value, got {found}")]
    KindMismatch {
        path: String,
        expected: FieldKind,
        found: FieldKind,
    },

    /// Setter table does not cover the field schema
    #[error("setter table incomplete: {0}")]
    Table(String),

    /// Shape name not one of flat, structured, ecs
    #[error("unknown output shape '{0}', expected one of: flat, structured, ecs")]
    UnknownShape(String),

    /// ECS projection failed
    #[error("ECS projection failed: {0}")]
    Projection(String),

    /// JSON serialization failed
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl TranscodeError {
    /// Create an unknown field error
    pub fn unknown_field(path: impl Into<String>) -> Self {
        Self::UnknownField(path.into())
    }

    /// Create a kind mismatch error
    pub fn kind_mismatch(path: impl Into<String>, expected: FieldKind, found: FieldKind) -> Self {
        Self::KindMismatch {
            path: path.into(),
            expected,
            found,
        }
    }

    /// Create a projection error
    pub fn projection(msg: impl Into<String>) -> Self {
        Self::Projection(msg.into())
    }
}

impl From<ProtocolError> for TranscodeError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::UnknownField(path) => Self::UnknownField(path),
            ProtocolError::KindMismatch {
                path,
                expected,
                found,
            } => Self::KindMismatch {
                path,
                expected,
                found,
            },
            ProtocolError::InvalidEventType(ty) => {
                Self::Projection(format!("invalid event type: {ty}"))
            }
        }
    }
}

/// Result type for transcode operations
pub type Result<T> = std::result::Result<T, TranscodeError>;

//! Protocol error types
//!
//! Errors raised when a record does not conform to the field schema.

use thiserror::Error;

use crate::schema::FieldKind;

/// Errors that can occur during protocol operations
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Field path is not part of the schema
    #[error("unknown field path '{0}'")]
    UnknownField(String),

    /// Value kind does not match the declared kind of the field
    #[error("field '{path}' expects {expected} value, got {found}")]
    KindMismatch {
        path: String,
        expected: FieldKind,
        found: FieldKind,
    },

    /// Event type string is not one of PE, PF, FF, FE, NF
    #[error("invalid event type: {0}")]
    InvalidEventType(String),
}

impl ProtocolError {
    /// Create an unknown field error
    #[inline]
    pub fn unknown_field(path: impl Into<String>) -> Self {
        Self::UnknownField(path.into())
    }

    /// Create a kind mismatch error
    #[inline]
    pub fn kind_mismatch(path: impl Into<String>, expected: FieldKind, found: FieldKind) -> Self {
        Self::KindMismatch {
            path: path.into(),
            expected,
            found,
        }
    }
}

//! Source errors

use thiserror::Error;
use vigil_protocol::ProtocolError;

/// Why a raw event could not be turned into a record
#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("event is not a JSON object")]
    NotAnObject,

    #[error("unsupported value for {path}: {reason}")]
    Unsupported { path: String, reason: &'static str },

    #[error(transparent)]
    Field(#[from] ProtocolError),

    #[error("invalid _context: {0}")]
    Context(#[source] serde_json::Error),
}

impl FlattenError {
    pub fn unsupported(path: impl Into<String>, reason: &'static str) -> Self {
        Self::Unsupported {
            path: path.into(),
            reason,
        }
    }
}

//! Output shapes

use std::fmt;
use std::str::FromStr;

use crate::error::TranscodeError;

/// Wire representation produced by the transcoder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Shape {
    /// `record` map of field path to value
    #[default]
    Flat,
    /// Scalar attributes plus per-domain sub-structures
    Structured,
    /// Structured body projected into an ECS document
    Ecs,
}

impl Shape {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Structured => "structured",
            Self::Ecs => "ecs",
        }
    }
}

impl FromStr for Shape {
    type Err = TranscodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flat" => Ok(Self::Flat),
            "structured" | "nested" => Ok(Self::Structured),
            "ecs" => Ok(Self::Ecs),
            _ => Err(TranscodeError::UnknownShape(s.to_string())),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Global configuration settings

use serde::Deserialize;

/// Default capacity for channels whose stage does not set one
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10_000;

/// Global configuration that applies to all stages
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default channel capacity (records)
    /// Default: 10000
    pub channel_capacity: usize,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

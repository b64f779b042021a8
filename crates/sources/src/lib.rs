//! Vigil - Sources
//!
//! Built-in ingress so a pipeline can run without an external sensor.
//!
//! - **EventReader** - handler-consuming processor reading JSON lines from a
//!   file or stdin
//! - **Flattener** - handler turning each JSON object into a `Record` on its
//!   output channels
//!
//! # Example
//!
//! ```toml
//! [[pipeline]]
//! processor = "EventReader"
//! handler = "Flattener"
//! out = "flat RecordChan"
//! path = "-"
//! ```

pub mod error;
pub mod flattener;
pub mod metrics;
pub mod reader;

use vigil_pipeline::ComponentRegistry;

pub use error::FlattenError;
pub use flattener::{CONTEXT_KEY, FLATTENER, Flattener, flatten};
pub use metrics::{MetricsSnapshot, SourceMetrics};
pub use reader::{EVENT_READER, EventReader, ReaderConfig, STDIN};

/// Register the built-in ingress stages
pub fn register(registry: &mut ComponentRegistry) {
    registry.register(EVENT_READER, reader::CONSTRUCTOR);
    registry.register(FLATTENER, flattener::CONSTRUCTOR);
}

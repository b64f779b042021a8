//! Vigil - Exporter
//!
//! Terminal stage of a pipeline. Records are buffered until more than
//! `buffer` are held, then transcoded into the configured shape and written
//! one JSON document per event to stdout, a syslog collector or a file.
//!
//! # Example
//!
//! ```toml
//! [[pipeline]]
//! processor = "Exporter"
//! in = "flat RecordChan"
//! export = "file"
//! path = "/var/log/vigil/events.jsonl"
//! shape = "structured"
//! buffer = 100
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod exporter;
pub mod metrics;

pub use batch::{BatchingExporter, ExporterState};
pub use config::{DEFAULT_PATH, ExportConfig, ExportTarget};
pub use error::ExporterError;
pub use exporter::{EXPORTER, Exporter, open_sink, register};
pub use metrics::{ExporterMetrics, ExporterSnapshot};

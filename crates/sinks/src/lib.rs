//! Vigil - Sinks
//!
//! Output sinks for the batching exporter.
//!
//! # Architecture
//!
//! The exporter owns exactly one sink and delivers serialized events to
//! it one at a time, in order. A failed delivery is reported to the
//! caller and counted; it never poisons the sink for later events.
//!
//! ```text
//! [Exporter] --flush--> transcode --> JSON line --> [Sink] --> [Destination]
//! ```
//!
//! # Available Sinks
//!
//! | Sink | Destination | Connection |
//! |------|-------------|------------|
//! | `stdout` | process stdout | none |
//! | `file` | append-per-event file | opened per event |
//! | `syslog` | UDP or TCP syslog endpoint | dialled at init |

// =============================================================================
// Sink implementations (each in its own submodule)
// =============================================================================

/// Stdout sink - one JSON event per line
pub mod stdout;

/// File sink - append-per-event JSON lines
pub mod file;

/// Syslog sink - alert-severity messages over UDP or TCP
pub mod syslog;

// =============================================================================
// Shared types
// =============================================================================

mod common;

pub use common::{MetricsSnapshot, Sink, SinkError, SinkMetrics};
pub use file::FileSink;
pub use stdout::StdoutSink;
pub use syslog::{Facility, Protocol, SyslogConfig, SyslogSink};

//! Batching state machine
//!
//! ```text
//!            record (count <= threshold)
//!              ┌──────┐
//!              ▼      │
//!  start ──→ Draining ─┴─ count > threshold ──→ Flushing ──→ Draining
//!              │                                    ▲
//!              └── input closed ──→ Flushing ───────┘ (closing) ──→ Closed
//! ```
//!
//! A flush transcodes and delivers every buffered record in arrival order,
//! then resets the counter. Failures are per event: the event is logged
//! and dropped, the rest of the batch continues.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use vigil_pipeline::RecordMsg;
use vigil_sinks::Sink;
use vigil_transform::Transcoder;

use crate::metrics::{ExporterMetrics, ExporterSnapshot};

#[cfg(test)]
#[path = "batch_test.rs"]
mod tests;

/// Exporter state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExporterState {
    /// Accumulating records
    Draining,
    /// Emitting the buffer; `closing` once the input has closed
    Flushing { closing: bool },
    /// Input closed and the final flush done
    Closed,
}

/// Buffers records and flushes them through a transcoder into a sink
pub struct BatchingExporter {
    threshold: usize,
    buffer: Vec<RecordMsg>,
    transcoder: Transcoder,
    sink: Box<dyn Sink>,
    metrics: Arc<ExporterMetrics>,
    state: ExporterState,
}

impl BatchingExporter {
    pub fn new(threshold: usize, transcoder: Transcoder, sink: Box<dyn Sink>) -> Self {
        Self {
            threshold,
            buffer: Vec::with_capacity(threshold.saturating_add(1).min(4096)),
            transcoder,
            sink,
            metrics: Arc::new(ExporterMetrics::new()),
            state: ExporterState::Draining,
        }
    }

    /// Share the metrics handle (for observing a running exporter)
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<ExporterMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<ExporterMetrics> {
        &self.metrics
    }

    pub fn state(&self) -> ExporterState {
        self.state
    }

    /// Records currently buffered
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Consume the input until it closes
    pub async fn run(mut self, mut input: mpsc::Receiver<RecordMsg>) -> ExporterSnapshot {
        info!(
            sink = self.sink.name(),
            shape = %self.transcoder.shape(),
            threshold = self.threshold,
            "exporter starting"
        );

        loop {
            self.state = match self.state {
                ExporterState::Draining => match input.recv().await {
                    Some(record) => self.push(record),
                    None => ExporterState::Flushing { closing: true },
                },
                ExporterState::Flushing { closing } => {
                    self.flush().await;
                    if closing {
                        ExporterState::Closed
                    } else {
                        ExporterState::Draining
                    }
                }
                ExporterState::Closed => break,
            };
        }

        if let Err(e) = self.sink.close().await {
            warn!(sink = self.sink.name(), error = %e, "failed to close sink");
        }

        let snapshot = self.metrics.snapshot();
        let sink = self.sink.metrics().snapshot();
        info!(
            records = snapshot.records_received,
            flushes = snapshot.flushes,
            exported = snapshot.events_exported,
            transcode_errors = snapshot.transcode_errors,
            delivery_errors = snapshot.delivery_errors,
            bytes = sink.bytes_written,
            "exporter shutting down"
        );
        snapshot
    }

    /// Buffer one record and pick the next state
    pub fn push(&mut self, record: RecordMsg) -> ExporterState {
        self.metrics.record_received();
        self.buffer.push(record);
        if self.buffer.len() > self.threshold {
            ExporterState::Flushing { closing: false }
        } else {
            ExporterState::Draining
        }
    }

    /// Transcode and deliver everything buffered, in order
    pub async fn flush(&mut self) {
        self.metrics.flush();
        let batch = std::mem::take(&mut self.buffer);
        debug!(events = batch.len(), "flushing");

        for record in &batch {
            let line = match self
                .transcoder
                .transcode(record)
                .and_then(|event| self.transcoder.encode(&event))
            {
                Ok(line) => line,
                Err(e) => {
                    self.metrics.transcode_error();
                    warn!(error = %e, "dropping record that failed to transcode");
                    continue;
                }
            };

            match self.sink.deliver(&line).await {
                Ok(()) => self.metrics.exported(),
                Err(e) => {
                    self.metrics.delivery_error();
                    warn!(
                        sink = self.sink.name(),
                        error = %e,
                        "dropping event that failed to deliver"
                    );
                }
            }
        }

        // keep the allocation for the next batch
        self.buffer = batch;
        self.buffer.clear();
    }
}

impl std::fmt::Debug for BatchingExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchingExporter")
            .field("threshold", &self.threshold)
            .field("buffered", &self.buffer.len())
            .field("sink", &self.sink.name())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

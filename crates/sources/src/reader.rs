//! Event reader
//!
//! Handler-consuming processor that reads newline-delimited JSON from a
//! file (or stdin for `path = "-"`) and hands each object to its handler.
//!
//! ```toml
//! [[pipeline]]
//! processor = "EventReader"
//! handler = "Flattener"
//! out = "flat RecordChan"
//! path = "events.jsonl"
//! ```
//!
//! Reading stops at end of input or when the pipeline is cancelled; the
//! handler is cleaned up either way.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use vigil_config::parse_options;
use vigil_pipeline::{
    Constructor, Handler, Processor, StageContext, StageError, StageOptions, StageResult,
};

use crate::metrics::{MetricsSnapshot, SourceMetrics};

#[cfg(test)]
#[path = "reader_test.rs"]
mod tests;

/// Registered processor name
pub const EVENT_READER: &str = "EventReader";

/// Path that selects standard input
pub const STDIN: &str = "-";

pub(crate) const CONSTRUCTOR: Constructor = Constructor::HandlerProcessor(EventReader::boxed);

/// Reader options
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Input file, or `-` for stdin
    pub path: PathBuf,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(STDIN),
        }
    }
}

impl ReaderConfig {
    pub fn is_stdin(&self) -> bool {
        self.path.as_os_str() == std::ffi::OsStr::new(STDIN)
    }
}

/// The `EventReader` processor
pub struct EventReader {
    handler: Box<dyn Handler>,
    config: ReaderConfig,
    metrics: Arc<SourceMetrics>,
}

impl EventReader {
    pub fn new(handler: Box<dyn Handler>) -> Self {
        Self {
            handler,
            config: ReaderConfig::default(),
            metrics: Arc::new(SourceMetrics::new()),
        }
    }

    fn boxed(handler: Box<dyn Handler>) -> Box<dyn Processor> {
        Box::new(Self::new(handler))
    }

    pub fn metrics(&self) -> Arc<SourceMetrics> {
        self.metrics.clone()
    }

    /// Read lines from `input` until it ends or `cancel` fires
    ///
    /// Lines are read as raw bytes; one that is not valid UTF-8 JSON is
    /// counted as a parse error and skipped like any other bad line.
    async fn pump<R>(&mut self, mut input: R, cancel: &CancellationToken) -> StageResult<()>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let mut buf = Vec::with_capacity(4096);
        loop {
            buf.clear();
            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(reader = EVENT_READER, "cancelled");
                    return Ok(());
                }
                read = input.read_until(b'\n', &mut buf) => read?,
            };
            if read == 0 {
                return Ok(());
            }

            let line = buf.trim_ascii();
            if line.is_empty() {
                continue;
            }
            self.metrics.line_read(read as u64);

            match serde_json::from_slice(line) {
                Ok(event) => self.handler.handle(event).await?,
                Err(e) => {
                    self.metrics.parse_error();
                    warn!(error = %e, "skipping line that is not JSON");
                }
            }
        }
    }
}

#[async_trait]
impl Processor for EventReader {
    fn name(&self) -> &str {
        EVENT_READER
    }

    async fn init(&mut self, options: &StageOptions) -> StageResult<()> {
        self.config = parse_options(options).map_err(|e| StageError::config(e.to_string()))?;
        if self.config.path.as_os_str().is_empty() {
            return Err(StageError::config("EventReader requires a path"));
        }
        Ok(())
    }

    async fn run(&mut self, ctx: StageContext) -> StageResult<()> {
        info!(
            path = %self.config.path.display(),
            handler = self.handler.name(),
            "reader starting"
        );

        let result = if self.config.is_stdin() {
            self.pump(BufReader::new(tokio::io::stdin()), &ctx.cancel).await
        } else {
            match tokio::fs::File::open(&self.config.path).await {
                Ok(file) => self.pump(BufReader::new(file), &ctx.cancel).await,
                Err(e) => Err(StageError::failed(format!(
                    "cannot open {}: {e}",
                    self.config.path.display()
                ))),
            }
        };

        let cleanup = self.handler.cleanup().await;
        log_snapshot(&self.metrics.snapshot());
        result.and(cleanup)
    }
}

fn log_snapshot(snapshot: &MetricsSnapshot) {
    info!(
        lines = snapshot.lines_read,
        bytes = snapshot.bytes_read,
        parse_errors = snapshot.parse_errors,
        "reader shutting down"
    );
}

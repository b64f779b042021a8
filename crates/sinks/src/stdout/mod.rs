//! Stdout Sink - one JSON event per line
//!
//! Writes each event as soon as it is delivered, so output interleaves
//! correctly with other processes reading the same terminal or pipe.

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};

use crate::common::{Sink, SinkError, SinkMetrics};

#[cfg(test)]
#[path = "stdout_test.rs"]
mod stdout_test;

/// Line-oriented sink over stdout (or any writer, for tests)
pub struct StdoutSink<W = Stdout> {
    writer: W,
    metrics: SinkMetrics,
}

impl StdoutSink<Stdout> {
    pub fn new() -> Self {
        Self::with_writer(tokio::io::stdout())
    }
}

impl Default for StdoutSink<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: AsyncWrite + Unpin + Send> StdoutSink<W> {
    /// Write to `writer` instead of stdout
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            metrics: SinkMetrics::new(),
        }
    }

    /// Consume the sink and return its writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    async fn write_line(&mut self, event: &str) -> std::io::Result<()> {
        self.writer.write_all(event.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> Sink for StdoutSink<W> {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn deliver(&mut self, event: &str) -> Result<(), SinkError> {
        match self.write_line(event).await {
            Ok(()) => {
                self.metrics.event_written(event.len() as u64 + 1);
                Ok(())
            }
            Err(e) => {
                self.metrics.write_error();
                Err(SinkError::write(format!("stdout: {e}")))
            }
        }
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        self.writer.flush().await?;
        Ok(())
    }

    fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }
}

//! File Sink - append one JSON event per line
//!
//! The file is opened in append mode for every event and closed again
//! after the write, so an external rotation (or a directory that only
//! becomes writable later) is picked up on the next event. Any previous
//! output file is removed when the sink is created.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::common::{Sink, SinkError, SinkMetrics};


/// Append-per-event file sink
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    metrics: SinkMetrics,
}

impl FileSink {
    /// Create the sink, removing any existing file at `path`
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(SinkError::config("file sink requires a path"));
        }

        match fs::remove_file(&path).await {
            Ok(()) => debug!(path = %path.display(), "removed previous output file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(SinkError::init(format!(
                    "cannot remove {}: {e}",
                    path.display()
                )));
            }
        }

        Ok(Self {
            path,
            metrics: SinkMetrics::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, event: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let mut line = String::with_capacity(event.len() + 1);
        line.push_str(event);
        line.push('\n');
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}

#[async_trait]
impl Sink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    async fn deliver(&mut self, event: &str) -> Result<(), SinkError> {
        match self.append(event).await {
            Ok(()) => {
                self.metrics.event_written(event.len() as u64 + 1);
                Ok(())
            }
            Err(e) => {
                self.metrics.write_error();
                Err(SinkError::write(format!("{}: {e}", self.path.display())))
            }
        }
    }

    fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }
}

//! Pipeline supervisor
//!
//! Owns one worker task per stage. Shutdown is cooperative: `shutdown()`
//! cancels the stage token, sources stop producing and drop their
//! outputs, and closure cascades downstream until every stage returns.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::broker::ChannelBroker;
use crate::error::{PipelineError, Result, StageResult};
use crate::stage::{Processor, StageContext};

struct Worker {
    name: String,
    handle: JoinHandle<StageResult<()>>,
}

/// A running pipeline
pub struct Pipeline {
    workers: Vec<Worker>,
    cancel: CancellationToken,
    broker: ChannelBroker,
}

impl Pipeline {
    /// Spawn every stage; called by the builder once construction succeeded
    pub(crate) fn start(
        stages: Vec<(String, Box<dyn Processor>)>,
        broker: ChannelBroker,
        cancel: CancellationToken,
    ) -> Self {
        let workers = stages
            .into_iter()
            .map(|(name, mut processor)| {
                let ctx = StageContext::new(name.clone(), cancel.clone());
                let cancel = cancel.clone();
                let stage = name.clone();
                let handle = tokio::spawn(async move {
                    info!(stage = %stage, "stage starting");
                    let result = processor.run(ctx).await;
                    if let Err(e) = &result {
                        // stop the sources so the remaining stages drain
                        error!(stage = %stage, error = %e, "stage failed, shutting down pipeline");
                        cancel.cancel();
                    }
                    result
                });
                Worker { name, handle }
            })
            .collect();

        Self {
            workers,
            cancel,
            broker,
        }
    }

    /// Request cooperative shutdown
    pub fn shutdown(&self) {
        info!("pipeline shutdown requested");
        self.cancel.cancel();
    }

    /// Token cancelled on shutdown
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Stage labels in declaration order
    pub fn stage_names(&self) -> Vec<&str> {
        self.workers.iter().map(|w| w.name.as_str()).collect()
    }

    /// Number of named channels
    pub fn channel_count(&self) -> usize {
        self.broker.len()
    }

    /// Wait for every stage to complete
    ///
    /// Returns `StagesFailed` naming each stage that returned an error or
    /// panicked.
    pub async fn wait(self) -> Result<()> {
        let mut failed = Vec::new();

        for worker in self.workers {
            match worker.handle.await {
                Ok(Ok(())) => info!(stage = %worker.name, "stage completed"),
                Ok(Err(_)) => failed.push(worker.name),
                Err(e) => {
                    warn!(stage = %worker.name, error = %e, "stage panicked");
                    self.cancel.cancel();
                    failed.push(worker.name);
                }
            }
        }

        if failed.is_empty() {
            info!(channels = self.broker.len(), "pipeline finished");
            Ok(())
        } else {
            Err(PipelineError::StagesFailed(failed))
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .field("channels", &self.broker.names())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

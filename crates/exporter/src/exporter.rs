//! Exporter stage
//!
//! Terminal pipeline stage: reads records from its one input channel,
//! batches them and writes each one to the configured sink.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;
use vigil_pipeline::{
    ChannelRef, ComponentRegistry, Constructor, Processor, RecordMsg, StageContext, StageError,
    StageOptions, StageResult, bind_receiver,
};
use vigil_sinks::{FileSink, Sink, StdoutSink, SyslogSink};
use vigil_transform::Transcoder;

use crate::batch::BatchingExporter;
use crate::config::{ExportConfig, ExportTarget};
use crate::error::ExporterError;
use crate::metrics::ExporterMetrics;

/// Registered processor name
pub const EXPORTER: &str = "Exporter";

/// Register the exporter with a component registry
pub fn register(registry: &mut ComponentRegistry) {
    registry.register(EXPORTER, Constructor::Processor(Exporter::boxed));
}

/// Open the sink selected by `config`
pub async fn open_sink(config: &ExportConfig) -> Result<Box<dyn Sink>, ExporterError> {
    let sink: Box<dyn Sink> = match config.export {
        ExportTarget::Stdout => Box::new(StdoutSink::new()),
        ExportTarget::File => Box::new(FileSink::create(config.path.clone()).await?),
        ExportTarget::Syslog => Box::new(SyslogSink::connect(config.syslog()).await?),
    };
    Ok(sink)
}

/// The `Exporter` processor
#[derive(Default)]
pub struct Exporter {
    input: Option<mpsc::Receiver<RecordMsg>>,
    config: Option<ExportConfig>,
    sink: Option<Box<dyn Sink>>,
    metrics: Arc<ExporterMetrics>,
}

impl Exporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn boxed() -> Box<dyn Processor> {
        Box::new(Self::new())
    }

    /// Counters shared with the running stage
    pub fn metrics(&self) -> Arc<ExporterMetrics> {
        self.metrics.clone()
    }
}

#[async_trait]
impl Processor for Exporter {
    fn name(&self) -> &str {
        EXPORTER
    }

    fn set_input(&mut self, channel: &ChannelRef) -> StageResult<()> {
        self.input = Some(bind_receiver(channel)?);
        Ok(())
    }

    async fn init(&mut self, options: &StageOptions) -> StageResult<()> {
        let config = ExportConfig::from_options(options)?;
        let sink = open_sink(&config).await?;
        info!(
            export = %config.export,
            shape = %config.shape,
            buffer = config.buffer,
            "exporter initialized"
        );
        self.sink = Some(sink);
        self.config = Some(config);
        Ok(())
    }

    async fn run(&mut self, _ctx: StageContext) -> StageResult<()> {
        let input = self
            .input
            .take()
            .ok_or_else(|| StageError::channel("exporter has no input channel"))?;
        let (config, sink) = match (self.config.take(), self.sink.take()) {
            (Some(config), Some(sink)) => (config, sink),
            _ => return Err(StageError::failed("exporter run before init")),
        };

        // Shutdown is driven by input closure, never by cancellation, so
        // that everything upstream produced is flushed.
        let transcoder = Transcoder::new(config.shape).with_version(config.version);
        BatchingExporter::new(config.buffer, transcoder, sink)
            .with_metrics(self.metrics.clone())
            .run(input)
            .await;
        Ok(())
    }
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("config", &self.config)
            .field("bound", &self.input.is_some())
            .finish_non_exhaustive()
    }
}

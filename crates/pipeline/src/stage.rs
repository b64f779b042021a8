//! Stage interfaces
//!
//! A pipeline is made of *processors*. A processor owns one task, reads
//! from at most one input channel and writes to any number of outputs.
//! A *handler* is the pluggable half of a handler-consuming processor:
//! the processor produces raw events (e.g. lines from a sensor) and the
//! handler turns each into records on its own outputs.

use std::fmt;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use vigil_config::StageOptions;

use crate::channel::{ChannelFactory, ChannelRef};
use crate::error::{StageError, StageResult};

/// Raw event handed from a processor to its handler
pub type RawEvent = serde_json::Value;

/// Zero-argument processor factory
pub type ProcessorFactory = fn() -> Box<dyn Processor>;

/// Processor factory that consumes a handler
pub type HandlerProcessorFactory = fn(Box<dyn Handler>) -> Box<dyn Processor>;

/// Zero-argument handler factory
pub type HandlerFactory = fn() -> Box<dyn Handler>;

/// Runtime context passed to a running stage
#[derive(Debug, Clone)]
pub struct StageContext {
    /// Stage label (`processor` or `processor/handler`)
    pub name: String,
    /// Cancelled when the pipeline shuts down; sources must honour it
    pub cancel: CancellationToken,
}

impl StageContext {
    pub fn new(name: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            name: name.into(),
            cancel,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// A pipeline stage
#[async_trait]
pub trait Processor: Send {
    /// Type name of the stage (used in logs)
    fn name(&self) -> &str;

    /// Bind the input channel; stages without input reject it
    fn set_input(&mut self, channel: &ChannelRef) -> StageResult<()> {
        Err(StageError::channel(format!(
            "{} does not take an input channel (got {})",
            self.name(),
            channel.type_name()
        )))
    }

    /// Bind output channels; stages without outputs reject any
    fn set_outputs(&mut self, channels: &[ChannelRef]) -> StageResult<()> {
        reject_outputs(self.name(), channels)
    }

    /// Apply stage options; called once, after channel binding
    async fn init(&mut self, _options: &StageOptions) -> StageResult<()> {
        Ok(())
    }

    /// Run until the input closes or the context is cancelled
    ///
    /// Returning drops the stage and with it every output sender.
    async fn run(&mut self, ctx: StageContext) -> StageResult<()>;
}

/// Pluggable event handler owned by a handler-consuming processor
#[async_trait]
pub trait Handler: Send {
    fn name(&self) -> &str;

    fn set_outputs(&mut self, channels: &[ChannelRef]) -> StageResult<()> {
        reject_outputs(self.name(), channels)
    }

    async fn init(&mut self, _options: &StageOptions) -> StageResult<()> {
        Ok(())
    }

    /// Handle one raw event
    async fn handle(&mut self, event: RawEvent) -> StageResult<()>;

    /// Called once after the last event
    async fn cleanup(&mut self) -> StageResult<()> {
        Ok(())
    }
}

fn reject_outputs(name: &str, channels: &[ChannelRef]) -> StageResult<()> {
    if channels.is_empty() {
        Ok(())
    } else {
        Err(StageError::channel(format!(
            "{} does not take output channels (got {})",
            name,
            channels.len()
        )))
    }
}

/// Constructor shapes a component can be registered or exported with
#[derive(Clone, Copy)]
pub enum Constructor {
    Processor(ProcessorFactory),
    HandlerProcessor(HandlerProcessorFactory),
    Handler(HandlerFactory),
    Channel(ChannelFactory),
}

impl Constructor {
    /// Short name of the shape, for error messages
    pub fn shape(&self) -> &'static str {
        match self {
            Constructor::Processor(_) => "processor",
            Constructor::HandlerProcessor(_) => "handler-consuming processor",
            Constructor::Handler(_) => "handler",
            Constructor::Channel(_) => "channel",
        }
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Constructor({})", self.shape())
    }
}

/// Processor constructor resolved for a stage
#[derive(Clone, Copy)]
pub enum StageFactory {
    /// Stage without a handler
    Plain(ProcessorFactory),
    /// Stage whose handler is passed to the constructor
    WithHandler(HandlerProcessorFactory),
}

impl fmt::Debug for StageFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageFactory::Plain(_) => f.write_str("StageFactory::Plain"),
            StageFactory::WithHandler(_) => f.write_str("StageFactory::WithHandler"),
        }
    }
}

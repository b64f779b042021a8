//! Vigil - Pipeline
//!
//! The composition engine that turns a stage descriptor into a running
//! graph of concurrent stages connected by named channels.
//!
//! # Architecture
//!
//! ```text
//!  [[pipeline]] ──→ PipelineBuilder ──→ ComponentRegistry ──→ built-in table
//!                        │                     │
//!                        │                     └──→ ExtensionLoader ──→ New<Name> in module
//!                        ▼
//!                  ChannelBroker ("flat RecordChan" ──→ one mpsc queue per name)
//!                        │
//!                        ▼
//!   Pipeline: EventReader/Flattener ──→ flat ──→ Exporter ──→ sink
//!             (one tokio task per stage, closure cascades downstream)
//! ```
//!
//! # Key Design
//!
//! - **All-or-nothing**: every stage is resolved, bound and initialised
//!   before any task starts
//! - **One instance per channel name**: the broker memoizes under a lock
//! - **Single consumer**: binding an input takes the receiver
//! - **Typed constructors**: built-ins and extension declarations share
//!   the `Constructor` shapes, checked against each stage's handler flag
//!
//! # Example
//!
//! ```ignore
//! use vigil_pipeline::{ComponentRegistry, PipelineBuilder};
//!
//! let registry = ComponentRegistry::new();
//! let pipeline = PipelineBuilder::new(&registry)
//!     .with_default_capacity(config.global.channel_capacity)
//!     .build(&config.pipeline)
//!     .await?;
//!
//! pipeline.wait().await?;
//! ```

mod broker;
mod builder;
mod channel;
mod error;
mod extension;
mod registry;
mod stage;
mod supervisor;

pub use broker::ChannelBroker;
pub use builder::{PipelineBuilder, PipelinePlan};
pub use channel::{
    AnyChannel, Channel, ChannelFactory, ChannelRef, ChannelSpec, RECORD_CHANNEL, RecordMsg,
    bind_receiver, bind_sender, downcast, new_record_channel,
};
pub use error::{ExtensionError, PipelineError, Result, StageError, StageResult};
pub use extension::{EXTENSION_API_VERSION, ExtensionLoader, StageDeclaration, VIGIL_VERSION};
pub use registry::{ComponentRegistry, extension_symbol};
pub use stage::{
    Constructor, Handler, HandlerFactory, HandlerProcessorFactory, Processor, ProcessorFactory,
    RawEvent, StageContext, StageFactory,
};
pub use supervisor::Pipeline;

// Re-exported for stage and extension authors
pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;
pub use vigil_config::{StageConfig, StageOptions};

#[cfg(test)]
mod test_stages;

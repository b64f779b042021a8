//! Pipeline Builder
//!
//! Turns the `[[pipeline]]` descriptor into a running graph. Construction
//! is all-or-nothing: every stage is resolved, bound to its channels and
//! initialised before the broker is sealed and the first task spawned.
//!
//! ```text
//! for each stage:   resolve ──→ outputs ──→ [handler] ──→ input ──→ init
//! then:             seal broker ──→ spawn all
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use vigil_config::{DEFAULT_CHANNEL_CAPACITY, StageConfig};

use crate::broker::ChannelBroker;
use crate::channel::{ChannelRef, ChannelSpec};
use crate::error::{PipelineError, Result, StageError};
use crate::registry::ComponentRegistry;
use crate::stage::{Processor, StageFactory};
use crate::supervisor::Pipeline;

/// Builds pipelines from stage descriptors
pub struct PipelineBuilder<'a> {
    registry: &'a ComponentRegistry,
    default_capacity: usize,
    cancel: CancellationToken,
}

/// Outcome of a dry resolve
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelinePlan {
    /// Stage labels in declaration order
    pub stages: Vec<String>,
    /// Channel name to declared type
    pub channels: BTreeMap<String, String>,
}

impl<'a> PipelineBuilder<'a> {
    pub fn new(registry: &'a ComponentRegistry) -> Self {
        Self {
            registry,
            default_capacity: DEFAULT_CHANNEL_CAPACITY,
            cancel: CancellationToken::new(),
        }
    }

    /// Capacity for stages that do not set their own
    #[must_use]
    pub fn with_default_capacity(mut self, capacity: usize) -> Self {
        self.default_capacity = capacity;
        self
    }

    /// Use an externally owned cancellation token
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn capacity(&self, stage: &StageConfig) -> usize {
        stage.capacity.unwrap_or(self.default_capacity)
    }

    fn channel(
        &self,
        broker: &ChannelBroker,
        spec: &str,
        capacity: usize,
        module: Option<&Path>,
    ) -> Result<ChannelRef> {
        broker.get_channel(spec, capacity, |type_name| {
            self.registry.resolve_channel(type_name, module)
        })
    }

    /// Construct, wire and start every stage
    pub async fn build(self, stages: &[StageConfig]) -> Result<Pipeline> {
        let broker = ChannelBroker::new();
        let mut built: Vec<(String, Box<dyn Processor>)> = Vec::with_capacity(stages.len());

        for stage in stages {
            let label = stage.label();
            let processor = self.construct(&broker, stage, &label).await?;
            debug!(stage = %label, "stage constructed");
            built.push((label, processor));
        }

        broker.seal()?;
        info!(
            stages = built.len(),
            channels = broker.len(),
            "pipeline constructed, starting stages"
        );
        Ok(Pipeline::start(built, broker, self.cancel))
    }

    async fn construct(
        &self,
        broker: &ChannelBroker,
        stage: &StageConfig,
        label: &str,
    ) -> Result<Box<dyn Processor>> {
        let module = stage.module.as_deref();
        let capacity = self.capacity(stage);
        let wrap = |e: StageError| PipelineError::stage(label, e);

        let factory =
            self.registry
                .resolve_processor(&stage.processor, module, stage.handler.is_some())?;

        let outputs = stage
            .out
            .iter()
            .map(|spec| self.channel(broker, spec, capacity, module))
            .collect::<Result<Vec<_>>>()?;

        let mut processor = match (factory, &stage.handler) {
            (StageFactory::WithHandler(new_processor), Some(handler_name)) => {
                let new_handler = self.registry.resolve_handler(handler_name, module)?;
                let mut handler = new_handler();
                handler.set_outputs(&outputs).map_err(wrap)?;
                handler.init(&stage.options).await.map_err(wrap)?;
                new_processor(handler)
            }
            (StageFactory::Plain(new_processor), None) => {
                let mut processor = new_processor();
                processor.set_outputs(&outputs).map_err(wrap)?;
                processor
            }
            (_, handler) => {
                return Err(PipelineError::ConstructorMismatch {
                    name: stage.processor.clone(),
                    expected: if handler.is_some() {
                        "handler-consuming processor"
                    } else {
                        "processor"
                    },
                    found: "other",
                });
            }
        };

        if let Some(spec) = &stage.input {
            let input = self.channel(broker, spec, capacity, module)?;
            processor.set_input(&input).map_err(wrap)?;
        }

        processor.init(&stage.options).await.map_err(wrap)?;
        Ok(processor)
    }

    /// Resolve the whole descriptor without instantiating any stage
    ///
    /// Checks what `build` would reject before a stage runs: unknown
    /// components, constructor shapes, channel spec syntax and types,
    /// inconsistent types for one name, a second consumer and a channel
    /// nobody reads.
    pub fn validate(&self, stages: &[StageConfig]) -> Result<PipelinePlan> {
        let mut plan = PipelinePlan::default();
        let mut consumers: BTreeMap<String, String> = BTreeMap::new();

        for stage in stages {
            let label = stage.label();
            let module = stage.module.as_deref();

            let factory =
                self.registry
                    .resolve_processor(&stage.processor, module, stage.handler.is_some())?;
            if let (StageFactory::WithHandler(_), Some(handler)) = (factory, &stage.handler) {
                self.registry.resolve_handler(handler, module)?;
            }

            for spec in stage.out.iter().chain(stage.input.iter()) {
                let parsed = ChannelSpec::parse(spec)?;
                match plan.channels.get(parsed.name) {
                    Some(existing) if existing != parsed.type_name => {
                        return Err(PipelineError::ChannelTypeMismatch {
                            name: parsed.name.to_string(),
                            existing: existing.clone(),
                            requested: parsed.type_name.to_string(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        self.registry.resolve_channel(parsed.type_name, module)?;
                        plan.channels
                            .insert(parsed.name.to_string(), parsed.type_name.to_string());
                    }
                }
            }

            if let Some(spec) = &stage.input {
                let parsed = ChannelSpec::parse(spec)?;
                if let Some(owner) = consumers.insert(parsed.name.to_string(), label.clone()) {
                    return Err(PipelineError::stage(
                        label,
                        StageError::channel(format!(
                            "channel '{}' is already consumed by {}",
                            parsed.name, owner
                        )),
                    ));
                }
            }

            plan.stages.push(label);
        }

        if let Some(name) = plan.channels.keys().find(|name| !consumers.contains_key(*name)) {
            return Err(PipelineError::unconsumed_channel(name.as_str()));
        }

        Ok(plan)
    }
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod builder_test;

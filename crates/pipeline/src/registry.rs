//! Component Registry - stage and channel constructors by name
//!
//! The registry maps processor, handler and channel type names to
//! constructors. Built-ins are registered at startup; anything else is
//! resolved as `New<Name>` from the extension module the stage names.
//!
//! # Example
//!
//! ```ignore
//! let mut registry = ComponentRegistry::new();
//! registry.register("Exporter", Constructor::Processor(new_exporter));
//! registry.register("Flattener", Constructor::Handler(new_flattener));
//!
//! let factory = registry.resolve_processor("Exporter", None, false)?;
//! ```

use std::collections::HashMap;
use std::path::Path;

use crate::channel::{ChannelFactory, RECORD_CHANNEL, new_record_channel};
use crate::error::{PipelineError, Result};
use crate::extension::ExtensionLoader;
use crate::stage::{Constructor, HandlerFactory, StageFactory};

/// Symbol an extension module exports for component `name`
pub fn extension_symbol(name: &str) -> String {
    format!("New{name}")
}

/// Registry of built-in constructors with extension fallback
#[derive(Debug)]
pub struct ComponentRegistry {
    processors: HashMap<String, Constructor>,
    handlers: HashMap<String, Constructor>,
    channels: HashMap<String, Constructor>,
    loader: ExtensionLoader,
}

impl ComponentRegistry {
    /// Create a registry holding only the built-in `RecordChan` type
    pub fn new() -> Self {
        let mut registry = Self {
            processors: HashMap::new(),
            handlers: HashMap::new(),
            channels: HashMap::new(),
            loader: ExtensionLoader::new(),
        };
        registry.register(RECORD_CHANNEL, Constructor::Channel(new_record_channel));
        registry
    }

    fn table_mut(&mut self, constructor: &Constructor) -> &mut HashMap<String, Constructor> {
        match constructor {
            Constructor::Processor(_) | Constructor::HandlerProcessor(_) => &mut self.processors,
            Constructor::Handler(_) => &mut self.handlers,
            Constructor::Channel(_) => &mut self.channels,
        }
    }

    /// Register a built-in component
    ///
    /// # Panics
    /// Panics if a component of the same kind is already registered with
    /// this name. Use `try_register` for fallible registration.
    pub fn register(&mut self, name: &str, constructor: Constructor) {
        if !self.try_register(name, constructor) {
            panic!("{} '{}' already registered", constructor.shape(), name);
        }
    }

    /// Try to register a built-in component
    ///
    /// Returns `false` if one of the same kind is already registered.
    pub fn try_register(&mut self, name: &str, constructor: Constructor) -> bool {
        let table = self.table_mut(&constructor);
        if table.contains_key(name) {
            return false;
        }
        table.insert(name.to_string(), constructor);
        true
    }

    /// Resolve a processor constructor
    ///
    /// `with_handler` is the stage's declared flag; the constructor must
    /// have the matching shape.
    pub fn resolve_processor(
        &self,
        name: &str,
        module: Option<&Path>,
        with_handler: bool,
    ) -> Result<StageFactory> {
        let constructor = self.lookup(&self.processors, "processor", name, module)?;
        match (constructor, with_handler) {
            (Constructor::Processor(factory), false) => Ok(StageFactory::Plain(factory)),
            (Constructor::HandlerProcessor(factory), true) => {
                Ok(StageFactory::WithHandler(factory))
            }
            (other, with_handler) => Err(PipelineError::ConstructorMismatch {
                name: name.to_string(),
                expected: if with_handler {
                    "handler-consuming processor"
                } else {
                    "processor"
                },
                found: other.shape(),
            }),
        }
    }

    /// Resolve a handler constructor
    pub fn resolve_handler(&self, name: &str, module: Option<&Path>) -> Result<HandlerFactory> {
        match self.lookup(&self.handlers, "handler", name, module)? {
            Constructor::Handler(factory) => Ok(factory),
            other => Err(PipelineError::ConstructorMismatch {
                name: name.to_string(),
                expected: "handler",
                found: other.shape(),
            }),
        }
    }

    /// Resolve a channel type constructor
    pub fn resolve_channel(
        &self,
        type_name: &str,
        module: Option<&Path>,
    ) -> Result<ChannelFactory> {
        match self.lookup(&self.channels, "channel type", type_name, module)? {
            Constructor::Channel(factory) => Ok(factory),
            other => Err(PipelineError::ConstructorMismatch {
                name: type_name.to_string(),
                expected: "channel",
                found: other.shape(),
            }),
        }
    }

    fn lookup(
        &self,
        table: &HashMap<String, Constructor>,
        kind: &'static str,
        name: &str,
        module: Option<&Path>,
    ) -> Result<Constructor> {
        if let Some(constructor) = table.get(name) {
            return Ok(*constructor);
        }

        match module {
            Some(path) => Ok(self.loader.resolve(path, &extension_symbol(name))?),
            None => {
                let mut available: Vec<&str> = table.keys().map(|s| s.as_str()).collect();
                available.sort_unstable();
                Err(PipelineError::UnknownComponent {
                    kind,
                    name: name.to_string(),
                    available: available.join(", "),
                })
            }
        }
    }

    /// Check if a built-in processor is registered
    pub fn has_processor(&self, name: &str) -> bool {
        self.processors.contains_key(name)
    }

    /// Check if a built-in handler is registered
    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Check if a built-in channel type is registered
    pub fn has_channel(&self, type_name: &str) -> bool {
        self.channels.contains_key(type_name)
    }

    /// Extension modules loaded so far
    pub fn loaded_modules(&self) -> usize {
        self.loader.len()
    }

    /// Number of built-in components of all kinds
    pub fn len(&self) -> usize {
        self.processors.len() + self.handlers.len() + self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;

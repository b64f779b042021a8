//! Pipeline stage configuration
//!
//! Each `[[pipeline]]` table describes one stage: the processor to run,
//! an optional handler it drives, where to find either if they are not
//! built in, and the named channels the stage reads from and writes to.
//!
//! # Example
//!
//! ```toml
//! [[pipeline]]
//! processor = "EventReader"
//! handler = "Flattener"
//! out = "flat RecordChan"
//! path = "events.jsonl"
//!
//! [[pipeline]]
//! processor = "Exporter"
//! in = "flat RecordChan"
//! export = "file"
//! path = "out.jsonl"
//! shape = "structured"
//! ```
//!
//! Any key not listed on `StageConfig` is collected into `options` and
//! handed to the stage at initialization.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::path::PathBuf;

/// Stage-specific options, passed through verbatim
pub type StageOptions = HashMap<String, toml::Value>;

/// Configuration for one pipeline stage
#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    /// Processor name (built in, or `New<processor>` in `module`)
    pub processor: String,

    /// Handler driven by the processor, if any
    #[serde(default)]
    pub handler: Option<String>,

    /// Extension module to load stages and channel types from
    #[serde(default)]
    pub module: Option<PathBuf>,

    /// Input channel reference (`"<name> <Type>"`)
    #[serde(default, rename = "in")]
    pub input: Option<String>,

    /// Output channel references
    #[serde(default, deserialize_with = "one_or_many")]
    pub out: Vec<String>,

    /// Capacity for channels first created by this stage
    #[serde(default)]
    pub capacity: Option<usize>,

    /// Stage-specific options
    #[serde(flatten)]
    pub options: StageOptions,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

impl StageConfig {
    /// Create a stage config for a processor
    pub fn new(processor: impl Into<String>) -> Self {
        Self {
            processor: processor.into(),
            handler: None,
            module: None,
            input: None,
            out: Vec::new(),
            capacity: None,
            options: StageOptions::new(),
        }
    }

    #[must_use]
    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    #[must_use]
    pub fn with_module(mut self, module: impl Into<PathBuf>) -> Self {
        self.module = Some(module.into());
        self
    }

    #[must_use]
    pub fn with_input(mut self, spec: impl Into<String>) -> Self {
        self.input = Some(spec.into());
        self
    }

    #[must_use]
    pub fn with_output(mut self, spec: impl Into<String>) -> Self {
        self.out.push(spec.into());
        self
    }

    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Display name: `processor` or `processor/handler`
    pub fn label(&self) -> String {
        match &self.handler {
            Some(handler) => format!("{}/{}", self.processor, handler),
            None => self.processor.clone(),
        }
    }

    /// Get an option as string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }

    /// Get an option as i64
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.options.get(key).and_then(|v| v.as_integer())
    }

    /// Get an option as bool
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.options.get(key).and_then(|v| v.as_bool())
    }
}

/// Deserialize stage options into a typed settings struct
pub fn parse_options<T: DeserializeOwned>(options: &StageOptions) -> Result<T, toml::de::Error> {
    let table: toml::Table = options
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    toml::Value::Table(table).try_into()
}

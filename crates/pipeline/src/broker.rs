//! Named Channel Broker
//!
//! Memoizing factory for named channels. The first reference to a name
//! creates the channel; every later reference returns the same handle.
//! Names are global across the whole pipeline.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use crate::channel::{ChannelFactory, ChannelRef, ChannelSpec};
use crate::error::{PipelineError, Result};

/// Registry of live channels keyed by name
#[derive(Debug, Default)]
pub struct ChannelBroker {
    channels: Mutex<HashMap<String, ChannelRef>>,
}

impl ChannelBroker {
    /// Create an empty broker
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the channel named by `spec`, creating it on first reference
    ///
    /// `resolve` maps the declared type name to a factory and is only
    /// called when the channel does not exist yet. The lock is held for
    /// the whole call, so concurrent first references create one channel.
    pub fn get_channel<F>(&self, spec: &str, capacity: usize, resolve: F) -> Result<ChannelRef>
    where
        F: FnOnce(&str) -> Result<ChannelFactory>,
    {
        let parsed = ChannelSpec::parse(spec)?;
        let mut channels = self.channels.lock();

        if let Some(existing) = channels.get(parsed.name) {
            if existing.type_name() != parsed.type_name {
                return Err(PipelineError::ChannelTypeMismatch {
                    name: parsed.name.to_string(),
                    existing: existing.type_name().to_string(),
                    requested: parsed.type_name.to_string(),
                });
            }
            return Ok(existing.clone());
        }

        let factory = resolve(parsed.type_name)?;
        let channel = factory(capacity);
        if channel.type_name() != parsed.type_name {
            return Err(PipelineError::ConstructorMismatch {
                name: parsed.type_name.to_string(),
                expected: "matching channel",
                found: "foreign channel",
            });
        }

        debug!(
            channel = parsed.name,
            r#type = parsed.type_name,
            capacity = channel.capacity(),
            "created channel"
        );
        channels.insert(parsed.name.to_string(), channel.clone());
        Ok(channel)
    }

    /// Look up an existing channel by name
    pub fn get(&self, name: &str) -> Option<ChannelRef> {
        self.channels.lock().get(name).cloned()
    }

    /// Names of all channels, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of channels created
    pub fn len(&self) -> usize {
        self.channels.lock().len()
    }

    /// Whether no channel has been created
    pub fn is_empty(&self) -> bool {
        self.channels.lock().is_empty()
    }

    /// Drop the broker's own senders once wiring is complete
    ///
    /// After sealing, a channel closes as soon as every producing stage
    /// has dropped its sender. A channel that no stage reads would fill
    /// up and block its producers, so it is an error; the first such
    /// name in sorted order is reported.
    pub fn seal(&self) -> Result<()> {
        let channels = self.channels.lock();
        let mut orphans: Vec<&str> = Vec::new();
        for (name, channel) in channels.iter() {
            if !channel.has_consumer() {
                orphans.push(name);
            }
            channel.seal();
        }
        orphans.sort_unstable();
        match orphans.first() {
            Some(name) => Err(PipelineError::unconsumed_channel(*name)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "broker_test.rs"]
mod broker_test;

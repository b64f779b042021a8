//! Named channels
//!
//! A channel is a bounded `tokio::sync::mpsc` queue with a declared type
//! name. Stages see channels as `ChannelRef` (type-erased) and downcast
//! to the concrete `Channel<T>` when they bind to it.
//!
//! # Lifecycle
//!
//! ```text
//! create ──→ bind (senders cloned, receiver taken once) ──→ seal ──→ closed
//!                                                          │
//!                       broker drops its own sender ───────┘  when the last
//!                                                             stage sender drops
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use vigil_protocol::Record;

use crate::error::{PipelineError, Result, StageError, StageResult};

/// Type name of the built-in record channel
pub const RECORD_CHANNEL: &str = "RecordChan";

/// Message carried by record channels
pub type RecordMsg = Arc<Record>;

/// Shared, type-erased channel handle
pub type ChannelRef = Arc<dyn AnyChannel>;

/// Constructor for a channel type (capacity argument)
pub type ChannelFactory = fn(usize) -> ChannelRef;

/// Type-erased view of a `Channel<T>`
pub trait AnyChannel: Send + Sync + fmt::Debug {
    /// Declared type name (e.g. `RecordChan`)
    fn type_name(&self) -> &str;

    /// Capacity fixed at construction
    fn capacity(&self) -> usize;

    /// Drop the broker-held sender so closure is driven by stages only
    fn seal(&self);

    /// Whether the receiving half has been taken by a consumer
    fn has_consumer(&self) -> bool;

    /// Downcast support
    fn as_any(&self) -> &dyn Any;
}

/// A named, bounded, typed queue
pub struct Channel<T> {
    type_name: String,
    capacity: usize,
    sender: Mutex<Option<mpsc::Sender<T>>>,
    receiver: Mutex<Option<mpsc::Receiver<T>>>,
}

impl<T: Send + 'static> Channel<T> {
    /// Create a channel; a capacity of 0 is raised to 1
    pub fn new(type_name: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            type_name: type_name.into(),
            capacity,
            sender: Mutex::new(Some(tx)),
            receiver: Mutex::new(Some(rx)),
        }
    }

    /// Clone a sending half (`None` once sealed)
    pub fn sender(&self) -> Option<mpsc::Sender<T>> {
        self.sender.lock().clone()
    }

    /// Take the receiving half (`None` if already taken)
    pub fn take_receiver(&self) -> Option<mpsc::Receiver<T>> {
        self.receiver.lock().take()
    }

    /// Whether `seal()` has been called
    pub fn is_sealed(&self) -> bool {
        self.sender.lock().is_none()
    }
}

impl<T: Send + 'static> AnyChannel for Channel<T> {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn seal(&self) {
        self.sender.lock().take();
    }

    fn has_consumer(&self) -> bool {
        self.receiver.lock().is_none()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("type_name", &self.type_name)
            .field("capacity", &self.capacity)
            .field("sealed", &self.sender.lock().is_none())
            .field("consumed", &self.receiver.lock().is_none())
            .finish()
    }
}

/// Downcast a channel handle to its concrete type
pub fn downcast<T: Send + 'static>(channel: &ChannelRef) -> Option<&Channel<T>> {
    channel.as_any().downcast_ref::<Channel<T>>()
}

/// Bind as producer: clone a sender of the expected message type
pub fn bind_sender<T: Send + 'static>(channel: &ChannelRef) -> StageResult<mpsc::Sender<T>> {
    let typed = downcast::<T>(channel).ok_or_else(|| {
        StageError::channel(format!(
            "channel of type {} does not carry {}",
            channel.type_name(),
            std::any::type_name::<T>()
        ))
    })?;
    typed
        .sender()
        .ok_or_else(|| StageError::channel("channel is already sealed"))
}

/// Bind as consumer: take the receiver of the expected message type
pub fn bind_receiver<T: Send + 'static>(channel: &ChannelRef) -> StageResult<mpsc::Receiver<T>> {
    let typed = downcast::<T>(channel).ok_or_else(|| {
        StageError::channel(format!(
            "channel of type {} does not carry {}",
            channel.type_name(),
            std::any::type_name::<T>()
        ))
    })?;
    typed
        .take_receiver()
        .ok_or_else(|| StageError::channel("channel already has a consumer"))
}

/// Built-in constructor for `RecordChan`
pub fn new_record_channel(capacity: usize) -> ChannelRef {
    Arc::new(Channel::<RecordMsg>::new(RECORD_CHANNEL, capacity))
}

/// Parsed `"<name> <Type>"` channel reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSpec<'a> {
    pub name: &'a str,
    pub type_name: &'a str,
}

impl<'a> ChannelSpec<'a> {
    /// Parse a channel reference: exactly two whitespace-separated tokens
    pub fn parse(spec: &'a str) -> Result<Self> {
        let mut tokens = spec.split_whitespace();
        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(name), Some(type_name), None) => Ok(Self { name, type_name }),
            _ => Err(PipelineError::invalid_channel_spec(spec)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_parse() {
        let spec = ChannelSpec::parse("flat RecordChan").unwrap();
        assert_eq!(spec.name, "flat");
        assert_eq!(spec.type_name, "RecordChan");

        let spec = ChannelSpec::parse("  flat \t RecordChan ").unwrap();
        assert_eq!(spec.name, "flat");
    }

    #[test]
    fn test_spec_parse_rejects_wrong_token_count() {
        for bad in ["", "flat", "flat RecordChan extra", "   "] {
            let err = ChannelSpec::parse(bad).unwrap_err();
            assert!(matches!(err, PipelineError::InvalidChannelSpec { .. }), "{bad:?}");
        }
    }

    #[test]
    fn test_zero_capacity_raised() {
        let channel = Channel::<u32>::new("U32Chan", 0);
        assert_eq!(channel.capacity(), 1);
    }

    #[test]
    fn test_receiver_taken_once() {
        let channel: ChannelRef = new_record_channel(4);
        assert!(!channel.has_consumer());
        assert!(bind_receiver::<RecordMsg>(&channel).is_ok());
        assert!(channel.has_consumer());

        let err = bind_receiver::<RecordMsg>(&channel).unwrap_err();
        assert!(err.to_string().contains("already has a consumer"));
    }

    #[test]
    fn test_bind_wrong_message_type() {
        let channel: ChannelRef = new_record_channel(4);
        let err = bind_sender::<String>(&channel).unwrap_err();
        assert!(err.to_string().contains("RecordChan"));
        assert!(bind_receiver::<String>(&channel).is_err());
        // failed bind must not consume the receiver
        assert!(!channel.has_consumer());
    }

    #[tokio::test]
    async fn test_seal_closes_when_producers_drop() {
        let channel: ChannelRef = new_record_channel(4);
        let tx = bind_sender::<RecordMsg>(&channel).unwrap();
        let mut rx = bind_receiver::<RecordMsg>(&channel).unwrap();

        channel.seal();
        assert!(downcast::<RecordMsg>(&channel).unwrap().is_sealed());
        assert!(bind_sender::<RecordMsg>(&channel).is_err());

        tx.send(Arc::new(Record::new())).await.unwrap();
        drop(tx);

        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
    }
}

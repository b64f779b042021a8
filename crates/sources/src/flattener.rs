//! Flattener handler
//!
//! Turns one JSON object whose keys are field paths into a `Record`:
//!
//! ```json
//! {"sf.type": "PE", "sf.ts": 1700000000, "sf.proc.aname": ["bash", "sshd"],
//!  "_context": {"rules": [{"name": "shell", "priority": 2}]}}
//! ```
//!
//! Integers become `Int`, strings `Str`, booleans `Bool`, and arrays of
//! strings are joined with the list separator. `null` leaves the field
//! unset. Every path and kind is checked against the field schema; an
//! object that fails the check is logged and skipped.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use vigil_pipeline::{
    ChannelRef, Constructor, Handler, RawEvent, RecordMsg, StageError, StageResult, bind_sender,
};
use vigil_protocol::{Context, FieldValue, LIST_SEP, Record};

use crate::error::FlattenError;
use crate::metrics::SourceMetrics;

#[cfg(test)]
#[path = "flattener_test.rs"]
mod tests;

/// Registered handler name
pub const FLATTENER: &str = "Flattener";

/// Key holding the enrichment context
pub const CONTEXT_KEY: &str = "_context";

pub(crate) const CONSTRUCTOR: Constructor = Constructor::Handler(Flattener::boxed);

/// Convert a JSON object into a record
pub fn flatten(event: &Value) -> Result<Record, FlattenError> {
    let object = event.as_object().ok_or(FlattenError::NotAnObject)?;
    let mut record = Record::new();

    for (path, value) in object {
        if path == CONTEXT_KEY {
            let ctx: Context =
                serde_json::from_value(value.clone()).map_err(FlattenError::Context)?;
            *record.context_mut() = ctx;
            continue;
        }
        if let Some(value) = field_value(path, value)? {
            record.set_checked(path, value)?;
        }
    }

    Ok(record)
}

fn field_value(path: &str, value: &Value) -> Result<Option<FieldValue>, FlattenError> {
    Ok(Some(match value {
        Value::Null => return Ok(None),
        Value::Bool(b) => FieldValue::Bool(*b),
        Value::Number(n) => FieldValue::Int(
            n.as_i64()
                .ok_or_else(|| FlattenError::unsupported(path, "not a 64-bit signed integer"))?,
        ),
        Value::String(s) => FieldValue::Str(s.clone()),
        Value::Array(items) => {
            let parts = items
                .iter()
                .map(|item| {
                    item.as_str()
                        .ok_or_else(|| FlattenError::unsupported(path, "array of non-strings"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            FieldValue::Str(parts.join(LIST_SEP))
        }
        Value::Object(_) => return Err(FlattenError::unsupported(path, "nested object")),
    }))
}

/// Handler that flattens raw events into records
#[derive(Default)]
pub struct Flattener {
    outputs: Vec<mpsc::Sender<RecordMsg>>,
    metrics: Arc<SourceMetrics>,
}

impl Flattener {
    pub fn new() -> Self {
        Self::default()
    }

    fn boxed() -> Box<dyn Handler> {
        Box::new(Self::new())
    }

    pub fn metrics(&self) -> Arc<SourceMetrics> {
        self.metrics.clone()
    }
}

#[async_trait]
impl Handler for Flattener {
    fn name(&self) -> &str {
        FLATTENER
    }

    fn set_outputs(&mut self, channels: &[ChannelRef]) -> StageResult<()> {
        if channels.is_empty() {
            return Err(StageError::channel("Flattener needs at least one output channel"));
        }
        self.outputs = channels
            .iter()
            .map(bind_sender::<RecordMsg>)
            .collect::<StageResult<_>>()?;
        Ok(())
    }

    async fn handle(&mut self, event: RawEvent) -> StageResult<()> {
        let record = match flatten(&event) {
            Ok(record) => Arc::new(record),
            Err(e) => {
                self.metrics.event_skipped();
                warn!(error = %e, "skipping malformed event");
                return Ok(());
            }
        };

        for tx in &self.outputs {
            tx.send(record.clone())
                .await
                .map_err(|_| StageError::failed("output channel closed"))?;
        }
        self.metrics.record_sent();
        Ok(())
    }

    async fn cleanup(&mut self) -> StageResult<()> {
        let snapshot = self.metrics.snapshot();
        debug!(
            records = snapshot.records_sent,
            skipped = snapshot.events_skipped,
            "flattener done"
        );
        // downstream sees the channels close once every sender is gone
        self.outputs.clear();
        Ok(())
    }
}

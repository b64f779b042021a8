//! Record Transcoder
//!
//! Converts a `Record` into a `TelemetryRecord` of the configured shape.
//!
//! # Structured gating
//!
//! | Section     | Present when                    |
//! |-------------|---------------------------------|
//! | `proc`      | always                          |
//! | `node`      | always                          |
//! | `pproc`     | `sf.pproc.pid` != 0             |
//! | `container` | `sf.container.id` non-empty     |
//! | `net`       | type is NF                      |
//! | `file`      | type is FF or FE                |
//! | `flow`      | type is FF or NF                |

use std::collections::BTreeMap;
use std::sync::Arc;

use vigil_protocol::{Domain, EventType, FIELDS, FieldKind, FieldValue, Record, field, lookup};

use crate::ecs::{EcsProjection, MinimalEcs};
use crate::error::{Result, TranscodeError};
use crate::event::{DataRecord, EcsEvent, EventBody, FlatRecord, TelemetryRecord};
use crate::identity::identity;
use crate::policy::policies;
use crate::setters::{Target, extract_value, table};
use crate::shape::Shape;

#[cfg(test)]
#[path = "transcoder_test.rs"]
mod tests;

/// Default output format version
pub const DEFAULT_VERSION: &str = "0.1";

/// Converts records into exported events
#[derive(Clone)]
pub struct Transcoder {
    shape: Shape,
    version: String,
    projection: Arc<dyn EcsProjection>,
}

impl Transcoder {
    /// Create a transcoder with the default version and `MinimalEcs`
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            version: DEFAULT_VERSION.to_string(),
            projection: Arc::new(MinimalEcs),
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn with_projection(mut self, projection: Arc<dyn EcsProjection>) -> Self {
        self.projection = projection;
        self
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Transcode a record into the configured shape
    pub fn transcode(&self, record: &Record) -> Result<TelemetryRecord> {
        check_fields(record)?;

        let body = match self.shape {
            Shape::Flat => EventBody::Flat(flat(record)),
            Shape::Structured => EventBody::Structured(structured(record)?),
            Shape::Ecs => return self.ecs(record),
        };
        Ok(self.wrap(record, body))
    }

    fn wrap(&self, record: &Record, body: EventBody) -> TelemetryRecord {
        let ctx = record.context();
        TelemetryRecord {
            version: self.version.clone(),
            body,
            hashes: (!ctx.hashes().is_empty()).then(|| ctx.hashes().clone()),
            policies: policies(ctx.rules()),
        }
    }

    fn ecs(&self, record: &Record) -> Result<TelemetryRecord> {
        let mut event = self.wrap(record, EventBody::Structured(structured(record)?));
        let key = identity(&event)?;
        let document = self.projection.project(&event, &key)?;

        let EventBody::Structured(source) = event.body else {
            return Err(TranscodeError::projection("structured body lost"));
        };
        event.body = EventBody::Ecs(EcsEvent { source, document });
        Ok(event)
    }

    /// Serialize an event to one JSON line (without the newline)
    pub fn encode(&self, event: &TelemetryRecord) -> Result<String> {
        Ok(serde_json::to_string(event)?)
    }
}

impl std::fmt::Debug for Transcoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transcoder")
            .field("shape", &self.shape)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// Transcode with default settings
pub fn transcode(record: &Record, shape: Shape) -> Result<TelemetryRecord> {
    Transcoder::new(shape).transcode(record)
}

/// Every field must be known and of its declared kind
fn check_fields(record: &Record) -> Result<()> {
    for (path, value) in record.fields() {
        let def = lookup(path).ok_or_else(|| TranscodeError::unknown_field(path))?;
        if def.kind != value.kind() {
            return Err(TranscodeError::kind_mismatch(path, def.kind, value.kind()));
        }
    }
    Ok(())
}

fn value_or_zero(record: &Record, path: &str, kind: FieldKind) -> FieldValue {
    record
        .get(path)
        .cloned()
        .unwrap_or_else(|| FieldValue::zero(kind))
}

fn flat(record: &Record) -> FlatRecord {
    let record = FIELDS
        .iter()
        .map(|def| {
            let value = value_or_zero(record, def.path, def.kind);
            (def.path.to_string(), value.to_json())
        })
        .collect::<BTreeMap<_, _>>();
    FlatRecord { record }
}

fn gated(domain: Domain, event_type: Option<EventType>, record: &Record) -> bool {
    match domain {
        Domain::Proc | Domain::Node => true,
        Domain::Pproc => record.int(field::PPROC_PID) != 0,
        Domain::Container => !record.str(field::CONTAINER_ID).is_empty(),
        Domain::Net => event_type.is_some_and(EventType::is_network),
        Domain::File => event_type.is_some_and(EventType::is_file),
        Domain::Flow => event_type.is_some_and(EventType::is_flow),
    }
}

fn structured(record: &Record) -> Result<DataRecord> {
    let event_type = record.str(field::TYPE).parse::<EventType>().ok();
    let mut data = DataRecord::default();

    for setter in table()?.iter() {
        let def = setter.def;
        let value = value_or_zero(record, def.path, def.kind);
        match setter.target {
            Target::Scalar(set) => set(&mut data, &value),
            Target::Section(domain) => {
                if gated(domain, event_type, record) {
                    data.section_mut(domain)
                        .insert(def.attr().to_string(), extract_value(def, &value));
                }
            }
        }
    }

    Ok(data)
}

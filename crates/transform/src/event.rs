//! Exported event model
//!
//! ```text
//! Flat        {"version", "record": {"sf.ts": .., "sf.net.sip": ..}, "hashes"?, "policies"}
//! Structured  {"version", "type", "opflags", "ret", "ts", "proc": {..}, "net"?: {..}, .., "hashes"?, "policies"}
//! Ecs         whatever the projection builds from the structured body
//! ```

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use serde_json::Value;
use vigil_protocol::{Domain, FieldDef, FieldValue, Hashes, field};

use crate::policy::Policy;
use crate::shape::Shape;

/// One domain sub-structure: attribute name to value
pub type Section = BTreeMap<String, Value>;

/// Flat body: every known field path with its value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlatRecord {
    pub record: BTreeMap<String, Value>,
}

impl FlatRecord {
    /// Value of a field, if present
    pub fn value(&self, def: &FieldDef) -> Option<&Value> {
        self.record.get(def.path)
    }
}

/// Structured body
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataRecord {
    #[serde(rename = "type")]
    pub event_type: String,
    pub opflags: Vec<String>,
    pub ret: i64,
    pub ts: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proc: Option<Section>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pproc: Option<Section>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net: Option<Section>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<Section>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow: Option<Section>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<Section>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<Section>,
}

impl DataRecord {
    pub fn section(&self, domain: Domain) -> Option<&Section> {
        match domain {
            Domain::Proc => self.proc.as_ref(),
            Domain::Pproc => self.pproc.as_ref(),
            Domain::Net => self.net.as_ref(),
            Domain::File => self.file.as_ref(),
            Domain::Flow => self.flow.as_ref(),
            Domain::Container => self.container.as_ref(),
            Domain::Node => self.node.as_ref(),
        }
    }

    /// Sub-structure for `domain`, allocated on first use
    pub fn section_mut(&mut self, domain: Domain) -> &mut Section {
        let slot = match domain {
            Domain::Proc => &mut self.proc,
            Domain::Pproc => &mut self.pproc,
            Domain::Net => &mut self.net,
            Domain::File => &mut self.file,
            Domain::Flow => &mut self.flow,
            Domain::Container => &mut self.container,
            Domain::Node => &mut self.node,
        };
        slot.get_or_insert_with(Section::new)
    }

    /// Value of a field, if the structure carries it
    pub fn value(&self, def: &FieldDef) -> Option<Value> {
        if let Some(domain) = def.domain() {
            return self.section(domain)?.get(def.attr()).cloned();
        }
        match def.path {
            field::TYPE => Some(Value::from(self.event_type.as_str())),
            field::OPFLAGS => Some(Value::from(self.opflags.clone())),
            field::RET => Some(Value::from(self.ret)),
            field::TS => Some(Value::from(self.ts)),
            field::ENDTS => self.endts.map(Value::from),
            field::SCHEMA => self.schema.map(Value::from),
            _ => None,
        }
    }
}

/// ECS body: the projected document and the structure it came from
#[derive(Debug, Clone, PartialEq)]
pub struct EcsEvent {
    pub source: DataRecord,
    pub document: Value,
}

/// Shape-specific body of an exported event
#[derive(Debug, Clone, PartialEq)]
pub enum EventBody {
    Flat(FlatRecord),
    Structured(DataRecord),
    Ecs(EcsEvent),
}

impl EventBody {
    pub fn shape(&self) -> Shape {
        match self {
            Self::Flat(_) => Shape::Flat,
            Self::Structured(_) => Shape::Structured,
            Self::Ecs(_) => Shape::Ecs,
        }
    }

    /// Value of a field in whichever shape this is
    ///
    /// ECS bodies answer from the structure they were projected from.
    pub fn value(&self, def: &FieldDef) -> Option<Value> {
        match self {
            Self::Flat(flat) => flat.value(def).cloned(),
            Self::Structured(data) => data.value(def),
            Self::Ecs(ecs) => ecs.source.value(def),
        }
    }
}

/// One exported event
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    pub version: String,
    pub body: EventBody,
    pub hashes: Option<Hashes>,
    pub policies: Vec<Policy>,
}

impl TelemetryRecord {
    pub fn shape(&self) -> Shape {
        self.body.shape()
    }

    /// Field value, or the zero value of its kind when absent
    pub fn value_or_zero(&self, def: &FieldDef) -> Value {
        self.body
            .value(def)
            .unwrap_or_else(|| FieldValue::zero(def.kind).to_json())
    }
}

#[derive(Serialize)]
struct Wire<'a> {
    version: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<&'a BTreeMap<String, Value>>,
    #[serde(flatten)]
    data: Option<&'a DataRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hashes: Option<&'a Hashes>,
    policies: &'a [Policy],
}

impl Serialize for TelemetryRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (record, data) = match &self.body {
            EventBody::Ecs(ecs) => return ecs.document.serialize(serializer),
            EventBody::Flat(flat) => (Some(&flat.record), None),
            EventBody::Structured(data) => (None, Some(data)),
        };
        Wire {
            version: &self.version,
            record,
            data,
            hashes: self.hashes.as_ref(),
            policies: &self.policies,
        }
        .serialize(serializer)
    }
}

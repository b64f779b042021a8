//! ECS projection
//!
//! The transcoder builds the structured body first and hands it to an
//! `EcsProjection`. The built-in `MinimalEcs` only fills the envelope
//! (`ecs.version`, `@timestamp`, `event`) and nests the structured body
//! under `sysflow`; a detailed field mapping can be plugged in through
//! the trait.

use chrono::{DateTime, SecondsFormat};
use serde_json::{Map, Value, json};
use vigil_protocol::EventType;

use crate::error::{Result, TranscodeError};
use crate::event::{EventBody, TelemetryRecord};

/// ECS version emitted by `MinimalEcs`
pub const ECS_VERSION: &str = "8.11.0";

/// Projects a structured event into an ECS document
pub trait EcsProjection: Send + Sync {
    /// `event` is always in the structured shape; `identity` is its key
    fn project(&self, event: &TelemetryRecord, identity: &str) -> Result<Value>;
}

/// Envelope-only projection
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimalEcs;

fn category(event_type: &str) -> &'static str {
    match event_type.parse::<EventType>() {
        Ok(EventType::ProcEvent | EventType::ProcFlow) => "process",
        Ok(EventType::FileFlow | EventType::FileEvent) => "file",
        Ok(EventType::NetFlow) => "network",
        Err(_) => "host",
    }
}

impl EcsProjection for MinimalEcs {
    fn project(&self, event: &TelemetryRecord, identity: &str) -> Result<Value> {
        let EventBody::Structured(data) = &event.body else {
            return Err(TranscodeError::projection(format!(
                "expected structured event, got {}",
                event.shape()
            )));
        };

        let timestamp = DateTime::from_timestamp_nanos(data.ts)
            .to_rfc3339_opts(SecondsFormat::Nanos, true);
        let kind = if event.policies.is_empty() { "event" } else { "alert" };

        let mut doc = Map::new();
        doc.insert("version".into(), Value::from(event.version.as_str()));
        doc.insert("ecs".into(), json!({ "version": ECS_VERSION }));
        doc.insert("@timestamp".into(), Value::from(timestamp));
        doc.insert(
            "event".into(),
            json!({
                "kind": kind,
                "category": [category(&data.event_type)],
                "id": identity,
            }),
        );
        doc.insert("sysflow".into(), serde_json::to_value(data)?);

        if let Some(hashes) = &event.hashes {
            doc.insert("hashes".into(), serde_json::to_value(hashes)?);
        }
        if !event.policies.is_empty() {
            let rules: Vec<Value> = event
                .policies
                .iter()
                .map(|p| {
                    json!({
                        "id": p.id,
                        "description": p.desc,
                        "priority": p.priority,
                        "tags": p.tags,
                    })
                })
                .collect();
            doc.insert("rule".into(), Value::from(rules));
        }

        Ok(Value::Object(doc))
    }
}

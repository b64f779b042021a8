//! Identity Hasher
//!
//! A stable key for an event, independent of the shape it was exported
//! in. The key is the lowercase hex SHA-256 of a canonical JSON array:
//!
//! ```text
//! [node.id, (container.id,) ts, proc.tid, proc.createts, type,
//!  file.oid                                    -- FF, FE
//!  net.sip, net.sport, net.dip, net.dport, net.proto  -- NF]
//! ```
//!
//! The container id is part of the tuple only when it is non-empty.

use serde_json::Value;
use sha2::{Digest, Sha256};
use vigil_protocol::{EventType, FieldDef, field, lookup};

use crate::error::{Result, TranscodeError};
use crate::event::TelemetryRecord;

const FILE_KEY: &[&str] = &[field::FILE_OID];

const NET_KEY: &[&str] = &[
    field::NET_SIP,
    field::NET_SPORT,
    field::NET_DIP,
    field::NET_DPORT,
    field::NET_PROTO,
];

fn def(path: &str) -> Result<&'static FieldDef> {
    lookup(path).ok_or_else(|| TranscodeError::unknown_field(path))
}

/// The ordered identity tuple of an event
pub fn identity_tuple(event: &TelemetryRecord) -> Result<Vec<Value>> {
    let value = |path: &str| -> Result<Value> { Ok(event.value_or_zero(def(path)?)) };

    let mut tuple = Vec::with_capacity(11);
    tuple.push(value(field::NODE_ID)?);

    let container = value(field::CONTAINER_ID)?;
    if container.as_str().is_some_and(|id| !id.is_empty()) {
        tuple.push(container);
    }

    tuple.push(value(field::TS)?);
    tuple.push(value(field::PROC_TID)?);
    tuple.push(value(field::PROC_CREATETS)?);

    let event_type = value(field::TYPE)?;
    let parsed = event_type.as_str().and_then(|t| t.parse::<EventType>().ok());
    tuple.push(event_type);

    let extra: &[&str] = match parsed {
        Some(ty) if ty.is_file() => FILE_KEY,
        Some(ty) if ty.is_network() => NET_KEY,
        _ => &[],
    };
    for path in extra.iter().copied() {
        tuple.push(value(path)?);
    }

    Ok(tuple)
}

/// Lowercase hex SHA-256 of the identity tuple
pub fn identity(event: &TelemetryRecord) -> Result<String> {
    let tuple = identity_tuple(event)?;
    let canonical = serde_json::to_vec(&tuple)?;
    Ok(hex::encode(Sha256::digest(&canonical)))
}

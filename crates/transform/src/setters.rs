//! Static setter table
//!
//! Maps every known field path to the place it lands in a `DataRecord`.
//! Two-segment paths have a typed scalar setter; three-segment paths go
//! into the sub-structure named by their middle segment. The table is
//! built once and checked against `FIELDS`: every field must have
//! exactly one entry and every scalar attribute exactly one field.

use std::sync::OnceLock;

use serde_json::Value;
use tracing::debug;
use vigil_protocol::{Domain, FIELDS, FieldDef, FieldValue, LIST_SEP, field};

use crate::error::{Result, TranscodeError};
use crate::event::DataRecord;

#[cfg(test)]
#[path = "setters_test.rs"]
mod tests;

/// Typed setter for a scalar attribute; the value is already kind-checked
pub type ScalarSetter = fn(&mut DataRecord, &FieldValue);

/// Where a field lands in the structured shape
#[derive(Clone, Copy)]
pub enum Target {
    Scalar(ScalarSetter),
    Section(Domain),
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Scalar(_) => f.write_str("Scalar"),
            Target::Section(domain) => write!(f, "Section({domain})"),
        }
    }
}

/// One table entry
#[derive(Debug, Clone, Copy)]
pub struct Setter {
    pub def: &'static FieldDef,
    pub target: Target,
}

/// Setters for every known field, in `FIELDS` order
#[derive(Debug)]
pub struct SetterTable {
    setters: Vec<Setter>,
}

// ============================================================================
// Scalar setters
// ============================================================================

fn set_type(data: &mut DataRecord, value: &FieldValue) {
    data.event_type = value.as_str().unwrap_or_default().to_string();
}

fn set_opflags(data: &mut DataRecord, value: &FieldValue) {
    data.opflags = split_list(value.as_str().unwrap_or_default());
}

fn set_ret(data: &mut DataRecord, value: &FieldValue) {
    data.ret = value.as_int().unwrap_or_default();
}

fn set_ts(data: &mut DataRecord, value: &FieldValue) {
    data.ts = value.as_int().unwrap_or_default();
}

fn set_endts(data: &mut DataRecord, value: &FieldValue) {
    data.endts = value.as_int().filter(|v| *v != 0);
}

fn set_schema(data: &mut DataRecord, value: &FieldValue) {
    data.schema = value.as_int().filter(|v| *v != 0);
}

const SCALARS: &[(&str, ScalarSetter)] = &[
    (field::TYPE, set_type),
    (field::OPFLAGS, set_opflags),
    (field::RET, set_ret),
    (field::TS, set_ts),
    (field::ENDTS, set_endts),
    (field::SCHEMA, set_schema),
];

// ============================================================================
// Table
// ============================================================================

impl SetterTable {
    /// Build the table for `fields` and check it covers them
    pub fn build(fields: &'static [FieldDef]) -> Result<Self> {
        let mut setters = Vec::with_capacity(fields.len());
        let mut scalars_used = vec![0usize; SCALARS.len()];

        for def in fields {
            let target = match def.depth() {
                2 => {
                    let idx = SCALARS
                        .iter()
                        .position(|(path, _)| *path == def.path)
                        .ok_or_else(|| {
                            TranscodeError::Table(format!("no scalar setter for '{}'", def.path))
                        })?;
                    scalars_used[idx] += 1;
                    Target::Scalar(SCALARS[idx].1)
                }
                3 => Target::Section(def.domain().ok_or_else(|| {
                    TranscodeError::Table(format!("unknown domain in '{}'", def.path))
                })?),
                _ => {
                    return Err(TranscodeError::Table(format!(
                        "'{}' is not a 2 or 3 segment path",
                        def.path
                    )));
                }
            };
            setters.push(Setter { def, target });
        }

        for ((path, _), used) in SCALARS.iter().zip(&scalars_used) {
            if *used != 1 {
                return Err(TranscodeError::Table(format!(
                    "scalar '{path}' is declared {used} times"
                )));
            }
        }

        Ok(Self { setters })
    }

    /// Entries in field order
    pub fn iter(&self) -> impl Iterator<Item = &Setter> {
        self.setters.iter()
    }

    pub fn len(&self) -> usize {
        self.setters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.setters.is_empty()
    }
}

/// The table for the built-in schema, built on first use
pub fn table() -> Result<&'static SetterTable> {
    static TABLE: OnceLock<std::result::Result<SetterTable, String>> = OnceLock::new();
    TABLE
        .get_or_init(|| {
            let table = SetterTable::build(FIELDS).map_err(|e| e.to_string());
            if let Ok(table) = &table {
                debug!(fields = table.len(), "built setter table");
            }
            table
        })
        .as_ref()
        .map_err(|msg| TranscodeError::Table(msg.clone()))
}

/// Split a list-like string field; an empty string is an empty list
pub fn split_list(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    value.split(LIST_SEP).map(str::to_string).collect()
}

/// JSON value of a field in the structured shape
pub fn extract_value(def: &FieldDef, value: &FieldValue) -> Value {
    match value {
        FieldValue::Str(s) if def.list => Value::from(split_list(s)),
        other => other.to_json(),
    }
}

//! Record - one telemetry event plus its enrichment context
//!
//! Records are produced by an ingress stage, wrapped in `Arc` and passed
//! read-only to downstream stages. Only the policy stage mutates the
//! context, before the record is shared.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::ProtocolError;
use crate::schema::{self, FieldKind};

/// A single field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl FieldValue {
    /// Zero value of a kind (what a missing field reads as)
    pub fn zero(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Int => Self::Int(0),
            FieldKind::Str => Self::Str(String::new()),
            FieldKind::Bool => Self::Bool(false),
        }
    }

    /// Kind of this value
    #[inline]
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Bool(_) => FieldKind::Bool,
            Self::Int(_) => FieldKind::Int,
            Self::Str(_) => FieldKind::Str,
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// True for `0`, `""` and `false`
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Bool(v) => !v,
            Self::Int(v) => *v == 0,
            Self::Str(v) => v.is_empty(),
        }
    }

    /// Convert to a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(v) => serde_json::Value::Bool(*v),
            Self::Int(v) => serde_json::Value::from(*v),
            Self::Str(v) => serde_json::Value::String(v.clone()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// Telemetry record
///
/// # Example
///
/// ```
/// use vigil_protocol::{field, Record};
///
/// let record = Record::new()
///     .with(field::TYPE, "NF")
///     .with(field::NET_SIP, "10.0.0.1")
///     .with(field::NET_SPORT, 443);
///
/// assert_eq!(record.str(field::NET_SIP), "10.0.0.1");
/// assert_eq!(record.int(field::TS), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: HashMap<String, FieldValue>,
    ctx: Context,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter (unchecked)
    #[must_use]
    pub fn with(mut self, path: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(path, value);
        self
    }

    /// Attach an enrichment context
    #[must_use]
    pub fn with_context(mut self, ctx: Context) -> Self {
        self.ctx = ctx;
        self
    }

    /// Set a field without consulting the schema
    ///
    /// Returns the previous value, if any. Unknown paths or mismatched
    /// kinds are reported later, when the record is transcoded.
    pub fn set(
        &mut self,
        path: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.fields.insert(path.into(), value.into())
    }

    /// Set a field after validating path and kind against the schema
    pub fn set_checked(
        &mut self,
        path: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), ProtocolError> {
        let value = value.into();
        let def = schema::lookup(path).ok_or_else(|| ProtocolError::unknown_field(path))?;
        if def.kind != value.kind() {
            return Err(ProtocolError::kind_mismatch(path, def.kind, value.kind()));
        }
        self.fields.insert(def.path.to_string(), value);
        Ok(())
    }

    /// Raw field access
    #[inline]
    pub fn get(&self, path: &str) -> Option<&FieldValue> {
        self.fields.get(path)
    }

    /// Integer field, `0` when missing or not an integer
    #[inline]
    pub fn int(&self, path: &str) -> i64 {
        self.get(path).and_then(FieldValue::as_int).unwrap_or(0)
    }

    /// String field, `""` when missing or not a string
    #[inline]
    pub fn str(&self, path: &str) -> &str {
        self.get(path).and_then(FieldValue::as_str).unwrap_or("")
    }

    /// Boolean field, `false` when missing or not a boolean
    #[inline]
    pub fn bool(&self, path: &str) -> bool {
        self.get(path).and_then(FieldValue::as_bool).unwrap_or(false)
    }

    /// Iterate over all fields present on the record (unordered)
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields present
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if no fields are present
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Enrichment context
    #[inline]
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Mutable enrichment context (policy stage only)
    #[inline]
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }
}

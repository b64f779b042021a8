//! Enrichment context
//!
//! Attached to a record by the policy stage. The exporter only reads it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Content digests computed upstream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hashes {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub md5: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sha1: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sha256: String,
}

impl Hashes {
    /// True when no digest is set
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.md5.is_empty() && self.sha1.is_empty() && self.sha256.is_empty()
    }
}

/// Enrichment tag attached to a matched rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnrichmentTag {
    List(Vec<String>),
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for EnrichmentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(items) => write!(f, "[{}]", items.join(" ")),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
        }
    }
}

impl From<&str> for EnrichmentTag {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<Vec<String>> for EnrichmentTag {
    fn from(v: Vec<String>) -> Self {
        Self::List(v)
    }
}

/// A policy rule that matched the record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    pub name: String,
    pub desc: String,
    pub priority: i64,
    pub tags: Vec<EnrichmentTag>,
}

impl Rule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<EnrichmentTag>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Hashes and matched rules for one record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Context {
    pub hashes: Hashes,
    pub rules: Vec<Rule>,
}

impl Context {
    #[inline]
    pub fn hashes(&self) -> &Hashes {
        &self.hashes
    }

    #[inline]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn set_hashes(&mut self, hashes: Hashes) {
        self.hashes = hashes;
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }
}

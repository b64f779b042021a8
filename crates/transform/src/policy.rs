//! Policy annotations on exported events

use serde::{Deserialize, Serialize};
use vigil_protocol::{EnrichmentTag, Rule};

/// A matched rule as it appears on the wire
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub id: String,
    pub desc: String,
    pub priority: i64,
    pub tags: Vec<String>,
}

impl From<&Rule> for Policy {
    fn from(rule: &Rule) -> Self {
        Self {
            id: rule.name.clone(),
            desc: rule.desc.clone(),
            priority: rule.priority,
            tags: flatten_tags(&rule.tags),
        }
    }
}

/// Flatten scalar and list tags into one list of strings
pub fn flatten_tags(tags: &[EnrichmentTag]) -> Vec<String> {
    let mut out = Vec::with_capacity(tags.len());
    for tag in tags {
        match tag {
            EnrichmentTag::List(items) => out.extend(items.iter().cloned()),
            scalar => out.push(scalar.to_string()),
        }
    }
    out
}

/// Policies for every rule in the record context
pub fn policies(rules: &[Rule]) -> Vec<Policy> {
    rules.iter().map(Policy::from).collect()
}

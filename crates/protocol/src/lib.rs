//! Vigil Protocol - Core record types for the telemetry pipeline
//!
//! This crate provides the foundational types that flow through the pipeline:
//! - `Record` - A loosely-typed bag of telemetry fields addressed by dotted path
//! - `FieldValue` - Int, string or boolean field value
//! - `Context` - Enrichment attached by the policy stage (hashes, matched rules)
//! - `FieldDef` / `FIELDS` - The ordered table of every known field path
//! - `EventType` - PE, PF, FF, FE, NF
//!
//! # Field Paths
//!
//! Every known field lives under the `sf` domain:
//!
//! ```text
//! sf.ts            2 segments → scalar attribute on the output record
//! sf.net.sip       3 segments → attribute of the `net` sub-structure
//! ```
//!
//! # Design Principles
//!
//! - **Schema is data**: `FIELDS` is a static table, consumers iterate it in order
//! - **Arc-friendly**: records are wrapped in `Arc` once and shared read-only
//! - **Missing is zero**: an absent field reads as the zero value of its kind

mod context;
mod error;
mod record;
mod schema;

pub use context::{Context, EnrichmentTag, Hashes, Rule};
pub use error::ProtocolError;
pub use record::{FieldValue, Record};
pub use schema::{Domain, EventType, FIELDS, FieldDef, FieldKind, LIST_SEP, field, lookup};

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod record_test;

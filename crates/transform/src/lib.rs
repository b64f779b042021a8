//! Vigil - Transform
//!
//! Record transcoding for export.
//!
//! # Overview
//!
//! A `Record` is a loosely-typed bag of field paths. Before it leaves the
//! pipeline it is transcoded into one of three wire shapes:
//!
//! ```text
//!                 ┌──→ Flat        {"record": {"sf.ts": .., ..}}
//! [Record] ──→ Transcoder ──→ Structured  {"ts": .., "proc": {..}, "net": {..}}
//!                 └──→ Ecs         EcsProjection(Structured)
//! ```
//!
//! Every shape carries the same identity key (see [`identity`]), so an
//! event can be correlated across sinks that use different shapes.
//!
//! # Design Principles
//!
//! - **Static setter table**: structured output is driven by a table built
//!   once from the field schema, not by reflection
//! - **Checked per record**: unknown fields and kind mismatches are
//!   `TranscodeError`s for that record only
//! - **Pluggable ECS**: the projection is a trait object

mod ecs;
mod error;
mod event;
mod identity;
mod policy;
mod setters;
mod shape;
mod transcoder;

pub use ecs::{ECS_VERSION, EcsProjection, MinimalEcs};
pub use error::{Result, TranscodeError};
pub use event::{DataRecord, EcsEvent, EventBody, FlatRecord, Section, TelemetryRecord};
pub use identity::{identity, identity_tuple};
pub use policy::{Policy, flatten_tags, policies};
pub use setters::{Setter, SetterTable, Target, split_list, table};
pub use shape::Shape;
pub use transcoder::{DEFAULT_VERSION, Transcoder, transcode};

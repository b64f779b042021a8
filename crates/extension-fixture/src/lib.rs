//! Vigil - Extension Fixture
//!
//! A module exporting one component of each shape, plus a declaration
//! built against a newer extension API. Only the pipeline's module tests
//! load it.

use std::sync::Arc;

use async_trait::async_trait;
use vigil_pipeline::{
    Channel, ChannelRef, Constructor, EXTENSION_API_VERSION, Handler, Processor, RawEvent,
    StageContext, StageDeclaration, StageResult, declare_stage,
};

/// Processor that finishes as soon as it runs
struct Idle;

#[async_trait]
impl Processor for Idle {
    fn name(&self) -> &str {
        "Idle"
    }

    async fn run(&mut self, _ctx: StageContext) -> StageResult<()> {
        Ok(())
    }
}

/// Handler that accepts and drops every event
struct Tagger;

#[async_trait]
impl Handler for Tagger {
    fn name(&self) -> &str {
        "Tagger"
    }

    async fn handle(&mut self, _event: RawEvent) -> StageResult<()> {
        Ok(())
    }
}

fn new_idle() -> Box<dyn Processor> {
    Box::new(Idle)
}

fn new_tagger() -> Box<dyn Handler> {
    Box::new(Tagger)
}

fn new_audit_chan(capacity: usize) -> ChannelRef {
    Arc::new(Channel::<String>::new("AuditChan", capacity))
}

declare_stage!(NewIdle, Constructor::Processor(new_idle));
declare_stage!(NewTagger, Constructor::Handler(new_tagger));
declare_stage!(NewAuditChan, Constructor::Channel(new_audit_chan));

#[unsafe(no_mangle)]
#[allow(non_upper_case_globals)]
pub static NewStale: StageDeclaration = StageDeclaration {
    api_version: EXTENSION_API_VERSION + 1,
    vigil_version: "0.0.1",
    constructor: Constructor::Processor(new_idle),
};

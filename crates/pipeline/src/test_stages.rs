//! Small stages used by the pipeline tests

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use vigil_config::StageOptions;
use vigil_protocol::{Record, field};

use crate::channel::{ChannelRef, RecordMsg, bind_receiver, bind_sender};
use crate::error::{StageError, StageResult};
use crate::registry::ComponentRegistry;
use crate::stage::{Constructor, Handler, Processor, RawEvent, StageContext};

/// Records collected by `Collector` stages, keyed by their `sink` option
static COLLECTED: LazyLock<Mutex<HashMap<String, Vec<i64>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

pub fn collected(sink: &str) -> Vec<i64> {
    COLLECTED.lock().get(sink).cloned().unwrap_or_default()
}

fn option_int(options: &StageOptions, key: &str, default: i64) -> i64 {
    options
        .get(key)
        .and_then(|v| v.as_integer())
        .unwrap_or(default)
}

fn senders(channels: &[ChannelRef]) -> StageResult<Vec<mpsc::Sender<RecordMsg>>> {
    channels.iter().map(bind_sender::<RecordMsg>).collect()
}

/// Emits `count` records with `sf.ts` = 0..count, or runs until cancelled
/// when `count` is negative
#[derive(Default)]
pub struct Emitter {
    outputs: Vec<mpsc::Sender<RecordMsg>>,
    count: i64,
}

#[async_trait]
impl Processor for Emitter {
    fn name(&self) -> &str {
        "Emitter"
    }

    fn set_outputs(&mut self, channels: &[ChannelRef]) -> StageResult<()> {
        self.outputs = senders(channels)?;
        Ok(())
    }

    async fn init(&mut self, options: &StageOptions) -> StageResult<()> {
        self.count = option_int(options, "count", 3);
        Ok(())
    }

    async fn run(&mut self, ctx: StageContext) -> StageResult<()> {
        let mut ts = 0;
        while self.count < 0 || ts < self.count {
            if ctx.is_cancelled() {
                break;
            }
            let record = Arc::new(Record::new().with(field::TS, ts));
            for tx in &self.outputs {
                tx.send(record.clone())
                    .await
                    .map_err(|_| StageError::failed("output closed"))?;
            }
            ts += 1;
            tokio::task::yield_now().await;
        }
        Ok(())
    }
}

/// Stores the `sf.ts` of every record it receives
#[derive(Default)]
pub struct Collector {
    input: Option<mpsc::Receiver<RecordMsg>>,
    sink: String,
}

#[async_trait]
impl Processor for Collector {
    fn name(&self) -> &str {
        "Collector"
    }

    fn set_input(&mut self, channel: &ChannelRef) -> StageResult<()> {
        self.input = Some(bind_receiver(channel)?);
        Ok(())
    }

    async fn init(&mut self, options: &StageOptions) -> StageResult<()> {
        self.sink = options
            .get("sink")
            .and_then(|v| v.as_str())
            .ok_or_else(|| StageError::config("missing 'sink'"))?
            .to_string();
        Ok(())
    }

    async fn run(&mut self, _ctx: StageContext) -> StageResult<()> {
        let mut input = self
            .input
            .take()
            .ok_or_else(|| StageError::channel("no input bound"))?;
        while let Some(record) = input.recv().await {
            COLLECTED
                .lock()
                .entry(self.sink.clone())
                .or_default()
                .push(record.int(field::TS));
        }
        Ok(())
    }
}

/// Always fails when run
#[derive(Default)]
pub struct Failing;

#[async_trait]
impl Processor for Failing {
    fn name(&self) -> &str {
        "Failing"
    }

    async fn run(&mut self, _ctx: StageContext) -> StageResult<()> {
        Err(StageError::failed("boom"))
    }
}

/// Rejects its options
#[derive(Default)]
pub struct BadInit;

#[async_trait]
impl Processor for BadInit {
    fn name(&self) -> &str {
        "BadInit"
    }

    async fn init(&mut self, _options: &StageOptions) -> StageResult<()> {
        Err(StageError::config("bad options"))
    }

    async fn run(&mut self, _ctx: StageContext) -> StageResult<()> {
        Ok(())
    }
}

/// Drives its handler with `count` events `{"ts": n}`
pub struct Ticker {
    handler: Box<dyn Handler>,
    count: i64,
}

#[async_trait]
impl Processor for Ticker {
    fn name(&self) -> &str {
        "Ticker"
    }

    async fn init(&mut self, options: &StageOptions) -> StageResult<()> {
        self.count = option_int(options, "count", 3);
        Ok(())
    }

    async fn run(&mut self, _ctx: StageContext) -> StageResult<()> {
        for ts in 0..self.count {
            self.handler.handle(serde_json::json!({ "ts": ts })).await?;
        }
        self.handler.cleanup().await
    }
}

/// Turns `{"ts": n}` into a record on every output
#[derive(Default)]
pub struct Relay {
    outputs: Vec<mpsc::Sender<RecordMsg>>,
}

#[async_trait]
impl Handler for Relay {
    fn name(&self) -> &str {
        "Relay"
    }

    fn set_outputs(&mut self, channels: &[ChannelRef]) -> StageResult<()> {
        self.outputs = senders(channels)?;
        Ok(())
    }

    async fn handle(&mut self, event: RawEvent) -> StageResult<()> {
        let ts = event.get("ts").and_then(|v| v.as_i64()).unwrap_or_default();
        let record = Arc::new(Record::new().with(field::TS, ts));
        for tx in &self.outputs {
            tx.send(record.clone())
                .await
                .map_err(|_| StageError::failed("output closed"))?;
        }
        Ok(())
    }
}

pub fn new_emitter() -> Box<dyn Processor> {
    Box::new(Emitter::default())
}

pub fn new_collector() -> Box<dyn Processor> {
    Box::new(Collector::default())
}

pub fn new_failing() -> Box<dyn Processor> {
    Box::new(Failing)
}

pub fn new_bad_init() -> Box<dyn Processor> {
    Box::new(BadInit)
}

pub fn new_ticker(handler: Box<dyn Handler>) -> Box<dyn Processor> {
    Box::new(Ticker { handler, count: 0 })
}

pub fn new_relay() -> Box<dyn Handler> {
    Box::new(Relay::default())
}

/// Registry with every test stage registered
pub fn registry() -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();
    registry.register("Emitter", Constructor::Processor(new_emitter));
    registry.register("Collector", Constructor::Processor(new_collector));
    registry.register("Failing", Constructor::Processor(new_failing));
    registry.register("BadInit", Constructor::Processor(new_bad_init));
    registry.register("Ticker", Constructor::HandlerProcessor(new_ticker));
    registry.register("Relay", Constructor::Handler(new_relay));
    registry
}

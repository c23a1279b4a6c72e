// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Fortune Market Simulation Suite

pub mod types;
pub mod config;
pub mod rng;
pub mod policy;
pub mod ledger;
pub mod window;
pub mod schedule;
pub mod simulation;
pub mod clock;
pub mod stream;
pub mod clock_source;
pub mod display;

pub use types::*;
pub use config::{ConfigError, SimulationConfig};
pub use simulation::{BuyOrder, CatchUp, MarketSimulation, Phase, SimulationState};
pub use stream::{EventKind, Handler, StreamEvent, TokenStream};
pub use clock::{Clock, ManualClock, SystemClock};
pub use clock_source::{AnchorSync, ClockConfig, ClockError, ClockSource, ClockStore, SyncOutcome};

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use clock_source::FetchedStatus;
use wasm_bindgen::prelude::*;

// ─── WASM Interface ──────────────────────────────────────────────────────────

/// Browser handle. Events queue up inside and JS drains them after `pump()`.
#[wasm_bindgen]
pub struct WasmTokenStream {
    stream: TokenStream,
    sync: AnchorSync,
    queue: Rc<RefCell<VecDeque<StreamEvent>>>,
    sink: Handler,
}

#[wasm_bindgen]
impl WasmTokenStream {
    /// `config_json` may be partial; missing keys keep their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<WasmTokenStream, JsValue> {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        let config = match config_json {
            Some(json) => SimulationConfig::from_json(&json),
            None => Ok(SimulationConfig::default()),
        }
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let clock: Rc<dyn Clock> = Rc::new(SystemClock::new());
        let now = clock.now_ms();
        let stream =
            TokenStream::new(config, clock).map_err(|e| JsValue::from_str(&e.to_string()))?;

        let queue = Rc::new(RefCell::new(VecDeque::new()));
        let sink_queue = queue.clone();
        let sink: Handler = Rc::new(move |event: &StreamEvent| {
            sink_queue.borrow_mut().push_back(event.clone());
        });

        let mut handle = WasmTokenStream {
            stream,
            sync: AnchorSync::new(ClockConfig::default(), now),
            queue,
            sink,
        };
        handle.attach();
        Ok(handle)
    }

    /// Re-attaches the queue if an earlier `disconnect()` released it.
    pub fn connect(&mut self) {
        self.attach();
        self.stream.connect();
    }

    pub fn disconnect(&mut self) {
        self.stream.disconnect();
    }

    /// Anchor defaults to now. Returns `{replayed, skipped}`.
    pub fn start(&mut self, anchor_time: Option<f64>) -> JsValue {
        let catch_up = self.stream.start(anchor_time.map(|t| t as i64));
        serde_wasm_bindgen::to_value(&catch_up).unwrap_or(JsValue::NULL)
    }

    /// Number of transactions published by this call.
    pub fn pump(&mut self) -> u32 {
        self.stream.pump() as u32
    }

    /// Earliest of the next tick, the pending connect and the next clock poll.
    pub fn next_wake(&self) -> f64 {
        let poll = self.sync.next_poll_at();
        self.stream.next_wake().map_or(poll, |t| t.min(poll)) as f64
    }

    /// True once per poll interval, starting immediately. JS fetches the
    /// shared clock when this says so and passes the result back.
    pub fn clock_poll_due(&mut self) -> bool {
        let now = self.stream.now_ms();
        self.sync.take_due(now)
    }

    pub fn anchor_time(&self) -> Option<f64> {
        self.stream.get_anchor_time().map(|t| t as f64)
    }

    pub fn snapshot(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.stream.snapshot()).unwrap_or(JsValue::NULL)
    }

    /// Every event queued since the last drain, oldest first.
    pub fn drain_events(&mut self) -> JsValue {
        let events: Vec<StreamEvent> = self.queue.borrow_mut().drain(..).collect();
        serde_wasm_bindgen::to_value(&events).unwrap_or(JsValue::NULL)
    }

    /// Feed the body of a shared-clock GET response.
    pub fn apply_clock_status(&mut self, body: &str) -> JsValue {
        let outcome = self.sync.sync_now(&FetchedStatus::from_body(body), &mut self.stream);
        serde_wasm_bindgen::to_value(&outcome).unwrap_or(JsValue::NULL)
    }

    /// Report a failed shared-clock fetch.
    pub fn clock_unreachable(&mut self, reason: &str) -> JsValue {
        let source = FetchedStatus(Err(ClockError::Unreachable(reason.to_string())));
        let outcome = self.sync.sync_now(&source, &mut self.stream);
        serde_wasm_bindgen::to_value(&outcome).unwrap_or(JsValue::NULL)
    }
}

impl WasmTokenStream {
    fn attach(&mut self) {
        for kind in EventKind::ALL {
            self.stream.subscribe(kind, self.sink.clone());
        }
    }

    pub fn stream(&self) -> &TokenStream {
        &self.stream
    }
}

#[wasm_bindgen(js_name = formatUsd)]
pub fn format_usd(amount_usd: f64) -> String {
    display::format_usd(amount_usd)
}

#[wasm_bindgen(js_name = formatWallet)]
pub fn format_wallet(address: &str) -> String {
    display::format_wallet(address)
}

#[wasm_bindgen]
pub fn countdown(start_time: f64, now: f64, duration_secs: f64) -> JsValue {
    let view = display::Countdown::at(start_time as i64, now as i64, duration_secs as i64);
    serde_wasm_bindgen::to_value(&view).unwrap_or(JsValue::NULL)
}

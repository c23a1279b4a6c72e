// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Fortune Market Simulation - Token Stream
//
// Owns the engine and fans its output out to subscribers. Time only moves
// when the host calls `pump()`; the stream reads "now" from its `Clock`.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::config::{ConfigError, SimulationConfig};
use crate::schedule::Delay;
use crate::simulation::{CatchUp, MarketSimulation};
use crate::types::{TokenEvent, TokenStreamSnapshot};

// ─── Events ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Connected,
    Disconnected,
    PollingModeChanged,
    Snapshot,
    Update,
    Transaction,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Connected,
        EventKind::Disconnected,
        EventKind::PollingModeChanged,
        EventKind::Snapshot,
        EventKind::Update,
        EventKind::Transaction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Connected => "connected",
            EventKind::Disconnected => "disconnected",
            EventKind::PollingModeChanged => "polling-mode-changed",
            EventKind::Snapshot => "snapshot",
            EventKind::Update => "update",
            EventKind::Transaction => "transaction",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stream event '{0}'")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownEventKind(s.to_string()))
    }
}

/// Everything a subscriber can receive.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum StreamEvent {
    Connected,
    Disconnected,
    PollingModeChanged { active: bool },
    Snapshot(TokenStreamSnapshot),
    Update(TokenStreamSnapshot),
    Transaction(TokenEvent),
}

impl StreamEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            StreamEvent::Connected => EventKind::Connected,
            StreamEvent::Disconnected => EventKind::Disconnected,
            StreamEvent::PollingModeChanged { .. } => EventKind::PollingModeChanged,
            StreamEvent::Snapshot(_) => EventKind::Snapshot,
            StreamEvent::Update(_) => EventKind::Update,
            StreamEvent::Transaction(_) => EventKind::Transaction,
        }
    }
}

/// Subscribers are compared by pointer, so keep the `Rc` to unsubscribe later.
pub type Handler = Rc<dyn Fn(&StreamEvent)>;

// ─── TokenStream ─────────────────────────────────────────────────────────────

pub struct TokenStream {
    engine: MarketSimulation,
    clock: Rc<dyn Clock>,
    handlers: HashMap<EventKind, Vec<Handler>>,
    pending_connect: Option<Delay>,
    connected: bool,
    polling_mode: bool,
}

impl fmt::Debug for TokenStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStream")
            .field("engine", &self.engine.state())
            .field("clock", &self.clock.name())
            .field("handlers", &self.handlers.values().map(Vec::len).sum::<usize>())
            .field("connected", &self.connected)
            .field("polling_mode", &self.polling_mode)
            .finish()
    }
}

impl TokenStream {
    pub fn new(config: SimulationConfig, clock: Rc<dyn Clock>) -> Result<Self, ConfigError> {
        Ok(Self::from_engine(MarketSimulation::new(config)?, clock))
    }

    pub fn with_clock(clock: Rc<dyn Clock>) -> Self {
        Self::from_engine(MarketSimulation::default(), clock)
    }

    pub fn from_engine(engine: MarketSimulation, clock: Rc<dyn Clock>) -> Self {
        Self {
            engine,
            clock,
            handlers: HashMap::new(),
            pending_connect: None,
            connected: false,
            polling_mode: false,
        }
    }

    // ─── Subscriptions ───────────────────────────────────────────────────

    /// Registering the same handler twice for one kind is a no-op.
    pub fn subscribe(&mut self, kind: EventKind, handler: Handler) {
        let list = self.handlers.entry(kind).or_default();
        if !list.iter().any(|h| Rc::ptr_eq(h, &handler)) {
            list.push(handler);
        }
    }

    pub fn unsubscribe(&mut self, kind: EventKind, handler: &Handler) {
        if let Some(list) = self.handlers.get_mut(&kind) {
            list.retain(|h| !Rc::ptr_eq(h, handler));
        }
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    fn emit(&self, event: StreamEvent) {
        let Some(list) = self.handlers.get(&event.kind()) else {
            return;
        };
        for handler in list {
            handler(&event);
        }
    }

    fn broadcast_snapshot(&self) {
        let snapshot = self.engine.snapshot();
        self.emit(StreamEvent::Snapshot(snapshot.clone()));
        self.emit(StreamEvent::Update(snapshot));
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// `connected` fires from the first `pump()` after the connect delay.
    pub fn connect(&mut self) {
        let now = self.clock.now_ms();
        let delay = Delay::new(now, self.engine.config().connect_delay_ms);
        debug!("connect requested, due at {}", delay.due_at());
        self.pending_connect = Some(delay);
    }

    /// Stop ticking, announce it, then drop every subscription.
    pub fn disconnect(&mut self) {
        self.engine.stop();
        self.pending_connect = None;
        self.connected = false;
        self.emit(StreamEvent::Disconnected);
        self.handlers.clear();
        info!("token stream disconnected");
    }

    /// Reset and catch up to `anchor` (now when `None`), then publish one snapshot.
    pub fn start(&mut self, anchor: Option<i64>) -> CatchUp {
        let now = self.clock.now_ms();
        let anchor = anchor.unwrap_or(now);
        let catch_up = self.engine.start(anchor, now);
        self.broadcast_snapshot();
        catch_up
    }

    /// Fire whatever is due. Returns the number of transactions broadcast.
    pub fn pump(&mut self) -> usize {
        let now = self.clock.now_ms();

        if self.pending_connect.is_some_and(|d| d.is_due(now)) {
            self.pending_connect = None;
            self.connected = true;
            info!("token stream connected");
            self.emit(StreamEvent::Connected);
        }

        let mut published = 0;
        for at in self.engine.due_ticks(now) {
            if let Some(event) = self.engine.step(at) {
                self.emit(StreamEvent::Transaction(event));
                self.broadcast_snapshot();
                published += 1;
            }
        }
        published
    }

    /// Earliest time at which `pump()` has something to do.
    pub fn next_wake(&self) -> Option<i64> {
        let connect = self.pending_connect.map(|d| d.due_at());
        match (connect, self.engine.next_tick_at()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Emits only when the mode actually changes.
    pub fn set_polling_mode(&mut self, active: bool) {
        if self.polling_mode != active {
            self.polling_mode = active;
            info!("polling mode {}", if active { "on" } else { "off" });
            self.emit(StreamEvent::PollingModeChanged { active });
        }
    }

    // ─── Views ───────────────────────────────────────────────────────────

    pub fn get_anchor_time(&self) -> Option<i64> {
        self.engine.anchor_time()
    }

    pub fn snapshot(&self) -> TokenStreamSnapshot {
        self.engine.snapshot()
    }

    pub fn engine(&self) -> &MarketSimulation {
        &self.engine
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_polling_mode(&self) -> bool {
        self.polling_mode
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

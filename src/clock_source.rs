// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Fortune Market Simulation - Shared Clock Source
//
// One shared start time, readable by anyone and writable with the shared
// secret. Sessions poll it and re-anchor their stream when it moves.

use std::cell::RefCell;
use std::rc::Rc;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::clock::Clock;
use crate::schedule::RecurringTask;
use crate::stream::TokenStream;

// ─── Config ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ClockConfig {
    pub secret: String,
    /// A stored start time older than this no longer counts as running.
    pub freshness_ms: i64,
    pub poll_interval_ms: i64,
    /// Remote anchors within this distance of the local one are ignored.
    pub sync_tolerance_ms: i64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            secret: "FORTUNE444".to_string(),
            freshness_ms: 20 * 60 * 1_000,
            poll_interval_ms: 5_000,
            sync_tolerance_ms: 2_000,
        }
    }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Method {0} not allowed")]
    MethodNotAllowed(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("clock source unreachable: {0}")]
    Unreachable(String),
}

impl ClockError {
    pub fn status(&self) -> u16 {
        match self {
            ClockError::Unauthorized => 401,
            ClockError::MethodNotAllowed(_) => 405,
            ClockError::Internal(_) => 500,
            ClockError::Unreachable(_) => 503,
        }
    }

    pub fn to_body(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClockStatus {
    pub is_running: bool,
    pub start_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StartRequest {
    #[serde(default)]
    secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClockResponse {
    pub status: u16,
    pub body: Value,
}

impl ClockResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn error(err: &ClockError) -> Self {
        Self { status: err.status(), body: err.to_body() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ─── ClockStore ──────────────────────────────────────────────────────────────

/// In-memory stand-in for the shared start-time endpoint.
#[derive(Debug, Clone, Default)]
pub struct ClockStore {
    config: ClockConfig,
    start_time: Option<i64>,
}

impl ClockStore {
    pub fn new(config: ClockConfig) -> Self {
        Self { config, start_time: None }
    }

    pub fn start_time(&self) -> Option<i64> {
        self.start_time
    }

    pub fn status(&self, now: i64) -> ClockStatus {
        let is_running = self
            .start_time
            .is_some_and(|t| now - t < self.config.freshness_ms);
        ClockStatus { is_running, start_time: self.start_time }
    }

    /// Store `now` as the start time if `secret` matches.
    pub fn start(&mut self, secret: &str, now: i64) -> Result<i64, ClockError> {
        if secret != self.config.secret {
            warn!("rejected clock start: bad secret");
            return Err(ClockError::Unauthorized);
        }
        self.start_time = Some(now);
        info!("shared clock started at {}", now);
        Ok(now)
    }

    pub fn handle(&mut self, method: &str, body: &str, now: i64) -> ClockResponse {
        match self.dispatch(method, body, now) {
            Ok(value) => ClockResponse::ok(value),
            Err(err) => ClockResponse::error(&err),
        }
    }

    fn dispatch(&mut self, method: &str, body: &str, now: i64) -> Result<Value, ClockError> {
        match method {
            "GET" => serde_json::to_value(self.status(now))
                .map_err(|e| ClockError::Internal(e.to_string())),
            "POST" => {
                let request: StartRequest = if body.trim().is_empty() {
                    StartRequest { secret: None }
                } else {
                    serde_json::from_str(body).map_err(|e| ClockError::Internal(e.to_string()))?
                };
                let start_time = self.start(request.secret.as_deref().unwrap_or_default(), now)?;
                Ok(json!({ "success": true, "startTime": start_time }))
            }
            other => Err(ClockError::MethodNotAllowed(other.to_string())),
        }
    }
}

// ─── ClockSource ─────────────────────────────────────────────────────────────

pub trait ClockSource {
    fn fetch(&self) -> Result<ClockStatus, ClockError>;
}

/// A poll result obtained elsewhere, e.g. by a browser `fetch`.
#[derive(Debug, Clone)]
pub struct FetchedStatus(pub Result<ClockStatus, ClockError>);

impl FetchedStatus {
    /// Decode a GET response body.
    pub fn from_body(body: &str) -> Self {
        Self(serde_json::from_str(body).map_err(|e| ClockError::Internal(e.to_string())))
    }
}

impl ClockSource for FetchedStatus {
    fn fetch(&self) -> Result<ClockStatus, ClockError> {
        self.0.clone()
    }
}

/// Reads a [`ClockStore`] through its GET handler.
pub struct LocalClockSource {
    store: Rc<RefCell<ClockStore>>,
    clock: Rc<dyn Clock>,
}

impl LocalClockSource {
    pub fn new(store: Rc<RefCell<ClockStore>>, clock: Rc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

impl ClockSource for LocalClockSource {
    fn fetch(&self) -> Result<ClockStatus, ClockError> {
        let now = self.clock.now_ms();
        let response = self
            .store
            .try_borrow_mut()
            .map_err(|e| ClockError::Unreachable(e.to_string()))?
            .handle("GET", "", now);
        if !response.is_success() {
            return Err(ClockError::Internal(response.body.to_string()));
        }
        serde_json::from_value(response.body).map_err(|e| ClockError::Internal(e.to_string()))
    }
}

// ─── AnchorSync ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum SyncOutcome {
    NotDue,
    /// Nothing fresh is stored remotely.
    Idle,
    InSync,
    Resynced { anchor: i64 },
    Unreachable,
    Rejected,
}

/// Polls a [`ClockSource`] on a fixed cadence and re-anchors a stream.
#[derive(Debug, Clone)]
pub struct AnchorSync {
    config: ClockConfig,
    schedule: RecurringTask,
}

impl AnchorSync {
    /// The first poll is due at `now`, then every `poll_interval_ms`.
    pub fn new(config: ClockConfig, now: i64) -> Self {
        let interval = config.poll_interval_ms.max(1);
        let schedule = RecurringTask::new(now - interval, interval, 1);
        Self { config, schedule }
    }

    pub fn next_poll_at(&self) -> i64 {
        self.schedule.next_due_at()
    }

    /// Claims the poll due at `now`, if any. Hosts that fetch the status
    /// themselves call this and then feed the result to [`Self::sync_now`].
    pub fn take_due(&mut self, now: i64) -> bool {
        !self.schedule.take_due(now).is_empty()
    }

    /// Poll if the cadence says so.
    pub fn poll(&mut self, source: &dyn ClockSource, stream: &mut TokenStream) -> SyncOutcome {
        if !self.take_due(stream.now_ms()) {
            return SyncOutcome::NotDue;
        }
        self.sync_now(source, stream)
    }

    /// Poll unconditionally.
    pub fn sync_now(&self, source: &dyn ClockSource, stream: &mut TokenStream) -> SyncOutcome {
        let status = match source.fetch() {
            Ok(status) => status,
            Err(ClockError::Unreachable(reason)) => {
                warn!("clock source unreachable: {}", reason);
                stream.set_polling_mode(true);
                return SyncOutcome::Unreachable;
            }
            Err(err) => {
                warn!("clock source error: {}", err);
                return SyncOutcome::Rejected;
            }
        };
        stream.set_polling_mode(false);

        let remote = match status {
            ClockStatus { is_running: true, start_time: Some(t) } => t,
            _ => return SyncOutcome::Idle,
        };
        if let Some(local) = stream.get_anchor_time() {
            if (remote - local).abs() <= self.config.sync_tolerance_ms {
                return SyncOutcome::InSync;
            }
        }
        info!("re-anchoring stream to shared start time {}", remote);
        stream.start(Some(remote));
        SyncOutcome::Resynced { anchor: remote }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::cell::Cell;

    const NOW: i64 = 1_767_225_600_000;

    struct Offline;

    impl ClockSource for Offline {
        fn fetch(&self) -> Result<ClockStatus, ClockError> {
            Err(ClockError::Unreachable("connection refused".into()))
        }
    }

    struct Fixed(Cell<Option<i64>>);

    impl ClockSource for Fixed {
        fn fetch(&self) -> Result<ClockStatus, ClockError> {
            let start_time = self.0.get();
            Ok(ClockStatus { is_running: start_time.is_some(), start_time })
        }
    }

    #[test]
    fn test_get_before_start() {
        let mut store = ClockStore::default();
        let response = store.handle("GET", "", NOW);
        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({ "isRunning": false, "startTime": null }));
    }

    #[test]
    fn test_post_with_secret() {
        let mut store = ClockStore::default();
        let response = store.handle("POST", r#"{"secret":"FORTUNE444"}"#, NOW);
        assert_eq!(response.body, json!({ "success": true, "startTime": NOW }));
        assert_eq!(store.status(NOW + 1_000), ClockStatus { is_running: true, start_time: Some(NOW) });
    }

    #[test]
    fn test_freshness_window() {
        let mut store = ClockStore::default();
        store.start("FORTUNE444", NOW).unwrap();
        assert!(store.status(NOW + 20 * 60_000 - 1).is_running);
        let stale = store.status(NOW + 20 * 60_000);
        assert!(!stale.is_running);
        assert_eq!(stale.start_time, Some(NOW));
    }

    #[test]
    fn test_unauthorized_keeps_stored_time() {
        let mut store = ClockStore::default();
        store.start("FORTUNE444", NOW).unwrap();
        let response = store.handle("POST", r#"{"secret":"guess"}"#, NOW + 5_000);
        assert_eq!(response.status, 401);
        assert_eq!(response.body, json!({ "error": "Unauthorized" }));
        assert_eq!(store.start_time(), Some(NOW));
        assert_eq!(store.handle("POST", "", NOW).status, 401);
    }

    #[test]
    fn test_error_statuses() {
        let mut store = ClockStore::default();
        assert_eq!(store.handle("DELETE", "", NOW).status, 405);
        assert_eq!(store.handle("POST", "{not json", NOW).status, 500);
        assert_eq!(ClockError::Unreachable("x".into()).status(), 503);
    }

    #[test]
    fn test_local_source_reads_store() {
        let clock = Rc::new(ManualClock::new(NOW));
        let store = Rc::new(RefCell::new(ClockStore::default()));
        store.borrow_mut().start("FORTUNE444", NOW - 1_000).unwrap();
        let source = LocalClockSource::new(store, clock);
        assert_eq!(
            source.fetch(),
            Ok(ClockStatus { is_running: true, start_time: Some(NOW - 1_000) })
        );
    }

    #[test]
    fn test_fetched_status_from_body() {
        let ok = FetchedStatus::from_body(r#"{"isRunning":true,"startTime":42}"#);
        assert_eq!(ok.fetch(), Ok(ClockStatus { is_running: true, start_time: Some(42) }));
        let bad = FetchedStatus::from_body("<html>");
        assert_eq!(bad.fetch().map_err(|e| e.status()), Err(500));
    }

    #[test]
    fn test_sync_tolerance() {
        let clock = Rc::new(ManualClock::new(NOW));
        let mut stream = TokenStream::with_clock(clock.clone());
        let sync = AnchorSync::new(ClockConfig::default(), NOW);
        let source = Fixed(Cell::new(Some(NOW - 60_000)));

        assert_eq!(sync.sync_now(&source, &mut stream), SyncOutcome::Resynced { anchor: NOW - 60_000 });
        source.0.set(Some(NOW - 59_000));
        assert_eq!(sync.sync_now(&source, &mut stream), SyncOutcome::InSync);
        assert_eq!(stream.get_anchor_time(), Some(NOW - 60_000));
        source.0.set(Some(NOW - 57_000));
        assert_eq!(sync.sync_now(&source, &mut stream), SyncOutcome::Resynced { anchor: NOW - 57_000 });
        source.0.set(None);
        assert_eq!(sync.sync_now(&source, &mut stream), SyncOutcome::Idle);
    }

    #[test]
    fn test_poll_cadence_and_polling_mode() {
        let clock = Rc::new(ManualClock::new(NOW));
        let mut stream = TokenStream::with_clock(clock.clone());
        let mut sync = AnchorSync::new(ClockConfig::default(), NOW);

        assert_eq!(sync.poll(&Offline, &mut stream), SyncOutcome::Unreachable);
        assert!(stream.is_polling_mode());
        assert_eq!(sync.next_poll_at(), NOW + 5_000);

        clock.advance(4_999);
        assert_eq!(sync.poll(&Offline, &mut stream), SyncOutcome::NotDue);
        clock.advance(1);
        let source = Fixed(Cell::new(None));
        assert_eq!(sync.poll(&source, &mut stream), SyncOutcome::Idle);
        assert!(!stream.is_polling_mode());
        assert_eq!(sync.next_poll_at(), NOW + 10_000);
    }

    #[test]
    fn test_first_poll_anchors_late_joiner() {
        let clock = Rc::new(ManualClock::new(NOW));
        let store = Rc::new(RefCell::new(ClockStore::default()));
        store.borrow_mut().start("FORTUNE444", NOW - 60_000).unwrap();
        let source = LocalClockSource::new(store, clock.clone());
        let mut stream = TokenStream::with_clock(clock.clone());
        let mut sync = AnchorSync::new(ClockConfig::default(), NOW);

        assert_eq!(sync.poll(&source, &mut stream), SyncOutcome::Resynced { anchor: NOW - 60_000 });
        assert_eq!(stream.get_anchor_time(), Some(NOW - 60_000));
        assert_eq!(sync.poll(&source, &mut stream), SyncOutcome::NotDue);
    }

    #[test]
    fn test_take_due_claims_once_per_interval() {
        let mut sync = AnchorSync::new(ClockConfig::default(), NOW);
        assert!(sync.take_due(NOW));
        assert!(!sync.take_due(NOW + 4_999));
        assert!(sync.take_due(NOW + 12_000));
        assert_eq!(sync.next_poll_at(), NOW + 15_000);
    }
}

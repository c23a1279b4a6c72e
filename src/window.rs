// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Fortune Market Simulation - Rolling Volume Window

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::types::{EventSample, TokenMetrics};

/// Trade samples within the longest window, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingWindow {
    short_ms: i64,
    long_ms: i64,
    samples: VecDeque<EventSample>,
}

impl RollingWindow {
    pub fn new(short_ms: i64, long_ms: i64) -> Self {
        Self { short_ms, long_ms: long_ms.max(short_ms), samples: VecDeque::new() }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn oldest(&self) -> Option<&EventSample> {
        self.samples.front()
    }

    pub fn push(&mut self, sample: EventSample) {
        self.samples.push_back(sample);
    }

    /// Drop everything at or before `now - long window`.
    pub fn prune(&mut self, now: i64) {
        let cutoff = now - self.long_ms;
        while self.samples.front().is_some_and(|s| s.timestamp <= cutoff) {
            self.samples.pop_front();
        }
    }

    /// Prune, then refresh the windowed fields of `metrics`.
    pub fn update(&mut self, now: i64, metrics: &mut TokenMetrics) {
        self.prune(now);
        let short_cutoff = now - self.short_ms;

        let mut volume_1m = 0.0;
        let mut volume_20m = 0.0;
        let mut trades_1m = 0;
        let mut trades_20m = 0;
        for sample in &self.samples {
            volume_20m += sample.amount_usd;
            trades_20m += 1;
            if sample.timestamp > short_cutoff {
                volume_1m += sample.amount_usd;
                trades_1m += 1;
            }
        }

        metrics.volume_1m = volume_1m;
        metrics.volume_20m = volume_20m;
        metrics.trades_1m = trades_1m;
        metrics.trades_20m = trades_20m;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

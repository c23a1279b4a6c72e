// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Fortune Replay - Per-Tick JSONL Recorder

use std::io::Write;
use std::path::Path;

use fortune_engine::{MarketSimulation, TokenEvent};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct TickRecord {
    pub timestamp: i64,
    pub elapsed_ms: i64,
    pub market_cap: f64,
    pub target_market_cap: f64,
    pub fortune_pool: f64,
    pub token_price: f64,
    pub volume_1m: f64,
    pub volume_20m: f64,
    pub trades_1m: u32,
    pub active_traders: usize,
    pub trade: Option<TokenEvent>,
}

impl TickRecord {
    pub fn capture(sim: &MarketSimulation, at: i64, trade: Option<TokenEvent>) -> Self {
        let anchor = sim.anchor_time().unwrap_or(at);
        let metrics = sim.metrics();
        Self {
            timestamp: at,
            elapsed_ms: at - anchor,
            market_cap: sim.market_cap(),
            target_market_cap: sim.target_at(at).unwrap_or(sim.market_cap()),
            fortune_pool: sim.fortune_pool(),
            token_price: sim.token_price(),
            volume_1m: metrics.volume_1m,
            volume_20m: metrics.volume_20m,
            trades_1m: metrics.trades_1m,
            active_traders: sim.active_traders().len(),
            trade,
        }
    }
}

#[derive(Debug, Default)]
pub struct TimeSeriesRecorder {
    records: Vec<TickRecord>,
}

impl TimeSeriesRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: TickRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn write_jsonl(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        for record in &self.records {
            let line = serde_json::to_string(record).map_err(std::io::Error::other)?;
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }
}

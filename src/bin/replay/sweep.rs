// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Fortune Replay - Single Runs and Monte Carlo Sweep
//
// A run drives the engine on its own tick grid from a cold start. A sweep
// draws N anchors from a seeded ChaCha8 stream and aggregates the runs.

use std::path::Path;

use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use fortune_engine::{ConfigError, MarketSimulation, SimulationConfig};

use crate::report::{RunSummary, Stats, SweepReport};
use crate::ReplayError;
use crate::time_series::{TickRecord, TimeSeriesRecorder};

/// 2026-01-01T00:00:00Z
pub const SWEEP_EPOCH_MS: i64 = 1_767_225_600_000;
const SWEEP_SPAN_MS: i64 = 365 * 24 * 60 * 60 * 1_000;

/// Replay `horizon_ms` of live ticks after a cold start at `anchor`.
pub fn run_single(
    config: &SimulationConfig,
    anchor: i64,
    horizon_ms: i64,
    mut recorder: Option<&mut TimeSeriesRecorder>,
) -> Result<RunSummary, ConfigError> {
    let mut sim = MarketSimulation::new(config.clone())?;
    sim.start(anchor, anchor);

    let interval = config.update_interval_ms;
    let ticks = (horizon_ms / interval).max(0) as u64;
    let mut tier_counts = [0u64; 3];

    for k in 1..=ticks {
        let now = anchor + k as i64 * interval;
        for at in sim.due_ticks(now) {
            let trade = sim.step(at);
            if let Some(event) = &trade {
                tier_counts[event.tier as usize] += 1;
            }
            if let Some(rec) = recorder.as_deref_mut() {
                rec.record(TickRecord::capture(&sim, at, trade));
            }
        }
    }

    let end = anchor + ticks as i64 * interval;
    let target = sim.target_at(end).unwrap_or(config.initial_market_cap);
    let state = sim.state();
    let summary = RunSummary {
        anchor,
        horizon_ms,
        ticks,
        trades: state.trade_count,
        saturated_buys: state.saturated_buys,
        final_market_cap: state.market_cap,
        target_market_cap: target,
        tracking_error_pct: (state.market_cap - target) / target * 100.0,
        fortune_pool: state.fortune_pool,
        token_price: state.token_price,
        wallets: state.wallet_count,
        largest_holder_pct: sim.top_holders().first().map_or(0.0, |h| h.supply_percent),
        volume_20m: sim.metrics().volume_20m,
        buy_volume: sim.metrics().buy_volume,
        tier_counts,
    };
    debug!(
        "anchor {} -> market cap {:.2} (target {:.2})",
        anchor, summary.final_market_cap, summary.target_market_cap
    );
    Ok(summary)
}

/// Anchors for a sweep, reproducible from `seed`.
pub fn sweep_anchors(runs: usize, seed: u64) -> Vec<i64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..runs)
        .map(|_| SWEEP_EPOCH_MS + rng.gen_range(0..SWEEP_SPAN_MS))
        .collect()
}

pub fn run_sweep(
    config: &SimulationConfig,
    runs: usize,
    seed: u64,
    horizon_ms: i64,
    time_series_dir: Option<&Path>,
) -> Result<SweepReport, ReplayError> {
    let mut individual_runs = Vec::with_capacity(runs);
    for (i, anchor) in sweep_anchors(runs, seed).into_iter().enumerate() {
        let mut recorder = time_series_dir.map(|_| TimeSeriesRecorder::new());
        let summary = run_single(config, anchor, horizon_ms, recorder.as_mut())?;
        if let (Some(dir), Some(rec)) = (time_series_dir, recorder.as_ref()) {
            rec.write_jsonl(&dir.join(format!("run-{:03}-{}.jsonl", i, anchor)))?;
        }
        individual_runs.push(summary);
    }
    info!("sweep finished: {} runs, base seed {}", runs, seed);

    let column = |f: fn(&RunSummary) -> f64| -> Stats { individual_runs.iter().map(f).collect() };

    Ok(SweepReport {
        timestamp: chrono::Utc::now().timestamp_millis().to_string(),
        version: env!("CARGO_PKG_VERSION"),
        prng: "ChaCha8Rng",
        base_seed: seed,
        n_runs: runs,
        horizon_minutes: horizon_ms as f64 / 60_000.0,
        tracking_error_pct: column(|r| r.tracking_error_pct),
        final_market_cap: column(|r| r.final_market_cap),
        fortune_pool: column(|r| r.fortune_pool),
        trades: column(|r| r.trades as f64),
        saturated_buys: column(|r| r.saturated_buys as f64),
        largest_holder_pct: column(|r| r.largest_holder_pct),
        individual_runs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchors_reproducible() {
        assert_eq!(sweep_anchors(5, 42), sweep_anchors(5, 42));
        assert_ne!(sweep_anchors(5, 42), sweep_anchors(5, 43));
        assert!(sweep_anchors(20, 0)
            .iter()
            .all(|&a| (SWEEP_EPOCH_MS..SWEEP_EPOCH_MS + SWEEP_SPAN_MS).contains(&a)));
    }

    #[test]
    fn test_run_single_full_window() {
        let config = SimulationConfig::default();
        let mut recorder = TimeSeriesRecorder::new();
        let summary = run_single(&config, SWEEP_EPOCH_MS, 20 * 60_000, Some(&mut recorder)).unwrap();
        assert_eq!(summary.ticks, 600);
        assert_eq!(recorder.len(), 600);
        assert_eq!(summary.trades + summary.saturated_buys, 600);
        assert_eq!(summary.tier_counts.iter().sum::<u64>(), summary.trades);
        assert_eq!(summary.target_market_cap, 60_000.0);
        assert!(summary.final_market_cap > config.initial_market_cap);
    }

    #[test]
    fn test_run_single_is_deterministic() {
        let config = SimulationConfig::default();
        let a = run_single(&config, SWEEP_EPOCH_MS + 7, 5 * 60_000, None).unwrap();
        let b = run_single(&config, SWEEP_EPOCH_MS + 7, 5 * 60_000, None).unwrap();
        assert_eq!(a.final_market_cap, b.final_market_cap);
        assert_eq!(a.fortune_pool, b.fortune_pool);
    }
}

// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Fortune Replay - Report Types

use serde::Serialize;

// ─── Statistics ─────────────────────────────────────────────────────────────

/// One metric across the runs of a sweep, updated a sample at a time.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Stats {
    pub n: usize,
    pub mean: f64,
    pub std_dev: f64,
    /// Half-width of the 95% normal interval around `mean`.
    pub ci95: f64,
    pub min: f64,
    pub max: f64,
    #[serde(skip)]
    m2: f64,
}

impl Stats {
    const Z_95: f64 = 1.96;

    /// Welford update; `std_dev` is the sample deviation.
    pub fn push(&mut self, x: f64) {
        if self.n == 0 {
            self.min = x;
            self.max = x;
        } else {
            self.min = self.min.min(x);
            self.max = self.max.max(x);
        }
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (x - self.mean);
        if self.n > 1 {
            self.std_dev = (self.m2 / (self.n - 1) as f64).sqrt();
            self.ci95 = Self::Z_95 * self.std_dev / (self.n as f64).sqrt();
        }
    }

    pub fn half_width(&self) -> f64 {
        self.ci95
    }
}

impl FromIterator<f64> for Stats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = Stats::default();
        for x in iter {
            stats.push(x);
        }
        stats
    }
}

// ─── Single run ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub anchor: i64,
    pub horizon_ms: i64,
    pub ticks: u64,
    pub trades: u64,
    pub saturated_buys: u64,
    pub final_market_cap: f64,
    pub target_market_cap: f64,
    /// Signed distance from the curve at the horizon, in percent.
    pub tracking_error_pct: f64,
    pub fortune_pool: f64,
    pub token_price: f64,
    pub wallets: usize,
    pub largest_holder_pct: f64,
    pub volume_20m: f64,
    pub buy_volume: f64,
    pub tier_counts: [u64; 3],
}

// ─── Sweep ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SweepReport {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub base_seed: u64,
    pub n_runs: usize,
    pub horizon_minutes: f64,
    pub tracking_error_pct: Stats,
    pub final_market_cap: Stats,
    pub fortune_pool: Stats,
    pub trades: Stats,
    pub saturated_buys: Stats,
    pub largest_holder_pct: Stats,
    pub individual_runs: Vec<RunSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_empty() {
        let stats: Stats = std::iter::empty().collect();
        assert_eq!(stats.n, 0);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.half_width(), 0.0);
    }

    #[test]
    fn test_stats_mean_and_spread() {
        let stats: Stats = [2.0, 4.0, 6.0].into_iter().collect();
        assert_eq!(stats.mean, 4.0);
        assert_eq!(stats.std_dev, 2.0);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 6.0);
        assert!((stats.half_width() - 1.96 * 2.0 / 3f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_single_sample_has_no_spread() {
        let mut stats = Stats::default();
        stats.push(-3.5);
        assert_eq!((stats.min, stats.max, stats.mean), (-3.5, -3.5, -3.5));
        assert_eq!(stats.std_dev, 0.0);
    }
}

// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Fortune Market Simulation - Buy Sizing Policy
//
// Proportional tracking of the target market-cap curve. The further the
// realized cap drifts from the curve, the harder the tier weights lean
// toward (or away from) large buys.

use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::types::SizeTier;

// ---------------------------------------------------------------------------
// Curve
// ---------------------------------------------------------------------------

/// Fraction of the run elapsed at `elapsed_ms`, clamped to [0, 1].
pub fn progress(elapsed_ms: f64, total_duration_ms: f64) -> f64 {
    if total_duration_ms <= 0.0 {
        return 1.0;
    }
    (elapsed_ms / total_duration_ms).clamp(0.0, 1.0)
}

/// `initial + (target - initial) * progress^exponent`
pub fn target_market_cap(config: &SimulationConfig, progress: f64) -> f64 {
    let growth = config.target_market_cap - config.initial_market_cap;
    config.initial_market_cap + growth * progress.powf(config.curve_exponent)
}

/// Signed relative distance from the curve; positive means ahead.
pub fn deviation(market_cap: f64, target: f64) -> f64 {
    (market_cap - target) / target
}

// ---------------------------------------------------------------------------
// Adaptive weighting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingBand {
    FarAhead,
    NearAhead,
    NearBehind,
    FarBehind,
}

/// Selection probabilities for one tick. Shrimp is the remainder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierWeights {
    pub band: TrackingBand,
    pub whale: f64,
    pub medium: f64,
}

impl TierWeights {
    pub fn shrimp(&self) -> f64 {
        (1.0 - self.whale - self.medium).max(0.0)
    }

    /// Cumulative thresholding: whale owns the top band, medium the one below.
    pub fn select(&self, draw: f64) -> SizeTier {
        if draw > 1.0 - self.whale {
            SizeTier::Whale
        } else if draw > 1.0 - self.whale - self.medium {
            SizeTier::Medium
        } else {
            SizeTier::Shrimp
        }
    }
}

/// Ahead/behind is judged against the noisy target; band width uses the
/// noiseless deviation.
pub fn classify(
    config: &SimulationConfig,
    market_cap: f64,
    target: f64,
    noise: f64,
) -> TrackingBand {
    let threshold = config.adaptive_bands.threshold;
    let dev = deviation(market_cap, target);
    if market_cap > target + noise {
        if dev > threshold { TrackingBand::FarAhead } else { TrackingBand::NearAhead }
    } else if dev < -threshold {
        TrackingBand::FarBehind
    } else {
        TrackingBand::NearBehind
    }
}

pub fn weights_for(config: &SimulationConfig, band: TrackingBand) -> TierWeights {
    let bands = &config.adaptive_bands;
    let base = &config.buy_probability;
    let (whale, medium) = match band {
        TrackingBand::FarAhead => (bands.far_ahead_whale, bands.far_ahead_medium),
        TrackingBand::NearAhead => (
            base.whale * bands.near_ahead_whale_factor,
            base.medium * bands.near_ahead_medium_factor,
        ),
        TrackingBand::NearBehind => (bands.near_behind_whale, bands.near_behind_medium),
        TrackingBand::FarBehind => (bands.far_behind_whale, bands.far_behind_medium),
    };
    TierWeights { band, whale, medium }
}

/// Gross trade size in USD before any wallet-cap clamp.
pub fn trade_usd(config: &SimulationConfig, tier: SizeTier, market_cap: f64, unit: f64) -> f64 {
    let range = match tier {
        SizeTier::Whale => config.buy_sizing.whale,
        SizeTier::Medium => config.buy_sizing.medium,
        SizeTier::Shrimp => config.buy_sizing.shrimp,
    };
    (market_cap * range.lerp(unit)).max(config.min_trade_usd)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SimulationConfig {
        SimulationConfig::default()
    }

    #[test]
    fn test_progress_clamps() {
        assert_eq!(progress(-5.0, 100.0), 0.0);
        assert_eq!(progress(50.0, 100.0), 0.5);
        assert_eq!(progress(500.0, 100.0), 1.0);
    }

    #[test]
    fn test_curve_endpoints() {
        let c = config();
        assert_eq!(target_market_cap(&c, 0.0), 5_500.0);
        assert_eq!(target_market_cap(&c, 1.0), 60_000.0);
    }

    #[test]
    fn test_curve_is_back_loaded() {
        let c = config();
        // exponent 1.8 > 1: halfway in time is well under halfway in growth
        let mid = target_market_cap(&c, 0.5);
        let linear_mid = (5_500.0 + 60_000.0) / 2.0;
        assert!(mid < linear_mid);
        assert!(mid > 5_500.0);
    }

    #[test]
    fn test_front_loaded_curve() {
        let c = SimulationConfig { curve_exponent: 0.5, ..config() };
        let linear_mid = (5_500.0 + 60_000.0) / 2.0;
        assert!(target_market_cap(&c, 0.5) > linear_mid);
    }

    #[test]
    fn test_classify_bands() {
        let c = config();
        assert_eq!(classify(&c, 12_000.0, 10_000.0, 0.0), TrackingBand::FarAhead);
        assert_eq!(classify(&c, 10_500.0, 10_000.0, 0.0), TrackingBand::NearAhead);
        assert_eq!(classify(&c, 9_500.0, 10_000.0, 0.0), TrackingBand::NearBehind);
        assert_eq!(classify(&c, 8_000.0, 10_000.0, 0.0), TrackingBand::FarBehind);
    }

    #[test]
    fn test_noise_flips_side_near_curve() {
        let c = config();
        // 200 ahead of the curve, but noise raises the bar by 400
        assert_eq!(classify(&c, 10_200.0, 10_000.0, 400.0), TrackingBand::NearBehind);
        assert_eq!(classify(&c, 10_200.0, 10_000.0, -400.0), TrackingBand::NearAhead);
    }

    #[test]
    fn test_weights_monotone_in_band() {
        let c = config();
        let far_ahead = weights_for(&c, TrackingBand::FarAhead);
        let near_ahead = weights_for(&c, TrackingBand::NearAhead);
        let near_behind = weights_for(&c, TrackingBand::NearBehind);
        let far_behind = weights_for(&c, TrackingBand::FarBehind);
        assert!((near_ahead.whale - 0.02).abs() < 1e-12);
        assert!((near_ahead.medium - 0.15).abs() < 1e-12);
        assert!(far_ahead.whale <= near_ahead.whale + 1e-12);
        assert!(near_ahead.whale < near_behind.whale);
        assert!(near_behind.whale < far_behind.whale);
        assert!(near_behind.medium < far_behind.medium);
        assert!((far_behind.shrimp() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_select_thresholds() {
        let w = TierWeights { band: TrackingBand::NearBehind, whale: 0.2, medium: 0.4 };
        assert_eq!(w.select(0.95), SizeTier::Whale);
        assert_eq!(w.select(0.5), SizeTier::Medium);
        assert_eq!(w.select(0.39), SizeTier::Shrimp);
        assert_eq!(w.select(0.0), SizeTier::Shrimp);
    }

    #[test]
    fn test_trade_usd_floor() {
        let c = config();
        // 0.08% of $5.5k = $4.40, floored to $10
        assert_eq!(trade_usd(&c, SizeTier::Shrimp, 5_500.0, 0.0), 10.0);
        let whale = trade_usd(&c, SizeTier::Whale, 10_000.0, 1.0);
        assert!((whale - 300.0).abs() < 1e-9);
    }
}

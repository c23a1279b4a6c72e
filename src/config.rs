// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Fortune Market Simulation - Configuration
//
// Every tunable of the simulated market lives here. Defaults reproduce the
// live demo: a 20-minute run that walks market cap from $5.5k toward $60k.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must lie in [0, 1] (got {value})")]
    OutOfUnitRange { field: &'static str, value: f64 },

    #[error("tier {tier} has an invalid size range [{min}, {max}]")]
    InvalidSizeRange { tier: &'static str, min: f64, max: f64 },

    #[error("whale and medium probabilities sum past 1 in {band} band ({sum})")]
    ProbabilityOverflow { band: &'static str, sum: f64 },

    #[error("BUY_PROBABILITY tiers must sum to 1 (got {sum})")]
    ProbabilitySum { sum: f64 },

    #[error("{field} must be at least 1")]
    ZeroCapacity { field: &'static str },

    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Nested tables
// ---------------------------------------------------------------------------

/// Trade size as a fraction of current market cap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizeRange {
    pub min: f64,
    pub max: f64,
}

impl SizeRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Map a unit draw onto the range.
    pub fn lerp(&self, unit: f64) -> f64 {
        self.min + unit * (self.max - self.min)
    }
}

/// Each tier replaces its default range as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default, deny_unknown_fields)]
pub struct BuySizing {
    pub whale: SizeRange,
    pub medium: SizeRange,
    pub shrimp: SizeRange,
}

impl Default for BuySizing {
    fn default() -> Self {
        Self {
            whale: SizeRange::new(0.015, 0.03),
            medium: SizeRange::new(0.004, 0.009),
            shrimp: SizeRange::new(0.0008, 0.003),
        }
    }
}

/// Base selection probabilities. The three tiers must sum to 1; the draw
/// picks shrimp for whatever whale and medium leave over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default, deny_unknown_fields)]
pub struct BuyProbability {
    pub whale: f64,
    pub medium: f64,
    pub shrimp: f64,
}

impl Default for BuyProbability {
    fn default() -> Self {
        Self { whale: 0.05, medium: 0.25, shrimp: 0.70 }
    }
}

/// Deviation bands for the adaptive tier weighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default, deny_unknown_fields)]
pub struct AdaptiveBands {
    /// |deviation| past which the far-band rates apply.
    pub threshold: f64,
    pub far_ahead_whale: f64,
    pub far_ahead_medium: f64,
    /// Applied to the base probabilities when slightly ahead.
    pub near_ahead_whale_factor: f64,
    pub near_ahead_medium_factor: f64,
    pub near_behind_whale: f64,
    pub near_behind_medium: f64,
    pub far_behind_whale: f64,
    pub far_behind_medium: f64,
}

impl Default for AdaptiveBands {
    fn default() -> Self {
        Self {
            threshold: 0.10,
            far_ahead_whale: 0.02,
            far_ahead_medium: 0.15,
            near_ahead_whale_factor: 0.4,
            near_ahead_medium_factor: 0.6,
            near_behind_whale: 0.20,
            near_behind_medium: 0.40,
            far_behind_whale: 0.30,
            far_behind_medium: 0.45,
        }
    }
}

/// Static demo identity copied into every snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default, deny_unknown_fields)]
pub struct TokenIdentity {
    pub contract_address: String,
    pub symbol: String,
    pub name: String,
}

impl Default for TokenIdentity {
    fn default() -> Self {
        Self {
            contract_address: "0xMockTokenAddressForDemo".to_string(),
            symbol: "FORTUNE".to_string(),
            name: "444 Fortune".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// SimulationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default, deny_unknown_fields)]
pub struct SimulationConfig {
    // Curve
    pub initial_market_cap: f64,
    pub target_market_cap: f64,
    /// <1 front-loads growth, >1 back-loads it.
    pub curve_exponent: f64,

    // Tokenomics
    pub total_supply: f64,
    pub max_wallet_cap_percent: f64,
    pub dev_wallet_percent: f64,
    pub fortune_pool_fee_rate: f64,
    pub initial_pool: f64,

    // Trade policy
    pub buy_sizing: BuySizing,
    pub buy_probability: BuyProbability,
    pub adaptive_bands: AdaptiveBands,
    pub min_trade_usd: f64,
    pub noise_amplitude_usd: f64,

    // Timing
    pub duration_minutes: f64,
    pub update_interval_ms: i64,
    pub max_catch_up_ticks: u32,
    pub connect_delay_ms: i64,
    pub short_window_ms: i64,
    pub long_window_ms: i64,

    // Feeds
    pub recent_events_capacity: usize,
    pub active_traders_capacity: usize,
    pub top_holders_len: usize,
    pub active_trader_display_offset: u32,
    pub block_number_base: u64,

    pub token: TokenIdentity,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_market_cap: 5_500.0,
            target_market_cap: 60_000.0,
            curve_exponent: 1.8,
            total_supply: 1_000_000_000.0,
            max_wallet_cap_percent: 0.05,
            dev_wallet_percent: 0.03,
            fortune_pool_fee_rate: 0.3,
            initial_pool: 55.0,
            buy_sizing: BuySizing::default(),
            buy_probability: BuyProbability::default(),
            adaptive_bands: AdaptiveBands::default(),
            min_trade_usd: 10.0,
            noise_amplitude_usd: 1_000.0,
            duration_minutes: 20.0,
            update_interval_ms: 2_000,
            max_catch_up_ticks: 1_000,
            connect_delay_ms: 500,
            short_window_ms: 60_000,
            long_window_ms: 20 * 60_000,
            recent_events_capacity: 50,
            active_traders_capacity: 100,
            top_holders_len: 10,
            active_trader_display_offset: 12,
            block_number_base: 123_456,
            token: TokenIdentity::default(),
        }
    }
}

impl SimulationConfig {
    /// Parse a (possibly partial) JSON config; missing keys keep defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn total_duration_ms(&self) -> f64 {
        self.duration_minutes * 60_000.0
    }

    /// Largest balance any single wallet may hold.
    pub fn max_wallet_tokens(&self) -> f64 {
        self.total_supply * self.max_wallet_cap_percent
    }

    pub fn initial_price(&self) -> f64 {
        self.initial_market_cap / self.total_supply
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("INITIAL_MARKET_CAP", self.initial_market_cap)?;
        positive("TARGET_MARKET_CAP", self.target_market_cap)?;
        positive("CURVE_EXPONENT", self.curve_exponent)?;
        positive("TOTAL_SUPPLY", self.total_supply)?;
        positive("DURATION_MINUTES", self.duration_minutes)?;
        positive("UPDATE_INTERVAL_MS", self.update_interval_ms as f64)?;
        positive("SHORT_WINDOW_MS", self.short_window_ms as f64)?;
        positive("LONG_WINDOW_MS", self.long_window_ms as f64)?;

        unit("MAX_WALLET_CAP_PERCENT", self.max_wallet_cap_percent)?;
        unit("DEV_WALLET_PERCENT", self.dev_wallet_percent)?;
        unit("FORTUNE_POOL_FEE_RATE", self.fortune_pool_fee_rate)?;
        unit("BUY_PROBABILITY.WHALE", self.buy_probability.whale)?;
        unit("BUY_PROBABILITY.MEDIUM", self.buy_probability.medium)?;
        unit("BUY_PROBABILITY.SHRIMP", self.buy_probability.shrimp)?;
        let sum = self.buy_probability.whale + self.buy_probability.medium + self.buy_probability.shrimp;
        if (sum - 1.0).abs() > PROBABILITY_EPSILON {
            return Err(ConfigError::ProbabilitySum { sum });
        }

        for (tier, range) in [
            ("whale", self.buy_sizing.whale),
            ("medium", self.buy_sizing.medium),
            ("shrimp", self.buy_sizing.shrimp),
        ] {
            if range.min < 0.0 || range.min > range.max {
                return Err(ConfigError::InvalidSizeRange { tier, min: range.min, max: range.max });
            }
        }

        let bands = &self.adaptive_bands;
        let base = &self.buy_probability;
        for (band, whale, medium) in [
            ("base", base.whale, base.medium),
            ("far-ahead", bands.far_ahead_whale, bands.far_ahead_medium),
            (
                "near-ahead",
                base.whale * bands.near_ahead_whale_factor,
                base.medium * bands.near_ahead_medium_factor,
            ),
            ("near-behind", bands.near_behind_whale, bands.near_behind_medium),
            ("far-behind", bands.far_behind_whale, bands.far_behind_medium),
        ] {
            unit(band_field(band), whale)?;
            unit(band_field(band), medium)?;
            if whale + medium > 1.0 {
                return Err(ConfigError::ProbabilityOverflow { band, sum: whale + medium });
            }
        }

        if self.recent_events_capacity == 0 {
            return Err(ConfigError::ZeroCapacity { field: "RECENT_EVENTS_CAPACITY" });
        }
        if self.active_traders_capacity == 0 {
            return Err(ConfigError::ZeroCapacity { field: "ACTIVE_TRADERS_CAPACITY" });
        }
        if self.top_holders_len == 0 {
            return Err(ConfigError::ZeroCapacity { field: "TOP_HOLDERS_LEN" });
        }
        Ok(())
    }
}

const PROBABILITY_EPSILON: f64 = 1e-9;

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { field, value })
    }
}

fn band_field(band: &'static str) -> &'static str {
    match band {
        "base" => "BUY_PROBABILITY",
        _ => "ADAPTIVE_BANDS",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.total_duration_ms(), 1_200_000.0);
        assert_eq!(config.max_wallet_tokens(), 50_000_000.0);
        assert!((config.initial_price() - 5.5e-6).abs() < 1e-18);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SimulationConfig::from_json(
            r#"{ "TARGET_MARKET_CAP": 80000, "BUY_SIZING": {
                    "WHALE": { "min": 0.02, "max": 0.04 },
                    "MEDIUM": { "min": 0.004, "max": 0.009 },
                    "SHRIMP": { "min": 0.0008, "max": 0.003 } } }"#,
        )
        .unwrap();
        assert_eq!(config.target_market_cap, 80_000.0);
        assert_eq!(config.buy_sizing.whale, SizeRange::new(0.02, 0.04));
        assert_eq!(config.initial_market_cap, 5_500.0);
        assert_eq!(config.update_interval_ms, 2_000);
    }

    #[test]
    fn test_partial_nested_tables() {
        let config = SimulationConfig::from_json(
            r#"{ "BUY_PROBABILITY": { "WHALE": 0.1, "SHRIMP": 0.65 },
                 "BUY_SIZING": { "WHALE": { "min": 0.02, "max": 0.04 } } }"#,
        )
        .unwrap();
        assert_eq!(config.buy_probability.whale, 0.1);
        assert_eq!(config.buy_probability.medium, 0.25);
        assert_eq!(config.buy_sizing.whale, SizeRange::new(0.02, 0.04));
        assert_eq!(config.buy_sizing.medium, BuySizing::default().medium);
    }

    #[test]
    fn test_adaptive_bands_use_config_keys() {
        let config = SimulationConfig::from_json(
            r#"{ "ADAPTIVE_BANDS": { "FAR_BEHIND_WHALE": 0.5, "THRESHOLD": 0.2 } }"#,
        )
        .unwrap();
        assert_eq!(config.adaptive_bands.far_behind_whale, 0.5);
        assert_eq!(config.adaptive_bands.threshold, 0.2);
        assert_eq!(config.adaptive_bands.far_behind_medium, 0.45);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        for json in [
            r#"{ "TARGET_MARKETCAP": 80000 }"#,
            r#"{ "ADAPTIVE_BANDS": { "farBehindWhale": 0.5 } }"#,
            r#"{ "BUY_PROBABILITY": { "WHALES": 0.1 } }"#,
        ] {
            assert!(matches!(SimulationConfig::from_json(json), Err(ConfigError::Parse(_))), "{}", json);
        }
    }

    #[test]
    fn test_probabilities_must_sum_to_one() {
        let err = SimulationConfig::from_json(r#"{ "BUY_PROBABILITY": { "WHALE": 0.1 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::ProbabilitySum { .. }));
    }

    #[test]
    fn test_rejects_zero_supply() {
        let config = SimulationConfig { total_supply: 0.0, ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { field: "TOTAL_SUPPLY", .. })
        ));
    }

    #[test]
    fn test_rejects_inverted_range() {
        let mut config = SimulationConfig::default();
        config.buy_sizing.medium = SizeRange::new(0.01, 0.005);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSizeRange { tier: "medium", .. })
        ));
    }

    #[test]
    fn test_rejects_probability_overflow() {
        let mut config = SimulationConfig::default();
        config.adaptive_bands.far_behind_whale = 0.6;
        config.adaptive_bands.far_behind_medium = 0.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ProbabilityOverflow { band: "far-behind", .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        let err = SimulationConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_size_range_lerp() {
        let range = SizeRange::new(0.01, 0.03);
        assert_eq!(range.lerp(0.0), 0.01);
        assert!((range.lerp(0.5) - 0.02).abs() < f64::EPSILON);
    }
}

// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Fortune Market Simulation - Type Definitions

use serde::{Deserialize, Serialize};

// ─── Trade Side ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Default for Side {
    fn default() -> Self { Side::Buy }
}

// ─── Size Tier ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SizeTier {
    Whale = 0,
    Medium = 1,
    Shrimp = 2,
}

impl SizeTier {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Whale => "whale",
            Self::Medium => "medium",
            Self::Shrimp => "shrimp",
        }
    }
}

// ─── TokenEvent ──────────────────────────────────────────────────────────────

/// One synthetic swap. Never mutated after the engine creates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenEvent {
    pub id: String,
    pub side: Side,
    pub timestamp: i64,
    pub block_number: u64,
    pub tx_hash: String,
    /// Token units received by the wallet.
    pub amount: f64,
    pub amount_usd: f64,
    /// Token price after this trade settled.
    pub price: f64,
    pub account: String,
    #[serde(default = "default_tier")]
    pub tier: SizeTier,
}

pub fn default_tier() -> SizeTier {
    SizeTier::Shrimp
}

// ─── Wallet Balance ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalance {
    pub balance: f64,
    pub first_buy_tx_hash: String,
    pub first_buy_time: i64,
}

// ─── TopHolder ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopHolder {
    pub wallet: String,
    pub balance: f64,
    /// Percent of total supply (0..100), the only place fractions become percents.
    pub supply_percent: f64,
    pub first_buy_tx_hash: Option<String>,
    pub first_buy_time: Option<i64>,
}

// ─── EventSample ─────────────────────────────────────────────────────────────

/// Minimal record kept for rolling volume windows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSample {
    pub timestamp: i64,
    pub amount_usd: f64,
}

// ─── TokenMetrics ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetrics {
    #[serde(rename = "volume1m")]
    pub volume_1m: f64,
    #[serde(rename = "volume20m")]
    pub volume_20m: f64,
    #[serde(rename = "trades1m")]
    pub trades_1m: u32,
    #[serde(rename = "trades20m")]
    pub trades_20m: u32,
    pub buy_volume: f64,
    pub sell_volume: f64,
    pub buy_sell_ratio: f64,
}

/// Static ratio shown by the demo feed; the buy-only run never sells.
pub const DEFAULT_BUY_SELL_RATIO: f64 = 1.5;

impl Default for TokenMetrics {
    fn default() -> Self {
        Self {
            volume_1m: 0.0,
            volume_20m: 0.0,
            trades_1m: 0,
            trades_20m: 0,
            buy_volume: 0.0,
            sell_volume: 0.0,
            buy_sell_ratio: DEFAULT_BUY_SELL_RATIO,
        }
    }
}

// ─── TokenStreamSnapshot ─────────────────────────────────────────────────────

/// Read-only projection of engine state handed to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStreamSnapshot {
    #[serde(rename = "tokenCA")]
    pub token_ca: Option<String>,
    pub token_symbol: Option<String>,
    pub token_name: Option<String>,
    pub token_price: Option<f64>,
    pub last_trade_timestamp: Option<i64>,
    pub market_cap: Option<f64>,
    pub fortune_pool: f64,
    pub active_trader_count: u32,
    pub metrics: TokenMetrics,
    pub recent_events: Vec<TokenEvent>,
    pub top_holders: Vec<TopHolder>,
}

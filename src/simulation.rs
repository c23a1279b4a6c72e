// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Fortune Market Simulation - Simulation Core

use std::collections::VecDeque;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SimulationConfig};
use crate::ledger::{ActiveTraders, Credit, HolderLedger};
use crate::policy;
use crate::rng::Lcg;
use crate::schedule::RecurringTask;
use crate::types::*;
use crate::window::RollingWindow;

/// Well-known early holders seeded at every start. Index 0 is the dev wallet.
pub const INITIAL_HOLDERS: [&str; 10] = [
    "0x742d35Cc6634C0532925a3b844Bc454e4438f44e",
    "0x1234567890123456789012345678901234567890",
    "0xAbCdEf0123456789AbCdEf0123456789AbCdEf01",
    "0x9876543210987654321098765432109876543210",
    "0xDeAdBeEfDeAdBeEfDeAdBeEfDeAdBeEfDeAdBeEf",
    "0xCaFeBaBeCaFeBaBeCaFeBaBeCaFeBaBeCaFeBaBe",
    "0x000000000000000000000000000000000000dEaD",
    "0x5c952063c7fc8610ffdb798152d69f0b9550762b",
    "0x3f5CE5FBFe3E9af3971dD833D26bA9b5C936f0bE",
    "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
];

const EARLY_HOLDER_SPREAD: f64 = 4_000_000.0;
const EARLY_HOLDER_FLOOR: f64 = 1_000_000.0;
const EARLY_BUY_LOOKBACK_MS: u64 = 10_000_000;
const EVENT_ID_SPREAD: u64 = 1_000;

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Running,
    Stopped,
}

/// Outcome of the silent replay performed by [`MarketSimulation::start`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatchUp {
    pub replayed: usize,
    pub skipped: u64,
}

/// A fully drawn buy, before it touches any state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuyOrder {
    pub wallet: String,
    pub tier: SizeTier,
    /// Requested size before the wallet cap.
    pub gross_usd: f64,
    pub tx_hash: String,
    pub id_suffix: u64,
}

/// Flat view of the engine's scalar state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimulationState {
    pub phase: Phase,
    pub anchor_time: Option<i64>,
    pub market_cap: f64,
    pub fortune_pool: f64,
    pub token_price: f64,
    pub total_supply: f64,
    pub rng_seed: u32,
    pub wallet_count: usize,
    pub event_history_len: usize,
    pub recent_events_len: usize,
    pub active_traders: usize,
    pub trade_count: u64,
    pub saturated_buys: u64,
}

// ─── MarketSimulation struct ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MarketSimulation {
    pub(crate) config: SimulationConfig,
    pub(crate) phase: Phase,
    pub(crate) anchor_time: Option<i64>,

    pub(crate) market_cap: f64,
    pub(crate) fortune_pool: f64,
    pub(crate) token_price: f64,

    pub(crate) rng: Lcg,
    pub(crate) ledger: HolderLedger,
    pub(crate) top_holders: Vec<TopHolder>,
    pub(crate) window: RollingWindow,
    pub(crate) metrics: TokenMetrics,
    pub(crate) recent_events: VecDeque<TokenEvent>,
    pub(crate) active_traders: ActiveTraders,

    pub(crate) ticker: Option<RecurringTask>,
    pub(crate) trade_count: u64,
    pub(crate) saturated_buys: u64,
}

impl Default for MarketSimulation {
    fn default() -> Self {
        Self::build(SimulationConfig::default())
    }
}

impl MarketSimulation {
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SimulationConfig) -> Self {
        Self {
            phase: Phase::Uninitialized,
            anchor_time: None,
            market_cap: config.initial_market_cap,
            fortune_pool: config.initial_pool,
            token_price: config.initial_price(),
            rng: Lcg::new(0),
            ledger: HolderLedger::new(),
            top_holders: Vec::new(),
            window: RollingWindow::new(config.short_window_ms, config.long_window_ms),
            metrics: TokenMetrics::default(),
            recent_events: VecDeque::with_capacity(config.recent_events_capacity),
            active_traders: ActiveTraders::new(config.active_traders_capacity),
            ticker: None,
            trade_count: 0,
            saturated_buys: 0,
            config,
        }
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Reset everything, seed from `anchor`, then silently replay the ticks
    /// that fall between `anchor` and `now`.
    pub fn start(&mut self, anchor: i64, now: i64) -> CatchUp {
        info!("starting simulation run anchored at {}", anchor);
        self.reset(anchor);
        self.seed_initial_holders(anchor);

        let mut ticker = RecurringTask::new(
            anchor,
            self.config.update_interval_ms,
            self.config.max_catch_up_ticks as u64,
        );
        let batch = ticker.take_due(now);
        self.ticker = Some(ticker);
        self.phase = Phase::Running;

        let mut replayed = 0;
        for slot in &batch.slots {
            let at = anchor + *slot as i64 * self.config.update_interval_ms;
            if self.step(at).is_some() {
                replayed += 1;
            }
        }
        if batch.skipped > 0 {
            warn!("catch-up capped: {} historical ticks skipped", batch.skipped);
        }
        debug!(
            "caught up {} ticks, market cap {:.2}, pool {:.2}",
            replayed, self.market_cap, self.fortune_pool
        );
        CatchUp { replayed, skipped: batch.skipped }
    }

    /// Cancel the recurring tick. State stays readable.
    pub fn stop(&mut self) {
        if self.ticker.take().is_some() {
            info!("simulation stopped after {} trades", self.trade_count);
        }
        if self.phase == Phase::Running {
            self.phase = Phase::Stopped;
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Timestamps of the live ticks due at `now`, oldest first.
    pub fn due_ticks(&mut self, now: i64) -> Vec<i64> {
        let Some(ticker) = self.ticker.as_mut() else {
            return Vec::new();
        };
        let batch = ticker.take_due(now);
        if batch.skipped > 0 {
            warn!("tick backlog capped: {} ticks skipped", batch.skipped);
        }
        batch.slots.iter().map(|&slot| ticker.slot_time(slot)).collect()
    }

    /// When the next live tick falls due, if the run is ticking.
    pub fn next_tick_at(&self) -> Option<i64> {
        self.ticker.as_ref().map(RecurringTask::next_due_at)
    }

    fn reset(&mut self, anchor: i64) {
        self.anchor_time = Some(anchor);
        self.rng = Lcg::from_anchor(anchor);
        self.market_cap = self.config.initial_market_cap;
        self.fortune_pool = self.config.initial_pool;
        self.token_price = self.market_cap / self.config.total_supply;
        self.ledger.clear();
        self.top_holders.clear();
        self.window.clear();
        self.metrics = TokenMetrics::default();
        self.recent_events.clear();
        self.active_traders.clear();
        self.ticker = None;
        self.trade_count = 0;
        self.saturated_buys = 0;
    }

    /// Early holders come from the anchor-seeded stream, ahead of any trade.
    fn seed_initial_holders(&mut self, anchor: i64) {
        let supply = self.config.total_supply;
        for (i, wallet) in INITIAL_HOLDERS.iter().enumerate() {
            let balance = if i == 0 {
                supply * self.config.dev_wallet_percent
            } else {
                (self.rng.next_unit() * EARLY_HOLDER_SPREAD).floor() + EARLY_HOLDER_FLOOR
            };
            let first_buy_tx_hash = self.rng.next_tx_hash();
            let first_buy_time = anchor - self.rng.next_below(EARLY_BUY_LOOKBACK_MS) as i64;
            self.ledger.seed(
                wallet.to_string(),
                WalletBalance { balance, first_buy_tx_hash, first_buy_time },
            );
        }
        self.top_holders = self.ledger.top_holders(self.config.top_holders_len, supply);
    }

    // ─── Transaction generation ──────────────────────────────────────────

    /// Draw and apply one buy at simulated time `at`.
    /// `None` when the run has no anchor or the drawn wallet is capped out.
    pub fn step(&mut self, at: i64) -> Option<TokenEvent> {
        let order = self.draw_order(at)?;
        self.execute_buy(order, at)
    }

    /// Consumes the same number of draws on every call so replays stay aligned.
    fn draw_order(&mut self, at: i64) -> Option<BuyOrder> {
        let anchor = self.anchor_time?;
        let cfg = &self.config;

        let elapsed = (at - anchor) as f64;
        let progress = policy::progress(elapsed, cfg.total_duration_ms());
        let target = policy::target_market_cap(cfg, progress);
        let noise = self.rng.next_noise(cfg.noise_amplitude_usd);

        let wallet = self.rng.next_wallet();
        let band = policy::classify(cfg, self.market_cap, target, noise);
        let weights = policy::weights_for(cfg, band);
        let tier = weights.select(self.rng.next_unit());
        let gross_usd = policy::trade_usd(cfg, tier, self.market_cap, self.rng.next_unit());

        let tx_hash = self.rng.next_tx_hash();
        let id_suffix = self.rng.next_below(EVENT_ID_SPREAD);
        Some(BuyOrder { wallet, tier, gross_usd, tx_hash, id_suffix })
    }

    /// Settle `order` against the ledger. A wallet already at the cap gets
    /// nothing and the tick leaves no trace.
    pub fn execute_buy(&mut self, order: BuyOrder, at: i64) -> Option<TokenEvent> {
        let anchor = self.anchor_time?;
        let price = self.token_price;
        let requested = order.gross_usd / price;

        let credit = self.ledger.credit(
            &order.wallet,
            requested,
            self.config.max_wallet_tokens(),
            &order.tx_hash,
            at,
        );
        let (amount, amount_usd) = match credit {
            Credit::Saturated => {
                self.saturated_buys += 1;
                warn!("wallet {} at balance cap, buy skipped", order.wallet);
                return None;
            }
            Credit::Full(tokens) => (tokens, order.gross_usd),
            Credit::Clamped { credited, .. } => (credited, credited * price),
        };

        // Pool fee is charged on the requested size, not the clamped one.
        self.fortune_pool += order.gross_usd * self.config.fortune_pool_fee_rate;
        self.market_cap += amount_usd;
        self.token_price = self.market_cap / self.config.total_supply;
        self.metrics.buy_volume += amount_usd;

        self.top_holders = self
            .ledger
            .top_holders(self.config.top_holders_len, self.config.total_supply);

        self.window.push(EventSample { timestamp: at, amount_usd });
        self.window.update(at, &mut self.metrics);
        self.active_traders.insert(&order.wallet);

        let elapsed_secs = ((at - anchor).max(0) / 1_000) as u64;
        let event = TokenEvent {
            id: format!("{}{}", at, order.id_suffix),
            side: Side::Buy,
            timestamp: at,
            block_number: self.config.block_number_base + elapsed_secs,
            tx_hash: order.tx_hash,
            amount,
            amount_usd,
            price: self.token_price,
            account: order.wallet,
            tier: order.tier,
        };

        self.recent_events.push_front(event.clone());
        self.recent_events.truncate(self.config.recent_events_capacity);
        self.trade_count += 1;

        debug!(
            "{} buy {:.2} USD by {} -> market cap {:.2}",
            event.tier.label(),
            event.amount_usd,
            event.account,
            self.market_cap
        );
        Some(event)
    }

    // ─── Views ───────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> TokenStreamSnapshot {
        let token = &self.config.token;
        TokenStreamSnapshot {
            token_ca: Some(token.contract_address.clone()),
            token_symbol: Some(token.symbol.clone()),
            token_name: Some(token.name.clone()),
            token_price: Some(self.token_price),
            last_trade_timestamp: self.recent_events.front().map(|e| e.timestamp),
            market_cap: Some(self.market_cap),
            fortune_pool: self.fortune_pool,
            active_trader_count: self.active_traders.len() as u32
                + self.config.active_trader_display_offset,
            metrics: self.metrics.clone(),
            recent_events: self.recent_events.iter().cloned().collect(),
            top_holders: self.top_holders.clone(),
        }
    }

    pub fn state(&self) -> SimulationState {
        SimulationState {
            phase: self.phase,
            anchor_time: self.anchor_time,
            market_cap: self.market_cap,
            fortune_pool: self.fortune_pool,
            token_price: self.token_price,
            total_supply: self.config.total_supply,
            rng_seed: self.rng.state(),
            wallet_count: self.ledger.len(),
            event_history_len: self.window.len(),
            recent_events_len: self.recent_events.len(),
            active_traders: self.active_traders.len(),
            trade_count: self.trade_count,
            saturated_buys: self.saturated_buys,
        }
    }

    pub fn config(&self) -> &SimulationConfig { &self.config }
    pub fn phase(&self) -> Phase { self.phase }
    pub fn anchor_time(&self) -> Option<i64> { self.anchor_time }
    pub fn market_cap(&self) -> f64 { self.market_cap }
    pub fn fortune_pool(&self) -> f64 { self.fortune_pool }
    pub fn token_price(&self) -> f64 { self.token_price }
    pub fn metrics(&self) -> &TokenMetrics { &self.metrics }
    pub fn ledger(&self) -> &HolderLedger { &self.ledger }
    pub fn top_holders(&self) -> &[TopHolder] { &self.top_holders }
    pub fn active_traders(&self) -> &ActiveTraders { &self.active_traders }
    pub fn event_history(&self) -> &RollingWindow { &self.window }
    pub fn trade_count(&self) -> u64 { self.trade_count }

    pub fn recent_events(&self) -> impl Iterator<Item = &TokenEvent> {
        self.recent_events.iter()
    }

    /// Where the curve wants market cap to be at `at`.
    pub fn target_at(&self, at: i64) -> Option<f64> {
        let anchor = self.anchor_time?;
        let progress = policy::progress((at - anchor) as f64, self.config.total_duration_ms());
        Some(policy::target_market_cap(&self.config, progress))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

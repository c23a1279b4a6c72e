// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Fortune Market Simulation - Display Formatting
//
// The engine keeps raw f64 everywhere. Rounding happens here, at the edge,
// through Decimal so fixed-point output does not inherit binary artifacts.

use chrono::{DateTime, Utc};
use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

const THOUSAND: f64 = 1_000.0;
const MILLION: f64 = 1_000_000.0;

/// Round half away from zero to `dp` places, keeping trailing zeros.
fn fixed(value: f64, dp: u32) -> String {
    match Decimal::from_f64(value) {
        Some(d) => {
            let mut d = d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
            d.rescale(dp);
            d.to_string()
        }
        None => format!("{:.*}", dp as usize, value),
    }
}

/// Numeric counterpart of [`fixed`].
pub fn round_to(value: f64, dp: u32) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

fn compact(value: f64) -> String {
    if value >= MILLION {
        format!("{}M", fixed(value / MILLION, 2))
    } else if value >= THOUSAND {
        format!("{}K", fixed(value / THOUSAND, 2))
    } else {
        fixed(value, 2)
    }
}

/// `$1.23M`, `$4.56K`, `$7.89`
pub fn format_usd(amount_usd: f64) -> String {
    format!("${}", compact(amount_usd))
}

pub fn format_tokens(amount: f64) -> String {
    compact(amount)
}

/// Share of supply as a percentage with four decimals, no `%` sign.
pub fn format_supply_percent(amount: f64, total_supply: f64) -> String {
    fixed(amount / total_supply * 100.0, 4)
}

/// `0x742d...f44e`
pub fn format_wallet(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Relative age of `timestamp` at `now`; a calendar date past one day.
pub fn format_age(timestamp: i64, now: i64) -> String {
    let secs = (now - timestamp).div_euclid(1_000);
    let mins = secs.div_euclid(60);
    let hours = mins.div_euclid(60);
    if secs < 60 {
        format!("{}s ago", secs)
    } else if mins < 60 {
        format!("{}m ago", mins)
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else {
        DateTime::<Utc>::from_timestamp_millis(timestamp)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| format!("{}h ago", hours))
    }
}

// ─── Countdown ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Countdown {
    pub remaining_secs: i64,
    pub minutes: i64,
    pub seconds: i64,
    /// Elapsed share of the window, 0..=100.
    pub progress_pct: f64,
}

impl Countdown {
    pub fn at(start_time: i64, now: i64, duration_secs: i64) -> Self {
        let duration_secs = duration_secs.max(0);
        let elapsed = (now - start_time).div_euclid(1_000);
        let remaining_secs = (duration_secs - elapsed).clamp(0, duration_secs);
        let progress_pct = if duration_secs > 0 {
            (duration_secs - remaining_secs) as f64 / duration_secs as f64 * 100.0
        } else {
            100.0
        };
        Self {
            remaining_secs,
            minutes: remaining_secs / 60,
            seconds: remaining_secs % 60,
            progress_pct,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.remaining_secs == 0
    }

    /// `MM:SS`
    pub fn label(&self) -> String {
        format!("{:02}:{:02}", self.minutes, self.seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_usd_bands() {
        assert_eq!(format_usd(7.891), "$7.89");
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(4_560.0), "$4.56K");
        assert_eq!(format_usd(60_000.0), "$60.00K");
        assert_eq!(format_usd(1_234_567.0), "$1.23M");
    }

    #[test]
    fn test_format_tokens_and_percent() {
        assert_eq!(format_tokens(30_000_000.0), "30.00M");
        assert_eq!(format_tokens(12.5), "12.50");
        assert_eq!(format_supply_percent(30_000_000.0, 1e9), "3.0000");
        assert_eq!(format_supply_percent(1_234_567.0, 1e9), "0.1235");
    }

    #[test]
    fn test_format_wallet() {
        assert_eq!(format_wallet("0x742d35Cc6634C0532925a3b844Bc454e4438f44e"), "0x742d...f44e");
        assert_eq!(format_wallet("0x1234"), "0x1234");
    }

    #[test]
    fn test_format_age() {
        let now = 1_767_225_600_000;
        assert_eq!(format_age(now - 59_999, now), "59s ago");
        assert_eq!(format_age(now - 60_000, now), "1m ago");
        assert_eq!(format_age(now - 3 * 3_600_000, now), "3h ago");
        assert_eq!(format_age(now - 48 * 3_600_000, now), "2025-12-30");
    }

    #[test]
    fn test_countdown() {
        let start = 1_767_225_600_000;
        let fresh = Countdown::at(start, start, 1_200);
        assert_eq!(fresh.label(), "20:00");
        assert_eq!(fresh.progress_pct, 0.0);

        let mid = Countdown::at(start, start + 605_500, 1_200);
        assert_eq!(mid.label(), "09:55");
        assert_eq!(round_to(mid.progress_pct, 2), 50.42);
        assert_eq!(Decimal::from_f64(round_to(mid.progress_pct, 1)), Some(dec!(50.4)));

        let done = Countdown::at(start, start + 3_600_000, 1_200);
        assert!(done.is_finished());
        assert_eq!(done.progress_pct, 100.0);
    }
}

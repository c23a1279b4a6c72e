// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Fortune Replay - headless runs of the market simulation
//
// Usage:
//   cargo run --release --bin replay -- run                       # 20 min from now
//   cargo run --release --bin replay -- run --anchor 1767225600000 --time-series
//   cargo run --release --bin replay -- sweep --runs 30 --seed 42
//   RUST_LOG=debug cargo run --bin replay -- run --minutes 2

mod report;
mod sweep;
mod time_series;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info};

use fortune_engine::{Clock, SimulationConfig, SystemClock};

use crate::time_series::TimeSeriesRecorder;

// ─── CLI ────────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "replay", about = "Headless replay of the $FORTUNE market simulation", version)]
struct Cli {
    /// JSON file with configuration overrides.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Where reports and time series are written.
    #[arg(long, value_name = "DIR", default_value = "replay-results", global = true)]
    out_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay one run from a cold start.
    Run {
        /// Anchor in epoch milliseconds. Defaults to now.
        #[arg(long)]
        anchor: Option<i64>,

        /// Simulated minutes after the anchor.
        #[arg(long, default_value_t = 20.0)]
        minutes: f64,

        /// Write one JSON line per tick.
        #[arg(long)]
        time_series: bool,
    },
    /// Monte Carlo over anchors drawn from a seeded generator.
    Sweep {
        #[arg(long, default_value_t = 30)]
        runs: usize,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        #[arg(long, default_value_t = 20.0)]
        minutes: f64,

        #[arg(long)]
        time_series: bool,
    },
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ReplayError {
    #[error("config: {0}")]
    Config(#[from] fortune_engine::ConfigError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig, ReplayError> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            Ok(SimulationConfig::from_json(&json)?)
        }
        None => Ok(SimulationConfig::default()),
    }
}

fn write_json<T: serde::Serialize>(dir: &Path, name: &str, value: &T) -> Result<PathBuf, ReplayError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value)?)?;
    Ok(path)
}

// ─── Commands ───────────────────────────────────────────────────────────────

fn run_command(cli: &Cli, config: &SimulationConfig) -> Result<(), ReplayError> {
    match &cli.command {
        Command::Run { anchor, minutes, time_series } => {
            let anchor = anchor.unwrap_or_else(|| SystemClock::new().now_ms());
            let horizon_ms = (minutes * 60_000.0) as i64;
            let mut recorder = time_series.then(TimeSeriesRecorder::new);

            let summary = sweep::run_single(config, anchor, horizon_ms, recorder.as_mut())?;

            println!("\n  Fortune Replay v{}", env!("CARGO_PKG_VERSION"));
            println!("  Anchor: {} | Horizon: {:.1} min | Ticks: {}", anchor, minutes, summary.ticks);
            println!("  {}", "-".repeat(60));
            println!("  Market cap   {:>14.2}  (target {:.2}, {:+.2}%)",
                summary.final_market_cap, summary.target_market_cap, summary.tracking_error_pct);
            println!("  Fortune pool {:>14.2}", summary.fortune_pool);
            println!("  Trades       {:>14}  (saturated {})", summary.trades, summary.saturated_buys);
            println!("  Tiers        {:>14}  whale/medium/shrimp",
                format!("{}/{}/{}", summary.tier_counts[0], summary.tier_counts[1], summary.tier_counts[2]));
            println!("  Wallets      {:>14}", summary.wallets);

            let path = write_json(&cli.out_dir, &format!("run-{}.json", anchor), &summary)?;
            println!("\n  Summary saved to: {}", path.display());
            if let Some(rec) = recorder {
                let ts_path = cli.out_dir.join("time-series").join(format!("run-{}.jsonl", anchor));
                rec.write_jsonl(&ts_path)?;
                println!("  Time series ({} ticks): {}\n", rec.len(), ts_path.display());
            }
        }
        Command::Sweep { runs, seed, minutes, time_series } => {
            let horizon_ms = (minutes * 60_000.0) as i64;
            let ts_dir = time_series.then(|| cli.out_dir.join("time-series"));
            info!("sweeping {} runs from seed {}", runs, seed);

            let report = sweep::run_sweep(config, *runs, *seed, horizon_ms, ts_dir.as_deref())?;

            println!("\n  Fortune Replay sweep | PRNG: {} | Runs: {} | Base seed: {}",
                report.prng, report.n_runs, report.base_seed);
            println!("  {:<22} {:>12} {:>10} {:>12} {:>12}", "Metric", "Mean", "±CI", "Min", "Max");
            println!("  {}", "-".repeat(72));
            for (name, stats) in [
                ("tracking error %", &report.tracking_error_pct),
                ("final market cap", &report.final_market_cap),
                ("fortune pool", &report.fortune_pool),
                ("trades", &report.trades),
                ("saturated buys", &report.saturated_buys),
                ("largest holder %", &report.largest_holder_pct),
            ] {
                println!("  {:<22} {:>12.2} {:>10.2} {:>12.2} {:>12.2}",
                    name, stats.mean, stats.half_width(), stats.min, stats.max);
            }

            let path = write_json(&cli.out_dir, &format!("sweep-{}.json", report.timestamp), &report)?;
            println!("\n  Results saved to: {}\n", path.display());
        }
    }
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| run_command(&cli, &config));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("replay failed: {}", e);
            eprintln!("replay failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

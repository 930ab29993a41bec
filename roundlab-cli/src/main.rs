//! RoundLab CLI — run, sweep and synthetic-data commands.
//!
//! Commands:
//! - `run` — execute one backtest from a TOML config over a round CSV
//! - `sweep` — grid-search parameters of a TOML config in parallel
//! - `synth` — write seeded synthetic rounds to CSV
//!
//! Logs go to stderr (`RUST_LOG` overrides the `info` default) so `--json`
//! output on stdout stays machine-readable.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use roundlab_core::engine::{BacktestResult, StopReason};
use roundlab_runner::{
    dataset_hash, load_rounds_csv, run_backtest, synthetic_rounds, write_rounds_csv, Axis,
    AxisTarget, BacktestConfig, LoadedRounds, ParamGrid, ParamSweep, RunReport,
};

#[derive(Parser)]
#[command(
    name = "roundlab",
    about = "RoundLab CLI — backtesting for binary UP/DOWN prediction rounds"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the rounds come from: a CSV file or a seeded synthetic series.
#[derive(Args)]
struct DataSource {
    /// Round CSV file.
    #[arg(long, conflicts_with = "synthetic")]
    data: Option<PathBuf>,

    /// Generate this many synthetic rounds instead of reading a file.
    #[arg(long)]
    synthetic: Option<usize>,

    /// Seed for --synthetic.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        #[command(flatten)]
        source: DataSource,

        /// Print the full report as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Also write the JSON report to this file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Grid-search parameters of a base TOML config.
    Sweep {
        /// Path to the base TOML config file.
        #[arg(long)]
        config: PathBuf,

        #[command(flatten)]
        source: DataSource,

        /// Swept parameter, e.g. `engine.loss_threshold=2,3,4` or
        /// `signal.min_payout=1.3,1.5`. Repeatable.
        #[arg(long = "axis", required = true)]
        axes: Vec<String>,

        /// Run grid points one after another.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Number of best runs to list.
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Print every report as a JSON array.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write seeded synthetic rounds to a CSV file.
    Synth {
        /// Number of rounds.
        #[arg(long, default_value_t = 10_000)]
        rounds: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output CSV path.
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            source,
            json,
            output,
        } => run_cmd(&config, &source, json, output.as_deref()),
        Commands::Sweep {
            config,
            source,
            axes,
            sequential,
            top,
            json,
        } => sweep_cmd(&config, &source, &axes, sequential, top, json),
        Commands::Synth { rounds, seed, out } => synth_cmd(rounds, seed, &out),
    }
}

fn load_source(source: &DataSource) -> Result<LoadedRounds> {
    match (&source.data, source.synthetic) {
        (Some(path), None) => load_rounds_csv(path)
            .with_context(|| format!("loading rounds from {}", path.display())),
        (None, Some(n)) => {
            tracing::warn!(rounds = n, seed = source.seed, "using synthetic rounds");
            let records = synthetic_rounds(n, source.seed);
            Ok(LoadedRounds {
                dataset_hash: dataset_hash(&records),
                records,
                duplicates_dropped: 0,
            })
        }
        (None, None) => bail!("one of --data or --synthetic is required"),
        (Some(_), Some(_)) => bail!("--data and --synthetic are mutually exclusive"),
    }
}

fn run_cmd(
    config_path: &Path,
    source: &DataSource,
    json: bool,
    output: Option<&Path>,
) -> Result<()> {
    let config = BacktestConfig::from_file(config_path)?;
    let loaded = load_source(source)?;
    let report = run_backtest(&config, &loaded.records, &loaded.dataset_hash)?;

    let rendered = serde_json::to_string_pretty(&report)?;
    if let Some(path) = output {
        std::fs::write(path, &rendered)
            .with_context(|| format!("writing report to {}", path.display()))?;
    }
    if json {
        println!("{rendered}");
    } else {
        print_summary(&report, &loaded);
    }
    Ok(())
}

fn sweep_cmd(
    config_path: &Path,
    source: &DataSource,
    axes: &[String],
    sequential: bool,
    top: usize,
    json: bool,
) -> Result<()> {
    let base = BacktestConfig::from_file(config_path)?;
    let mut grid = ParamGrid::new(base);
    for axis in axes {
        grid = grid.with_axis(axis.parse::<Axis>()?);
    }
    let loaded = load_source(source)?;

    let results = ParamSweep::new()
        .with_parallelism(!sequential)
        .sweep(&grid, &loaded.records, &loaded.dataset_hash)?;

    for (config, err) in results.failures() {
        eprintln!("FAILED {}: {err}", describe_point(&grid, config));
    }

    if json {
        let reports: Vec<&RunReport> = results.successes().collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    let mut ranked: Vec<&RunReport> = results.successes().collect();
    ranked.sort_by(|a, b| b.result.final_balance.total_cmp(&a.result.final_balance));

    println!();
    println!("=== Sweep ===");
    println!("Grid points:    {}", results.len());
    println!("Failed:         {}", results.failures().count());
    println!();
    println!(
        "{:>4}  {:>10}  {:>8}  {:>7}  {:>7}  point",
        "rank", "final", "roi %", "trades", "dd %"
    );
    for (rank, report) in ranked.iter().take(top).enumerate() {
        let r = &report.result;
        println!(
            "{:>4}  {:>10.4}  {:>8.2}  {:>7}  {:>7.2}  {}",
            rank + 1,
            r.final_balance,
            r.roi * 100.0,
            r.total_trades,
            r.max_drawdown_percent,
            describe_point(&grid, &report.config),
        );
    }
    println!();
    Ok(())
}

/// `engine.loss_threshold=3 signal.min_payout=1.5` for one grid point.
fn describe_point(grid: &ParamGrid, config: &BacktestConfig) -> String {
    let engine = serde_json::to_value(&config.engine).unwrap_or_default();
    grid.axes
        .iter()
        .map(|axis| {
            let value = match axis.target {
                AxisTarget::Engine => engine.get(&axis.name).map(|v| v.to_string()),
                AxisTarget::Signal => config.signal.params.get(&axis.name).map(|v| v.to_string()),
                AxisTarget::Fallback => config
                    .fallback
                    .as_ref()
                    .and_then(|f| f.params.get(&axis.name))
                    .map(|v| v.to_string()),
            };
            format!("{axis}={}", value.unwrap_or_else(|| "?".into()))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn synth_cmd(rounds: usize, seed: u64, out: &Path) -> Result<()> {
    let records = synthetic_rounds(rounds, seed);
    let file = std::fs::File::create(out)
        .with_context(|| format!("creating {}", out.display()))?;
    write_rounds_csv(file, &records)?;
    println!(
        "Wrote {} synthetic rounds (seed {seed}, dataset {}) to {}",
        records.len(),
        dataset_hash(&records).short(),
        out.display()
    );
    Ok(())
}

fn fmt_time(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn print_summary(report: &RunReport, loaded: &LoadedRounds) {
    let r: &BacktestResult = &report.result;
    println!();
    println!("=== Backtest Result ===");
    println!("Run:            {}", report.run_id.short());
    println!("Signal:         {}", report.config.signal.structure());
    if let Some(fallback) = &report.config.fallback {
        println!("Fallback:       {}", fallback.structure());
    }
    println!("Dataset:        {}", report.dataset_hash.short());
    if let Some((first, last)) = loaded.span() {
        println!("Period:         {} to {}", fmt_time(first), fmt_time(last));
    }
    println!("Rounds:         {}", r.total_rounds);
    if loaded.duplicates_dropped > 0 {
        println!("Duplicates:     {} dropped at load", loaded.duplicates_dropped);
    }
    println!(
        "Skipped:        {} (no signal {}, cooldown {}, bet rejected {})",
        r.skipped.total(),
        r.skipped.no_signal,
        r.skipped.cooldown,
        r.skipped.bet_rejected
    );
    println!(
        "Data gaps:      {} (missing {}, empty pool {}, unknown winner {}, out of order {})",
        r.data_gaps.total(),
        r.data_gaps.missing_field,
        r.data_gaps.empty_pool,
        r.data_gaps.unknown_winner,
        r.data_gaps.out_of_order
    );
    println!();
    println!("--- Performance ---");
    println!("Trades:         {} ({} W / {} L)", r.total_trades, r.wins, r.losses);
    println!("Win Rate:       {:.1}%", r.win_rate * 100.0);
    println!("Start / Final:  {:.4} / {:.4}", r.starting_balance, r.final_balance);
    println!("Peak:           {:.4}", r.peak_balance);
    println!("ROI:            {:.2}%", r.roi * 100.0);
    println!("Max Drawdown:   {:.2}%", r.max_drawdown_percent);
    println!("Max Consec Win: {}", r.longest_win_streak);
    println!("Max Consec Loss:{}", r.longest_loss_streak);
    println!();
    println!("--- Circuit Breaker ---");
    println!("Activations:    {}", r.cooldown_activations);
    println!(
        "Normal:         {} trades, {:.1}% win, net {:+.4}",
        r.normal.trades,
        r.normal.win_rate * 100.0,
        r.normal.net_profit
    );
    println!(
        "Cooldown:       {} trades, {:.1}% win, net {:+.4}",
        r.cooldown.trades,
        r.cooldown.win_rate * 100.0,
        r.cooldown.net_profit
    );
    match r.stop_reason {
        StopReason::Exhausted => {}
        StopReason::Busted => {
            println!();
            println!("BUSTED: bankroll exhausted, run stopped early");
        }
        StopReason::CeilingReached => {
            println!();
            println!("Stopped at bankroll ceiling");
        }
    }
    println!();
}

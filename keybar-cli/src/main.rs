//! KeyBar CLI: screen, backtest, and config check commands.
//!
//! Commands:
//! - `screen`: filter a quote snapshot CSV, optionally confirming above session VWAP
//! - `backtest`: run the key-bar strategy over a list of symbols and export artifacts
//! - `check-config`: validate a TOML config and print its fingerprint
//!
//! Logging goes to stderr; the filter comes from `KEYBAR_LOG` (default `info`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use keybar_core::data::{BarSource, CircuitBreaker, CsvBarSource, SyntheticSource, YahooProvider};
use keybar_core::screen::{confirm_with_vwap, Screener, SnapshotScreener};
use keybar_runner::{render_summary_table, run_batch, save_artifacts, BacktestConfig};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "keybar",
    about = "KeyBar Lab: intraday key-bar screener and backtester"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceKind {
    /// Yahoo Finance chart API.
    Yahoo,
    /// Directory of `<SYMBOL>.csv` files.
    Csv,
    /// Seeded random walk, no network.
    Synthetic,
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Where bars come from.
    #[arg(long, value_enum, default_value_t = SourceKind::Yahoo)]
    source: SourceKind,

    /// Bar directory for `--source csv`.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Seed for `--source synthetic`.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter a quote snapshot with the config's [screen] section.
    Screen {
        /// Path to a TOML config file with a [screen] section.
        #[arg(long)]
        config: PathBuf,

        /// Quote snapshot CSV.
        #[arg(long)]
        snapshot: PathBuf,

        /// Session used for VWAP confirmation (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,

        #[command(flatten)]
        source: SourceArgs,
    },
    /// Backtest symbols and write summary, trades and equity artifacts.
    Backtest {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Symbols to test. May be combined with --snapshot.
        symbols: Vec<String>,

        /// Screen this quote snapshot and add the matches to the symbol list.
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Last session of the lookback window (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        #[command(flatten)]
        source: SourceArgs,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Validate a config file and print its fingerprint.
    CheckConfig {
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    match cli.command {
        Commands::Screen {
            config,
            snapshot,
            date,
            source,
        } => run_screen_cmd(config, snapshot, date, source),
        Commands::Backtest {
            config,
            symbols,
            snapshot,
            end,
            source,
            output_dir,
        } => run_backtest_cmd(config, symbols, snapshot, end, source, output_dir),
        Commands::CheckConfig { config } => run_check_config(config),
    }
}

fn init_tracing() -> Result<()> {
    let filter = std::env::var("KEYBAR_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| anyhow::anyhow!("invalid log filter: {err}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn build_source(args: &SourceArgs) -> Result<Box<dyn BarSource>> {
    Ok(match args.source {
        SourceKind::Yahoo => {
            let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
            Box::new(YahooProvider::new(circuit_breaker)?)
        }
        SourceKind::Csv => {
            if !args.data_dir.is_dir() {
                bail!("bar directory does not exist: {}", args.data_dir.display());
            }
            Box::new(CsvBarSource::new(&args.data_dir))
        }
        SourceKind::Synthetic => Box::new(SyntheticSource::new(args.seed)),
    })
}

fn parse_date(s: Option<&str>) -> Result<NaiveDate> {
    match s {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD")),
        None => Ok(chrono::Utc::now().date_naive()),
    }
}

/// Screens `snapshot` with the config's filter, applying VWAP confirmation when enabled.
fn screen_symbols(
    config: &BacktestConfig,
    snapshot: &Path,
    session: NaiveDate,
    source: &dyn BarSource,
) -> Result<Vec<String>> {
    let Some(filter) = &config.screen else {
        bail!("config has no [screen] section");
    };
    let screener = SnapshotScreener::from_csv(snapshot)
        .with_context(|| format!("failed to load snapshot {}", snapshot.display()))?;
    let mut symbols = screener.query(filter)?;
    if filter.vwap_confirm {
        symbols = confirm_with_vwap(source, symbols, session, config.account.interval);
    }
    Ok(symbols)
}

fn run_screen_cmd(
    config_path: PathBuf,
    snapshot: PathBuf,
    date: Option<String>,
    source_args: SourceArgs,
) -> Result<()> {
    let config = BacktestConfig::from_file(&config_path)?;
    let session = parse_date(date.as_deref())?;
    let source = build_source(&source_args)?;

    let symbols = screen_symbols(&config, &snapshot, session, source.as_ref())?;
    info!(matched = symbols.len(), %session, "screen complete");
    if symbols.is_empty() {
        println!("No symbols matched.");
        return Ok(());
    }
    for (rank, symbol) in symbols.iter().enumerate() {
        println!("{:>3}. {symbol}", rank + 1);
    }
    Ok(())
}

fn run_backtest_cmd(
    config_path: PathBuf,
    mut symbols: Vec<String>,
    snapshot: Option<PathBuf>,
    end: Option<String>,
    source_args: SourceArgs,
    output_dir: PathBuf,
) -> Result<()> {
    let config = BacktestConfig::from_file(&config_path)?;
    let end = parse_date(end.as_deref())?;
    let source = build_source(&source_args)?;

    if let Some(snapshot) = snapshot {
        for s in screen_symbols(&config, &snapshot, end, source.as_ref())? {
            if !symbols.contains(&s) {
                symbols.push(s);
            }
        }
    }
    if symbols.is_empty() {
        bail!("no symbols given; pass symbols or --snapshot");
    }
    for s in &mut symbols {
        *s = s.to_uppercase();
    }

    let report = run_batch(source.as_ref(), &symbols, end, &config, None)?;

    println!();
    println!("=== KeyBar Backtest {} to {} ===", report.start, report.end);
    println!("Config:  {}", &report.config_id[..12.min(report.config_id.len())]);
    println!("Source:  {}", source.name());
    println!();
    print!("{}", render_summary_table(&report));

    let dir = save_artifacts(&report, &output_dir)?;
    info!(dir = %dir.display(), "artifacts saved");
    println!();
    println!("Artifacts saved to: {}", dir.display());
    Ok(())
}

fn run_check_config(config_path: PathBuf) -> Result<()> {
    let config = BacktestConfig::from_file(&config_path)?;
    let strategy = &config.strategy;
    println!("Config OK: {}", config_path.display());
    println!("Fingerprint:    {}", config.fingerprint());
    println!("Interval:       {}", config.account.interval);
    println!("Lookback days:  {}", config.account.lookback_days);
    println!("Warm-up bars:   {}", strategy.required_bars());
    println!(
        "Checklist:      {}",
        if strategy.checklist.enabled_checks().is_empty() {
            "off".to_string()
        } else {
            strategy
                .checklist
                .enabled_checks()
                .iter()
                .map(|c| c.name())
                .collect::<Vec<_>>()
                .join(", ")
        }
    );
    if !strategy.relative_strength.baseline.is_causal() && strategy.relative_strength.enabled {
        warn!("relative-strength ATR baseline uses the whole series (lookahead)");
    }
    Ok(())
}

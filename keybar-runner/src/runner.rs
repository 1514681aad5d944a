//! Per-symbol pipeline: fetch, signals, simulation, equity and metrics.
//!
//! Two entry points:
//! - `run_symbol()`: fetches bars from a `BarSource`, then runs. Used by the batch runner.
//! - `run_series()`: takes an already loaded series. Used by tests and benchmarks.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use keybar_core::data::{BarSource, DataError};
use keybar_core::domain::{BarSeries, Trade};
use keybar_core::signals::compute_signals;
use keybar_core::simulator::{simulate, OpenPosition};

use crate::config::BacktestConfig;
use crate::performance::{equity_curve, metrics, EquityCurve, Metrics};

/// Why a symbol produced no result. None of these abort a batch.
#[derive(Debug, Error)]
pub enum SymbolError {
    #[error("no bars for '{symbol}' in the requested window")]
    DataUnavailable { symbol: String },

    #[error("'{symbol}' has {have} bars, warm-up needs {need}")]
    InsufficientHistory {
        symbol: String,
        have: usize,
        need: usize,
    },

    #[error("data error: {0}")]
    Data(DataError),

    #[error("batch cancelled before '{symbol}' ran")]
    Cancelled { symbol: String },
}

impl SymbolError {
    /// Stable machine-readable tag used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            SymbolError::DataUnavailable { .. } => "data_unavailable",
            SymbolError::InsufficientHistory { .. } => "insufficient_history",
            SymbolError::Data(_) => "data_error",
            SymbolError::Cancelled { .. } => "cancelled",
        }
    }
}

/// Complete result for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolResult {
    pub symbol: String,
    pub bar_count: usize,
    pub keybar_count: usize,
    pub entry_signal_count: usize,
    pub exit_signal_count: usize,
    /// Entry signals skipped because the stop ATR was still warming up.
    pub suppressed_entries: usize,
    pub trades: Vec<Trade>,
    pub metrics: Metrics,
    pub equity: EquityCurve,
    /// Position still held at the last bar; not part of the trade log.
    pub open_position: Option<OpenPosition>,
}

/// Inclusive `[end - lookback_days, end]` calendar window.
pub fn history_window(end: NaiveDate, lookback_days: u32) -> (NaiveDate, NaiveDate) {
    (end - Duration::days(i64::from(lookback_days)), end)
}

/// Fetches bars for `symbol` over `[start, end]` and runs the pipeline.
pub fn run_symbol(
    source: &dyn BarSource,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    config: &BacktestConfig,
) -> Result<SymbolResult, SymbolError> {
    let series = source
        .fetch(symbol, start, end, config.account.interval)
        .map_err(|e| match e {
            DataError::DataUnavailable { symbol } => SymbolError::DataUnavailable { symbol },
            other => SymbolError::Data(other),
        })?;
    debug!(symbol, source = source.name(), bars = series.len(), "bars fetched");
    run_series(&series, config)
}

/// Runs signals, simulation and performance over a loaded series.
pub fn run_series(series: &BarSeries, config: &BacktestConfig) -> Result<SymbolResult, SymbolError> {
    let need = config.strategy.required_bars();
    if series.len() < need {
        return Err(SymbolError::InsufficientHistory {
            symbol: series.symbol().to_string(),
            have: series.len(),
            need,
        });
    }

    let bars = series.bars();
    let signals = compute_signals(bars, &config.strategy);
    let report = simulate(
        series,
        &signals.entry,
        &signals.exit,
        &config.strategy.trailing_stop,
        &config.strategy.profit_target,
    );
    let equity = equity_curve(bars, &report.trades, &config.account);
    let metrics = metrics(&report.trades, &equity);

    info!(
        symbol = series.symbol(),
        bars = bars.len(),
        trades = metrics.trade_count,
        win_rate = metrics.win_rate,
        total_pnl_pct = metrics.total_pnl_pct,
        max_drawdown_pct = metrics.max_drawdown_pct,
        open = report.open_position.is_some(),
        "symbol complete"
    );

    Ok(SymbolResult {
        symbol: series.symbol().to_string(),
        bar_count: bars.len(),
        keybar_count: signals.keybar.iter().filter(|&&b| b).count(),
        entry_signal_count: signals.entry_count(),
        exit_signal_count: signals.exit_count(),
        suppressed_entries: report.suppressed_entries,
        trades: report.trades,
        metrics,
        equity,
        open_position: report.open_position,
    })
}

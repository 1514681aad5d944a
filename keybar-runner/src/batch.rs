//! Batch runner: independent per-symbol pipelines on a bounded rayon pool.
//!
//! Each symbol owns its series end to end. Results come back through a single
//! `collect`, so the report is assembled by one writer after the pool drains.
//! A failing symbol is recorded in `failures` and never aborts the batch.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use keybar_core::data::BarSource;

use crate::config::{BacktestConfig, ConfigError, ConfigId};
use crate::runner::{history_window, run_symbol, SymbolError, SymbolResult};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no symbols to run")]
    NoSymbols,

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolFailure {
    pub symbol: String,
    pub kind: String,
    pub message: String,
}

/// One line of the cross-symbol summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub symbol: String,
    pub bars: usize,
    pub trades: usize,
    pub win_rate: f64,
    pub avg_win_pct: f64,
    pub avg_loss_pct: f64,
    pub avg_win_abs: f64,
    pub avg_loss_abs: f64,
    pub total_pnl_pct: f64,
    pub total_pnl_abs: f64,
    pub max_drawdown_pct: f64,
    pub open_position: bool,
}

impl From<&SymbolResult> for SummaryRow {
    fn from(r: &SymbolResult) -> Self {
        Self {
            symbol: r.symbol.clone(),
            bars: r.bar_count,
            trades: r.metrics.trade_count,
            win_rate: r.metrics.win_rate,
            avg_win_pct: r.metrics.avg_win_pct,
            avg_loss_pct: r.metrics.avg_loss_pct,
            avg_win_abs: r.metrics.avg_win_abs,
            avg_loss_abs: r.metrics.avg_loss_abs,
            total_pnl_pct: r.metrics.total_pnl_pct,
            total_pnl_abs: r.metrics.total_pnl_abs,
            max_drawdown_pct: r.metrics.max_drawdown_pct,
            open_position: r.open_position.is_some(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub config_id: ConfigId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Successful symbols, in input order.
    pub results: Vec<SymbolResult>,
    pub failures: Vec<SymbolFailure>,
    pub summary: Vec<SummaryRow>,
}

impl BatchReport {
    pub fn success_count(&self) -> usize {
        self.results.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn total_trades(&self) -> usize {
        self.results.iter().map(|r| r.trades.len()).sum()
    }
}

/// Runs every symbol over the lookback window ending at `end`.
///
/// The config is validated before any symbol is fetched. If `cancel` is set while the
/// batch runs, symbols not yet started are reported as `cancelled`.
pub fn run_batch(
    source: &dyn BarSource,
    symbols: &[String],
    end: NaiveDate,
    config: &BacktestConfig,
    cancel: Option<&AtomicBool>,
) -> Result<BatchReport, BatchError> {
    config.validate()?;
    if symbols.is_empty() {
        return Err(BatchError::NoSymbols);
    }

    let (start, end) = history_window(end, config.account.lookback_days);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.batch.concurrency)
        .build()?;

    info!(
        symbols = symbols.len(),
        %start,
        %end,
        concurrency = config.batch.concurrency,
        source = source.name(),
        "batch started"
    );

    let outcomes: Vec<(String, Result<SymbolResult, SymbolError>)> = pool.install(|| {
        symbols
            .par_iter()
            .map(|symbol| {
                if cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
                    let err = SymbolError::Cancelled {
                        symbol: symbol.clone(),
                    };
                    return (symbol.clone(), Err(err));
                }
                (symbol.clone(), run_symbol(source, symbol, start, end, config))
            })
            .collect()
    });

    let mut results = Vec::new();
    let mut failures = Vec::new();
    for (symbol, outcome) in outcomes {
        match outcome {
            Ok(r) => results.push(r),
            Err(e) => {
                warn!(symbol = %symbol, kind = e.kind(), error = %e, "symbol skipped");
                failures.push(SymbolFailure {
                    symbol,
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    let summary: Vec<SummaryRow> = results.iter().map(SummaryRow::from).collect();
    let report = BatchReport {
        config_id: config.fingerprint(),
        start,
        end,
        results,
        failures,
        summary,
    };

    info!(
        succeeded = report.success_count(),
        failed = report.failure_count(),
        trades = report.total_trades(),
        "batch finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use keybar_core::data::SyntheticSource;

    fn friday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
    }

    fn symbols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn runs_all_symbols_in_input_order() {
        let src = SyntheticSource::new(5);
        let syms = symbols(&["SPY", "QQQ", "IWM"]);
        let report = run_batch(&src, &syms, friday(), &test_config(), None).unwrap();
        assert_eq!(report.failure_count(), 0);
        let got: Vec<&str> = report.summary.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(got, vec!["SPY", "QQQ", "IWM"]);
        assert_eq!(report.config_id, test_config().fingerprint());
    }

    #[test]
    fn invalid_config_rejected_before_fetch() {
        let mut cfg = test_config();
        cfg.account.leverage = 0.0;
        let src = SyntheticSource::new(5);
        let err = run_batch(&src, &symbols(&["SPY"]), friday(), &cfg, None).unwrap_err();
        assert!(matches!(err, BatchError::Config(_)));
    }

    #[test]
    fn empty_symbol_list_is_an_error() {
        let src = SyntheticSource::new(5);
        assert!(matches!(
            run_batch(&src, &[], friday(), &test_config(), None),
            Err(BatchError::NoSymbols)
        ));
    }

    #[test]
    fn preset_cancel_flag_cancels_every_symbol() {
        let src = SyntheticSource::new(5);
        let flag = AtomicBool::new(true);
        let report = run_batch(&src, &symbols(&["SPY", "QQQ"]), friday(), &test_config(), Some(&flag))
            .unwrap();
        assert_eq!(report.success_count(), 0);
        assert!(report.failures.iter().all(|f| f.kind == "cancelled"));
    }
}

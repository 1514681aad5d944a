//! Integration tests for the batch runner, performance engine and artifact export.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;
use proptest::prelude::*;

use keybar_core::data::{BarSource, DataError, DataSource, Interval, SyntheticSource};
use keybar_core::domain::BarSeries;
use keybar_runner::performance::{max_drawdown_pct, total_pnl_pct};
use keybar_runner::{
    equity_curve, load_artifacts, metrics, run_batch, run_series, save_artifacts, BacktestConfig,
    Metrics,
};

fn default_config() -> BacktestConfig {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../configs/default.toml");
    BacktestConfig::from_file(&path).unwrap()
}

/// Synthetic bars for most symbols, scripted failures for a few.
struct ScriptedSource {
    inner: SyntheticSource,
    calls: AtomicUsize,
}

impl ScriptedSource {
    fn new() -> Self {
        Self {
            inner: SyntheticSource::new(17).with_spike_prob(0.08),
            calls: AtomicUsize::new(0),
        }
    }
}

impl BarSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<BarSeries, DataError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match symbol {
            "GONE" => Err(DataError::DataUnavailable {
                symbol: symbol.into(),
            }),
            "DOWN" => Err(DataError::NetworkUnreachable("connection refused".into())),
            "THIN" => self.inner.fetch(symbol, end, end, Interval::D1),
            _ => self.inner.fetch(symbol, start, end, interval),
        }
    }
}

fn friday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

#[test]
fn shipped_config_is_valid() {
    let cfg = default_config();
    assert_eq!(cfg.account.interval, Interval::M5);
    assert!(cfg.screen.is_some());
    assert_eq!(BacktestConfig::from_toml(&cfg.to_toml().unwrap()).unwrap(), cfg);
}

#[test]
fn batch_isolates_failing_symbols() {
    let source = ScriptedSource::new();
    let symbols: Vec<String> = ["SPY", "GONE", "QQQ", "DOWN", "THIN"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let report = run_batch(&source, &symbols, friday(), &default_config(), None).unwrap();

    assert_eq!(source.calls.load(Ordering::Relaxed), 5);
    let ok: Vec<&str> = report.results.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(ok, vec!["SPY", "QQQ"]);

    let kinds: Vec<(&str, &str)> = report
        .failures
        .iter()
        .map(|f| (f.symbol.as_str(), f.kind.as_str()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("GONE", "data_unavailable"),
            ("DOWN", "data_error"),
            ("THIN", "insufficient_history"),
        ]
    );
    assert_eq!(report.summary.len(), report.results.len());
}

#[test]
fn batch_results_are_deterministic() {
    let symbols = vec!["AMD".to_string(), "TSLA".to_string()];
    let cfg = default_config();
    let a = run_batch(&SyntheticSource::new(3), &symbols, friday(), &cfg, None).unwrap();
    let b = run_batch(&SyntheticSource::new(3), &symbols, friday(), &cfg, None).unwrap();
    assert_eq!(a.summary, b.summary);
}

#[test]
fn flat_series_yields_zero_metrics() {
    let series = SyntheticSource::new(1)
        .with_volatility(0.0)
        .with_spike_prob(0.0)
        .fetch(
            "FLAT",
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            Interval::M5,
        )
        .unwrap();

    let result = run_series(&series, &default_config()).unwrap();
    assert!(result.trades.is_empty());
    assert_eq!(result.metrics, Metrics::default());
    let cfg = default_config();
    assert!(result
        .equity
        .values()
        .iter()
        .all(|&e| e == cfg.account.initial_capital));
}

#[test]
fn artifacts_roundtrip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let symbols = vec!["SPY".to_string(), "GONE".to_string()];
    let report = run_batch(&ScriptedSource::new(), &symbols, friday(), &default_config(), None)
        .unwrap();

    let out = save_artifacts(&report, dir.path()).unwrap();
    for file in ["report.json", "summary.csv", "trades.csv", "equity/SPY.csv"] {
        assert!(out.join(file).exists(), "missing {file}");
    }
    assert!(!out.join("equity/GONE.csv").exists());

    let equity_csv = std::fs::read_to_string(out.join("equity/SPY.csv")).unwrap();
    assert_eq!(equity_csv.lines().count(), report.results[0].bar_count + 1);

    let loaded = load_artifacts(&out).unwrap();
    assert_eq!(loaded.summary, report.summary);
    assert_eq!(loaded.failures, report.failures);
    assert_eq!(loaded.config_id, report.config_id);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Drawdown is never positive and total P&L recomputed from the curve endpoints
    /// matches the reported value.
    #[test]
    fn performance_invariants(seed in 0..10_000_u64, vol in 0.001..0.01_f64) {
        let cfg = {
            let mut c = default_config();
            c.strategy.keybar.enabled = false;
            c.strategy.relative_strength.enabled = false;
            c.strategy.volume.enabled = false;
            c
        };
        let series = SyntheticSource::new(seed)
            .with_volatility(vol)
            .fetch(
                "PROP",
                NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 6).unwrap(),
                Interval::M5,
            )
            .unwrap();

        let sim = run_series(&series, &cfg).unwrap();
        let curve = equity_curve(series.bars(), &sim.trades, &cfg.account);
        prop_assert_eq!(&curve, &sim.equity);

        let m = metrics(&sim.trades, &curve);
        prop_assert!(m.max_drawdown_pct <= 0.0);
        prop_assert!(max_drawdown_pct(&curve.values()) <= 0.0);
        prop_assert_eq!(curve.first_equity(), Some(cfg.account.initial_capital));

        if !sim.trades.is_empty() {
            let first = curve.first_equity().unwrap();
            let last = curve.last_equity().unwrap();
            let recomputed = (total_pnl_pct(first, last) * 100.0).round() / 100.0;
            prop_assert_eq!(recomputed, m.total_pnl_pct);
            if m.total_pnl_pct > 0.0 {
                prop_assert!(last > first);
            } else if m.total_pnl_pct < 0.0 {
                prop_assert!(last < first);
            }
        }
    }
}

//! Criterion benchmarks for KeyBar hot paths.
//!
//! Benchmarks:
//! 1. Indicator precompute (EMA, ATR, session VWAP, RVOL)
//! 2. Signal engine with every filter and checklist check enabled
//! 3. Simulator scan over precomputed signals

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use keybar_core::data::{BarSource, Interval, SyntheticSource};
use keybar_core::domain::BarSeries;
use keybar_core::indicators::{atr, ema, relative_volume, session_vwap};
use keybar_core::signals::compute_signals;
use keybar_core::simulator::simulate;
use keybar_core::strategy::{test_strategy, AtrBaseline, StrategyConfig};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(sessions: u32) -> BarSeries {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    // weekends are skipped, so pad the calendar span
    let end = start + chrono::Duration::days(i64::from(sessions) * 7 / 5 + 2);
    SyntheticSource::new(7)
        .with_spike_prob(0.05)
        .fetch("BENCH", start, end, Interval::M5)
        .unwrap()
}

fn full_strategy() -> StrategyConfig {
    let mut cfg = test_strategy();
    cfg.keybar.enabled = true;
    cfg.relative_strength.enabled = true;
    cfg.relative_strength.baseline = AtrBaseline::Rolling { window: 50 };
    cfg.volume.enabled = true;
    let cl = &mut cfg.checklist;
    cl.aligned_trend = true;
    cl.momentum_crossover = true;
    cl.keybar_vwap_breakout = true;
    cl.red_to_green_strike = true;
    cl.heikin_ashi_reversal = true;
    cl.bullish_thrust = true;
    cl.atr_trailing_cross = true;
    cl.breakout_session_high = true;
    cfg
}

// ── 1. Indicators ────────────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicators");
    for sessions in [5_u32, 20, 60] {
        let series = make_series(sessions);
        let bars = series.bars();
        let closes = series.closes();
        group.bench_with_input(BenchmarkId::new("ema_atr", bars.len()), bars, |b, bars| {
            b.iter(|| {
                black_box(ema(&closes, 21));
                black_box(atr(bars, 14));
            })
        });
        group.bench_with_input(BenchmarkId::new("vwap_rvol", bars.len()), bars, |b, bars| {
            b.iter(|| {
                black_box(session_vwap(bars));
                black_box(relative_volume(bars, 5));
            })
        });
    }
    group.finish();
}

// ── 2. Signals ───────────────────────────────────────────────────────

fn bench_signals(c: &mut Criterion) {
    let cfg = full_strategy();
    let mut group = c.benchmark_group("signals");
    for sessions in [5_u32, 20, 60] {
        let series = make_series(sessions);
        group.bench_with_input(
            BenchmarkId::new("compute_signals", series.len()),
            &series,
            |b, series| b.iter(|| black_box(compute_signals(series.bars(), &cfg))),
        );
    }
    group.finish();
}

// ── 3. Simulator ─────────────────────────────────────────────────────

fn bench_simulator(c: &mut Criterion) {
    // every filter off: entries on most bars, maximum state churn
    let cfg = test_strategy();
    let mut group = c.benchmark_group("simulator");
    for sessions in [5_u32, 20, 60] {
        let series = make_series(sessions);
        let signals = compute_signals(series.bars(), &cfg);
        group.bench_with_input(BenchmarkId::new("simulate", series.len()), &series, |b, series| {
            b.iter(|| {
                black_box(simulate(
                    series,
                    &signals.entry,
                    &signals.exit,
                    &cfg.trailing_stop,
                    &cfg.profit_target,
                ))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_indicators, bench_signals, bench_simulator);
criterion_main!(benches);

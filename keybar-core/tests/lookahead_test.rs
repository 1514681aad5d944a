//! Look-ahead contamination tests for indicators and signals.
//!
//! Invariant: no value at bar t may depend on bars after t.
//!
//! Method: compute on a truncated series and on the full series, then assert the
//! overlapping prefix is identical. Any difference means future data leaked into the
//! past. The one deliberate exception is the `FULL_SERIES` ATR baseline.

use chrono::{DateTime, Duration, TimeZone, Utc};
use keybar_core::domain::Bar;
use keybar_core::indicators::*;
use keybar_core::signals::{atr_baseline, compute_signals};
use keybar_core::strategy::{test_strategy, AtrBaseline, StrategyConfig};

const BARS_PER_SESSION: usize = 78;

/// Five-minute bars over several weekday sessions with a deterministic LCG walk.
fn make_test_bars(n: usize) -> Vec<Bar> {
    let first_open = Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0_f64;

    for i in 0..n {
        let session = (i / BARS_PER_SESSION) as i64;
        let slot = (i % BARS_PER_SESSION) as i64;
        let timestamp: DateTime<Utc> =
            first_open + Duration::days(session) + Duration::minutes(5 * slot);

        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let change = ((seed >> 33) % 200) as f64 / 100.0 - 1.0; // -1.0 to +1.0
        let open = price;
        price = (price + change).max(5.0);
        let close = price;
        let high = open.max(close) + ((seed >> 20) % 50) as f64 / 100.0;
        let low = open.min(close) - ((seed >> 12) % 50) as f64 / 100.0;

        bars.push(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume: 1000 + (seed >> 40) % 9000,
        });
    }
    bars
}

fn assert_prefix_eq(name: &str, truncated: &[Option<f64>], full: &[Option<f64>]) {
    assert!(full.len() >= truncated.len(), "{name}: full result shorter");
    for (i, (t, f)) in truncated.iter().zip(full).enumerate() {
        match (t, f) {
            (None, None) => {}
            (Some(t), Some(f)) => assert!(
                (t - f).abs() < 1e-10,
                "{name}: look-ahead contamination at bar {i}: truncated={t}, full={f}"
            ),
            _ => panic!("{name}: definedness mismatch at bar {i} (truncated={t:?}, full={f:?})"),
        }
    }
}

fn assert_series_fn_causal(name: &str, f: impl Fn(&[Bar]) -> IndicatorSeries) {
    let bars = make_test_bars(4 * BARS_PER_SESSION);
    let cut = 2 * BARS_PER_SESSION + 17;
    let truncated = f(&bars[..cut]);
    let full = f(&bars);
    assert_eq!(truncated.len(), cut, "{name}: length mismatch");
    assert_eq!(full.len(), bars.len(), "{name}: length mismatch");
    assert_prefix_eq(name, &truncated, &full);
}

fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

#[test]
fn lookahead_ema_sma_atr() {
    assert_series_fn_causal("ema_9", |b| ema(&closes(b), 9));
    assert_series_fn_causal("ema_21", |b| ema(&closes(b), 21));
    assert_series_fn_causal("sma_close_20", |b| rolling_mean(&Field::Close.series(b), 20));
    assert_series_fn_causal("sma_volume_20", |b| rolling_mean(&Field::Volume.series(b), 20));
    assert_series_fn_causal("rolling_min_low_20", |b| rolling_min(&Field::Low.series(b), 20));
    assert_series_fn_causal("rolling_max_high_20", |b| rolling_max(&Field::High.series(b), 20));
    assert_series_fn_causal("atr_14", |b| atr(b, 14));
    assert_series_fn_causal("atr_3", |b| atr(b, 3));
}

#[test]
fn lookahead_session_indicators() {
    assert_series_fn_causal("session_vwap", session_vwap);
    assert_series_fn_causal("relative_volume", |b| relative_volume(b, 2));
    assert_series_fn_causal("session_high_before", session_high_before);
    assert_series_fn_causal("atr_trailing_line", |b| {
        atr_trailing_line(b, &atr(b, 14), 2.0)
    });
    assert_series_fn_causal("heikin_ashi_close", |b| {
        heikin_ashi(b).iter().map(|h| Some(h.close)).collect()
    });
}

#[test]
fn lookahead_causal_atr_baselines() {
    let bars = make_test_bars(300);
    for baseline in [AtrBaseline::Expanding, AtrBaseline::Rolling { window: 30 }] {
        let f = |b: &[Bar]| atr_baseline(&atr(b, 14), baseline);
        assert_prefix_eq("atr_baseline", &f(&bars[..120]), &f(&bars));
    }
}

#[test]
fn full_series_baseline_does_look_ahead() {
    // rising volatility: the whole-series mean differs from any prefix mean
    let mut bars = make_test_bars(200);
    for (i, b) in bars.iter_mut().enumerate().skip(100) {
        b.high += i as f64 * 0.1;
    }
    let f = |b: &[Bar]| atr_baseline(&atr(b, 14), AtrBaseline::FullSeries);
    let truncated = f(&bars[..100]);
    let full = f(&bars);
    assert_ne!(truncated[50], full[50]);
}

fn every_filter_on() -> StrategyConfig {
    let mut cfg = test_strategy();
    cfg.keybar.enabled = true;
    cfg.keybar.atr_mult = 1.0;
    cfg.keybar.volume_mult = 1.0;
    cfg.keybar.min_body_pct = 20.0;
    cfg.relative_strength.enabled = true;
    cfg.relative_strength.baseline = AtrBaseline::Rolling { window: 20 };
    cfg.volume.enabled = true;
    cfg.volume.rvol_days = 2;
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

#[test]
fn lookahead_signal_engine() {
    let bars = make_test_bars(4 * BARS_PER_SESSION);
    let cfg = every_filter_on();
    let cut = 3 * BARS_PER_SESSION - 5;

    let truncated = compute_signals(&bars[..cut], &cfg);
    let full = compute_signals(&bars, &cfg);

    assert_eq!(truncated.len(), cut);
    assert_eq!(&full.keybar[..cut], &truncated.keybar[..]);
    assert_eq!(&full.relative_strength[..cut], &truncated.relative_strength[..]);
    assert_eq!(&full.volume[..cut], &truncated.volume[..]);
    assert_eq!(&full.checklist[..cut], &truncated.checklist[..]);
    assert_eq!(&full.entry[..cut], &truncated.entry[..]);
    assert_eq!(&full.exit[..cut], &truncated.exit[..]);
}

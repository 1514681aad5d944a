//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|); the first bar has no
//! previous close, so TR[0] = high - low.
//! ATR is the simple rolling mean of TR over `period` bars.
//! Lookback: period - 1.

use super::rolling::rolling_mean;
use super::IndicatorSeries;
use crate::domain::Bar;

/// Compute the True Range series from bars.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let hl = bar.high - bar.low;
            if i == 0 {
                return hl;
            }
            let pc = bars[i - 1].close;
            hl.max((bar.high - pc).abs()).max((bar.low - pc).abs())
        })
        .collect()
}

/// ATR as a simple rolling mean of true range.
pub fn atr(bars: &[Bar], period: usize) -> IndicatorSeries {
    let tr: IndicatorSeries = true_range(bars)
        .into_iter()
        .map(|v| if v.is_nan() { None } else { Some(v) })
        .collect();
    // the running sum can drift a hair below zero after a run of flat bars
    rolling_mean(&tr, period)
        .into_iter()
        .map(|v| v.map(|a| a.max(0.0)))
        .collect()
}

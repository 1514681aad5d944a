//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1).
//! Seed: EMA[0] = x[0] (no bias adjustment), so the series is defined from the first bar.
//! Lookback: 0.

use super::IndicatorSeries;

/// EMA of an arbitrary series.
///
/// NaN inputs produce `None` at that position; the recursion resumes from the last
/// defined value. A leading NaN delays the seed to the first defined input.
pub fn ema(values: &[f64], period: usize) -> IndicatorSeries {
    let mut result = vec![None; values.len()];
    if period == 0 {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev: Option<f64> = None;

    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        let next = match prev {
            None => v,
            Some(p) => alpha * v + (1.0 - alpha) * p,
        };
        result[i] = Some(next);
        prev = Some(next);
    }

    result
}

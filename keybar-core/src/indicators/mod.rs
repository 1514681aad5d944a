//! IndicatorLibrary: pure rolling computations over an ordered bar series.
//!
//! Every output is an [`IndicatorSeries`] aligned 1:1 with the input: `None` marks
//! warm-up or otherwise undefined positions. Nothing here mutates its input, and no
//! value at bar t depends on bars after t.

pub mod atr;
pub mod ema;
pub mod heikin_ashi;
pub mod rolling;
pub mod session;
pub mod trailing_line;

pub use atr::{atr, true_range};
pub use ema::ema;
pub use heikin_ashi::{heikin_ashi, HeikinAshiBar};
pub use rolling::{expanding_mean, rolling_max, rolling_mean, rolling_min};
pub use session::{relative_volume, session_high_before, session_vwap};
pub use trailing_line::atr_trailing_line;

use crate::domain::Bar;

/// Real-valued series aligned with a bar series; `None` = not yet available.
pub type IndicatorSeries = Vec<Option<f64>>;

/// Bar field selector for indicators that read a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Field {
    pub fn of(&self, bar: &Bar) -> f64 {
        match self {
            Field::Open => bar.open,
            Field::High => bar.high,
            Field::Low => bar.low,
            Field::Close => bar.close,
            Field::Volume => bar.volume as f64,
        }
    }

    /// Extract the column as a fully-defined series.
    pub fn series(&self, bars: &[Bar]) -> IndicatorSeries {
        bars.iter().map(|b| Some(self.of(b))).collect()
    }
}

/// Lift plain values into a fully-defined series; NaN becomes `None`.
#[cfg(test)]
pub fn defined(values: &[f64]) -> IndicatorSeries {
    values
        .iter()
        .map(|&v| if v.is_nan() { None } else { Some(v) })
        .collect()
}

/// Strict comparison that treats any undefined side as false.
pub fn gt(lhs: Option<f64>, rhs: Option<f64>) -> bool {
    matches!((lhs, rhs), (Some(a), Some(b)) if a > b)
}

/// Create synthetic 5-minute bars from close prices for testing.
///
/// open = prev_close (or close for the first bar), high = max(open,close) + 1.0,
/// low = min(open,close) - 1.0, volume = 1000. Bars start at 14:30 UTC and roll
/// over to the next session after 78 bars.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: test_timestamp(i),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Timestamp of the i-th regular-session 5-minute bar (78 bars per session).
#[cfg(test)]
pub fn test_timestamp(i: usize) -> chrono::DateTime<chrono::Utc> {
    use chrono::TimeZone;
    let day = (i / 78) as i64;
    let slot = (i % 78) as i64;
    chrono::Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap()
        + chrono::Duration::days(day)
        + chrono::Duration::minutes(5 * slot)
}

/// Assert a defined value is approximately equal to `expected`.
#[cfg(test)]
pub fn assert_approx(actual: Option<f64>, expected: f64, epsilon: f64) {
    let actual = actual.unwrap_or_else(|| panic!("expected {expected}, got None"));
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

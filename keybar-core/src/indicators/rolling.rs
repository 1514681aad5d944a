//! Fixed-window rolling statistics.
//!
//! A window value is defined only when all `window` positions ending at t are defined.
//! Lookback: window - 1.

use super::IndicatorSeries;

/// Rolling arithmetic mean.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> IndicatorSeries {
    let n = values.len();
    let mut result = vec![None; n];
    if window == 0 {
        return result;
    }

    let mut sum = 0.0;
    let mut defined = 0usize;

    for i in 0..n {
        if let Some(v) = values[i] {
            sum += v;
            defined += 1;
        }
        if i >= window {
            if let Some(leaving) = values[i - window] {
                sum -= leaving;
                defined -= 1;
            }
        }
        if i + 1 >= window && defined == window {
            result[i] = Some(sum / window as f64);
        }
    }

    result
}

/// Rolling minimum.
pub fn rolling_min(values: &[Option<f64>], window: usize) -> IndicatorSeries {
    rolling_extreme(values, window, f64::min)
}

/// Rolling maximum.
pub fn rolling_max(values: &[Option<f64>], window: usize) -> IndicatorSeries {
    rolling_extreme(values, window, f64::max)
}

fn rolling_extreme(
    values: &[Option<f64>],
    window: usize,
    pick: fn(f64, f64) -> f64,
) -> IndicatorSeries {
    let n = values.len();
    let mut result = vec![None; n];
    if window == 0 || n < window {
        return result;
    }

    for i in (window - 1)..n {
        let mut acc: Option<f64> = None;
        let mut complete = true;
        for v in &values[(i + 1 - window)..=i] {
            match v {
                Some(x) => acc = Some(acc.map_or(*x, |a| pick(a, *x))),
                None => {
                    complete = false;
                    break;
                }
            }
        }
        if complete {
            result[i] = acc;
        }
    }

    result
}

/// Mean of every defined value from the start of the series up to and including t.
pub fn expanding_mean(values: &[Option<f64>]) -> IndicatorSeries {
    let mut sum = 0.0;
    let mut count = 0usize;
    values
        .iter()
        .map(|v| {
            if let Some(x) = v {
                sum += x;
                count += 1;
            }
            if count == 0 {
                None
            } else {
                Some(sum / count as f64)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, defined, make_bars, Field, DEFAULT_EPSILON};

    #[test]
    fn rolling_mean_basic() {
        let values = defined(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let result = rolling_mean(&values, 5);
        assert_eq!(result.len(), 7);
        for v in result.iter().take(4) {
            assert!(v.is_none());
        }
        assert_approx(result[4], 12.0, DEFAULT_EPSILON);
        assert_approx(result[5], 13.0, DEFAULT_EPSILON);
        assert_approx(result[6], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_mean_gap_propagation() {
        let values = vec![Some(10.0), Some(11.0), None, Some(13.0), Some(14.0), Some(15.0)];
        let result = rolling_mean(&values, 3);
        assert!(result[2].is_none());
        assert!(result[3].is_none());
        assert!(result[4].is_none());
        assert_approx(result[5], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_min_and_max() {
        let values = defined(&[5.0, 3.0, 4.0, 8.0, 1.0]);
        let mins = rolling_min(&values, 3);
        let maxs = rolling_max(&values, 3);
        assert_eq!(mins, vec![None, None, Some(3.0), Some(3.0), Some(1.0)]);
        assert_eq!(maxs, vec![None, None, Some(5.0), Some(8.0), Some(8.0)]);
    }

    #[test]
    fn rolling_too_few_values() {
        let values = defined(&[1.0, 2.0]);
        assert!(rolling_mean(&values, 5).iter().all(|v| v.is_none()));
        assert!(rolling_min(&values, 5).iter().all(|v| v.is_none()));
    }

    #[test]
    fn expanding_mean_skips_undefined() {
        let values = vec![None, Some(2.0), Some(4.0), None, Some(6.0)];
        let result = expanding_mean(&values);
        assert_eq!(result[0], None);
        assert_approx(result[1], 2.0, DEFAULT_EPSILON);
        assert_approx(result[2], 3.0, DEFAULT_EPSILON);
        assert_approx(result[3], 3.0, DEFAULT_EPSILON);
        assert_approx(result[4], 4.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_mean_of_volume_field() {
        let bars = make_bars(&[10.0, 11.0, 12.0]);
        let result = rolling_mean(&Field::Volume.series(&bars), 2);
        assert_eq!(result, vec![None, Some(1000.0), Some(1000.0)]);
    }
}

//! Session-aware intraday indicators.
//!
//! A session is the UTC calendar date of the bar timestamp. All three functions reset
//! their state at the first bar of each session.

use std::collections::{HashMap, VecDeque};

use chrono::NaiveTime;

use super::IndicatorSeries;
use crate::domain::Bar;

/// Session VWAP: cumulative close x volume over cumulative volume since the session open.
///
/// Undefined while the session's cumulative volume is still zero.
pub fn session_vwap(bars: &[Bar]) -> IndicatorSeries {
    let mut result = Vec::with_capacity(bars.len());
    let mut pv = 0.0;
    let mut vol = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        if i == 0 || bar.session() != bars[i - 1].session() {
            pv = 0.0;
            vol = 0.0;
        }
        let v = bar.volume as f64;
        pv += bar.close * v;
        vol += v;
        result.push(if vol > 0.0 { Some(pv / vol) } else { None });
    }

    result
}

/// Relative volume against the same time-of-day slot.
///
/// rvol[t] = volume[t] / mean(volume of the last `n_days` earlier bars sharing t's
/// time-of-day). Undefined until `n_days` earlier observations of the slot exist, or when
/// their mean is zero.
pub fn relative_volume(bars: &[Bar], n_days: usize) -> IndicatorSeries {
    let mut result = vec![None; bars.len()];
    if n_days == 0 {
        return result;
    }

    let mut history: HashMap<NaiveTime, VecDeque<f64>> = HashMap::new();

    for (i, bar) in bars.iter().enumerate() {
        let slot = history.entry(bar.timestamp.time()).or_default();
        if slot.len() == n_days {
            let mean = slot.iter().sum::<f64>() / n_days as f64;
            if mean > 0.0 {
                result[i] = Some(bar.volume as f64 / mean);
            }
            slot.pop_front();
        }
        slot.push_back(bar.volume as f64);
    }

    result
}

/// Highest high of the current session strictly before bar t.
///
/// Undefined on the first bar of every session.
pub fn session_high_before(bars: &[Bar]) -> IndicatorSeries {
    let mut result = Vec::with_capacity(bars.len());
    let mut high: Option<f64> = None;

    for (i, bar) in bars.iter().enumerate() {
        if i == 0 || bar.session() != bars[i - 1].session() {
            high = None;
        }
        result.push(high);
        high = Some(high.map_or(bar.high, |h| h.max(bar.high)));
    }

    result
}

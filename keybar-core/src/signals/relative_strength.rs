//! Relative-strength filter.
//!
//! True when close > rolling_min(low, price_change_len) and ATR(atr_len) sits above its
//! baseline. The baseline mode decides whether the comparison is causal.

use tracing::warn;

use crate::domain::Bar;
use crate::indicators::{atr, expanding_mean, gt, rolling_mean, rolling_min, Field, IndicatorSeries};
use crate::strategy::{AtrBaseline, RelativeStrengthConfig};

/// Reference series the ATR is compared against.
pub fn atr_baseline(atr: &[Option<f64>], baseline: AtrBaseline) -> IndicatorSeries {
    match baseline {
        AtrBaseline::Expanding => expanding_mean(atr),
        AtrBaseline::Rolling { window } => rolling_mean(atr, window),
        AtrBaseline::FullSeries => {
            let defined: Vec<f64> = atr.iter().flatten().copied().collect();
            if defined.is_empty() {
                return vec![None; atr.len()];
            }
            let mean = defined.iter().sum::<f64>() / defined.len() as f64;
            vec![Some(mean); atr.len()]
        }
    }
}

pub fn relative_strength_signal(bars: &[Bar], cfg: &RelativeStrengthConfig) -> Vec<bool> {
    if !cfg.baseline.is_causal() {
        warn!(
            bars = bars.len(),
            "relative strength uses the full-series ATR mean; results contain lookahead"
        );
    }

    let low_floor = rolling_min(&Field::Low.series(bars), cfg.price_change_len);
    let atr = atr(bars, cfg.atr_len);
    let baseline = atr_baseline(&atr, cfg.baseline);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| gt(Some(bar.close), low_floor[i]) && gt(atr[i], baseline[i]))
        .collect()
}

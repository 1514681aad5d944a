//! ATR trailing line (flip-flop form).
//!
//! With loss = mult x ATR[t] and prev = line[t-1]:
//! - close and prior close both above prev: max(prev, close - loss)
//! - close and prior close both below prev: min(prev, close + loss)
//! - close above prev (flip long): close - loss
//! - otherwise (flip short): close + loss
//!
//! The line starts below price at the first defined ATR value.

use super::IndicatorSeries;
use crate::domain::Bar;

pub fn atr_trailing_line(bars: &[Bar], atr: &[Option<f64>], mult: f64) -> IndicatorSeries {
    let mut result = vec![None; bars.len()];
    let mut prev: Option<f64> = None;

    for (i, bar) in bars.iter().enumerate() {
        let Some(a) = atr.get(i).copied().flatten() else {
            prev = None;
            continue;
        };
        let loss = mult * a;
        let close = bar.close;

        let line = match prev {
            None => close - loss,
            Some(p) => {
                let prev_close = bars[i - 1].close;
                if close > p && prev_close > p {
                    p.max(close - loss)
                } else if close < p && prev_close < p {
                    p.min(close + loss)
                } else if close > p {
                    close - loss
                } else {
                    close + loss
                }
            }
        };

        result[i] = Some(line);
        prev = Some(line);
    }

    result
}

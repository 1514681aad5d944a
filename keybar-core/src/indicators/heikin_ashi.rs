//! Heikin-Ashi candle transform.
//!
//! ha_close = (o + h + l + c) / 4
//! ha_open[0] = (o + c) / 2, ha_open[t] = (ha_open[t-1] + ha_close[t-1]) / 2
//! ha_high = max(h, ha_open, ha_close), ha_low = min(l, ha_open, ha_close)

use crate::domain::Bar;

/// One smoothed candle, aligned with the source bar at the same index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeikinAshiBar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl HeikinAshiBar {
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

pub fn heikin_ashi(bars: &[Bar]) -> Vec<HeikinAshiBar> {
    let mut out: Vec<HeikinAshiBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        let close = (bar.open + bar.high + bar.low + bar.close) / 4.0;
        let open = match out.last() {
            Some(prev) => (prev.open + prev.close) / 2.0,
            None => (bar.open + bar.close) / 2.0,
        };
        out.push(HeikinAshiBar {
            open,
            high: bar.high.max(open).max(close),
            low: bar.low.min(open).min(close),
            close,
        });
    }
    out
}

//! Checklist gate: a fixed set of named entry patterns combined with OR.
//!
//! Each check reads only bars `0..=t` and the indicator values derived from them.

use serde::{Deserialize, Serialize};

use crate::domain::Bar;
use crate::indicators::{
    atr, atr_trailing_line, ema, gt, heikin_ashi, session_high_before, session_vwap,
    HeikinAshiBar, IndicatorSeries,
};
use crate::strategy::{ChecklistConfig, TrailingStopConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistCheck {
    /// close > EMA(trend_fast) > EMA(trend_slow)
    AlignedTrend,
    /// EMA(cross_fast) crosses above EMA(cross_slow) on this bar
    MomentumCrossover,
    /// key bar opening at or below session VWAP and closing above it
    KeybarVwapBreakout,
    /// red bar followed by a green bar closing above the red bar's open
    RedToGreenStrike,
    /// Heikin-Ashi candle turns from red to green
    HeikinAshiReversal,
    /// green bar closing above the previous high
    BullishThrust,
    /// close crosses above the ATR trailing line
    AtrTrailingCross,
    /// close above the session high made before this bar
    BreakoutSessionHigh,
}

impl ChecklistCheck {
    pub const ALL: [ChecklistCheck; 8] = [
        ChecklistCheck::AlignedTrend,
        ChecklistCheck::MomentumCrossover,
        ChecklistCheck::KeybarVwapBreakout,
        ChecklistCheck::RedToGreenStrike,
        ChecklistCheck::HeikinAshiReversal,
        ChecklistCheck::BullishThrust,
        ChecklistCheck::AtrTrailingCross,
        ChecklistCheck::BreakoutSessionHigh,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ChecklistCheck::AlignedTrend => "aligned_trend",
            ChecklistCheck::MomentumCrossover => "momentum_crossover",
            ChecklistCheck::KeybarVwapBreakout => "keybar_vwap_breakout",
            ChecklistCheck::RedToGreenStrike => "red_to_green_strike",
            ChecklistCheck::HeikinAshiReversal => "heikin_ashi_reversal",
            ChecklistCheck::BullishThrust => "bullish_thrust",
            ChecklistCheck::AtrTrailingCross => "atr_trailing_cross",
            ChecklistCheck::BreakoutSessionHigh => "breakout_session_high",
        }
    }
}

/// Precomputed inputs shared by every check.
pub struct ChecklistContext<'a> {
    bars: &'a [Bar],
    keybar: &'a [bool],
    trend_fast: IndicatorSeries,
    trend_slow: IndicatorSeries,
    cross_fast: IndicatorSeries,
    cross_slow: IndicatorSeries,
    vwap: IndicatorSeries,
    heikin_ashi: Vec<HeikinAshiBar>,
    trailing_line: IndicatorSeries,
    session_high: IndicatorSeries,
}

impl<'a> ChecklistContext<'a> {
    pub fn new(
        bars: &'a [Bar],
        keybar: &'a [bool],
        cfg: &ChecklistConfig,
        stop: &TrailingStopConfig,
    ) -> Self {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let stop_atr = atr(bars, stop.atr_period);
        Self {
            bars,
            keybar,
            trend_fast: ema(&closes, cfg.trend_fast_len),
            trend_slow: ema(&closes, cfg.trend_slow_len),
            cross_fast: ema(&closes, cfg.cross_fast_len),
            cross_slow: ema(&closes, cfg.cross_slow_len),
            vwap: session_vwap(bars),
            heikin_ashi: heikin_ashi(bars),
            trailing_line: atr_trailing_line(bars, &stop_atr, stop.multiplier),
            session_high: session_high_before(bars),
        }
    }

    pub fn check(&self, check: ChecklistCheck, i: usize) -> bool {
        let bar = &self.bars[i];
        let prev = i.checked_sub(1).map(|p| &self.bars[p]);

        match check {
            ChecklistCheck::AlignedTrend => {
                gt(Some(bar.close), self.trend_fast[i]) && gt(self.trend_fast[i], self.trend_slow[i])
            }
            ChecklistCheck::MomentumCrossover => i > 0 && crossed_above(
                (self.cross_fast[i - 1], self.cross_fast[i]),
                (self.cross_slow[i - 1], self.cross_slow[i]),
            ),
            ChecklistCheck::KeybarVwapBreakout => {
                self.keybar[i]
                    && matches!(self.vwap[i], Some(v) if bar.open <= v && v < bar.close)
            }
            ChecklistCheck::RedToGreenStrike => prev.is_some_and(|p| {
                p.is_bearish() && bar.is_bullish() && bar.close > p.open
            }),
            ChecklistCheck::HeikinAshiReversal => {
                i > 0 && self.heikin_ashi[i - 1].is_bearish() && self.heikin_ashi[i].is_bullish()
            }
            ChecklistCheck::BullishThrust => {
                prev.is_some_and(|p| bar.close > p.high) && bar.is_bullish()
            }
            ChecklistCheck::AtrTrailingCross => i > 0 && crossed_above(
                (Some(self.bars[i - 1].close), Some(bar.close)),
                (self.trailing_line[i - 1], self.trailing_line[i]),
            ),
            ChecklistCheck::BreakoutSessionHigh => gt(Some(bar.close), self.session_high[i]),
        }
    }
}

/// `a` was at or below `b` on the previous bar and is strictly above it now.
fn crossed_above(a: (Option<f64>, Option<f64>), b: (Option<f64>, Option<f64>)) -> bool {
    match (a, b) {
        ((Some(a0), Some(a1)), (Some(b0), Some(b1))) => a0 <= b0 && a1 > b1,
        _ => false,
    }
}

/// Per-bar checklist result. With no enabled check the gate is open on every bar.
pub fn checklist_signal(
    bars: &[Bar],
    keybar: &[bool],
    cfg: &ChecklistConfig,
    stop: &TrailingStopConfig,
) -> Vec<bool> {
    let enabled = cfg.enabled_checks();
    if enabled.is_empty() {
        return vec![true; bars.len()];
    }

    let ctx = ChecklistContext::new(bars, keybar, cfg, stop);
    (0..bars.len())
        .map(|i| enabled.iter().any(|&check| ctx.check(check, i)))
        .collect()
}

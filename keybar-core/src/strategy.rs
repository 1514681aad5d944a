//! Strategy parameters for the signal engine and trade simulator.
//!
//! Every value is supplied by the caller (normally parsed from the TOML run file); there
//! are no built-in defaults. `validate()` rejects out-of-range values before anything runs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::signals::ChecklistCheck;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParamError {
    #[error("{field} must be at least 1")]
    ZeroPeriod { field: &'static str },

    #[error("{field} = {value} is out of range: {reason}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("{fast} must be shorter than {slow}")]
    FastNotBelowSlow {
        fast: &'static str,
        slow: &'static str,
    },
}

/// Key-bar detection: wide range on heavy volume with a substantial body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyBarConfig {
    pub enabled: bool,
    pub atr_len: usize,
    pub atr_mult: f64,
    /// Volume must exceed this multiple of its rolling mean.
    pub volume_mult: f64,
    pub vol_avg_len: usize,
    /// Minimum |close - open| as a percentage of the bar range.
    pub min_body_pct: f64,
}

/// Reference level the relative-strength ATR is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AtrBaseline {
    /// Mean of all ATR values up to and including the current bar.
    Expanding,

    /// Mean of the last `window` ATR values.
    Rolling { window: usize },

    /// Mean over the entire series. Reads future bars; research use only.
    FullSeries,
}

impl AtrBaseline {
    pub fn is_causal(&self) -> bool {
        !matches!(self, AtrBaseline::FullSeries)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelativeStrengthConfig {
    pub enabled: bool,
    pub price_change_len: usize,
    pub atr_len: usize,
    pub baseline: AtrBaseline,
}

/// Volume gate. The soft and hard RVOL tiers are ORed, so with soft < hard the hard
/// tier never changes the outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VolumeGateConfig {
    pub enabled: bool,
    pub sma_check: bool,
    pub sma_len: usize,
    pub rvol_days: usize,
    pub rvol_hard_threshold: f64,
    pub rvol_soft_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChecklistConfig {
    pub aligned_trend: bool,
    pub momentum_crossover: bool,
    pub keybar_vwap_breakout: bool,
    pub red_to_green_strike: bool,
    pub heikin_ashi_reversal: bool,
    pub bullish_thrust: bool,
    pub atr_trailing_cross: bool,
    pub breakout_session_high: bool,
    pub trend_fast_len: usize,
    pub trend_slow_len: usize,
    pub cross_fast_len: usize,
    pub cross_slow_len: usize,
}

impl ChecklistConfig {
    /// Enabled checks in declaration order.
    pub fn enabled_checks(&self) -> Vec<ChecklistCheck> {
        ChecklistCheck::ALL
            .into_iter()
            .filter(|check| self.is_enabled(*check))
            .collect()
    }

    pub fn is_enabled(&self, check: ChecklistCheck) -> bool {
        match check {
            ChecklistCheck::AlignedTrend => self.aligned_trend,
            ChecklistCheck::MomentumCrossover => self.momentum_crossover,
            ChecklistCheck::KeybarVwapBreakout => self.keybar_vwap_breakout,
            ChecklistCheck::RedToGreenStrike => self.red_to_green_strike,
            ChecklistCheck::HeikinAshiReversal => self.heikin_ashi_reversal,
            ChecklistCheck::BullishThrust => self.bullish_thrust,
            ChecklistCheck::AtrTrailingCross => self.atr_trailing_cross,
            ChecklistCheck::BreakoutSessionHigh => self.breakout_session_high,
        }
    }
}

/// ATR trailing stop used by the simulator (and by the `atr_trailing_cross` check).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrailingStopConfig {
    pub atr_period: usize,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfitTargetConfig {
    pub enabled: bool,
    /// Exit once (close / entry - 1) x 100 reaches this value.
    pub pct: f64,
    /// Exit once close - entry reaches this price distance.
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrategyConfig {
    pub keybar: KeyBarConfig,
    pub relative_strength: RelativeStrengthConfig,
    pub volume: VolumeGateConfig,
    pub checklist: ChecklistConfig,
    pub trailing_stop: TrailingStopConfig,
    pub profit_target: ProfitTargetConfig,
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<(), ParamError> {
        let kb = &self.keybar;
        period("keybar.atr_len", kb.atr_len)?;
        period("keybar.vol_avg_len", kb.vol_avg_len)?;
        non_negative("keybar.atr_mult", kb.atr_mult)?;
        non_negative("keybar.volume_mult", kb.volume_mult)?;
        percentage("keybar.min_body_pct", kb.min_body_pct)?;

        let rs = &self.relative_strength;
        period("relative_strength.price_change_len", rs.price_change_len)?;
        period("relative_strength.atr_len", rs.atr_len)?;
        if let AtrBaseline::Rolling { window } = rs.baseline {
            period("relative_strength.baseline.window", window)?;
        }

        let vol = &self.volume;
        period("volume.sma_len", vol.sma_len)?;
        period("volume.rvol_days", vol.rvol_days)?;
        non_negative("volume.rvol_hard_threshold", vol.rvol_hard_threshold)?;
        non_negative("volume.rvol_soft_threshold", vol.rvol_soft_threshold)?;

        let cl = &self.checklist;
        period("checklist.trend_fast_len", cl.trend_fast_len)?;
        period("checklist.trend_slow_len", cl.trend_slow_len)?;
        period("checklist.cross_fast_len", cl.cross_fast_len)?;
        period("checklist.cross_slow_len", cl.cross_slow_len)?;
        if cl.trend_fast_len >= cl.trend_slow_len {
            return Err(ParamError::FastNotBelowSlow {
                fast: "checklist.trend_fast_len",
                slow: "checklist.trend_slow_len",
            });
        }
        if cl.cross_fast_len >= cl.cross_slow_len {
            return Err(ParamError::FastNotBelowSlow {
                fast: "checklist.cross_fast_len",
                slow: "checklist.cross_slow_len",
            });
        }

        period("trailing_stop.atr_period", self.trailing_stop.atr_period)?;
        positive("trailing_stop.multiplier", self.trailing_stop.multiplier)?;

        if self.profit_target.enabled {
            positive("profit_target.pct", self.profit_target.pct)?;
            positive("profit_target.amount", self.profit_target.amount)?;
        }

        Ok(())
    }

    /// Fewest bars for which the stop ATR and every enabled bar-count window are defined
    /// at least once, plus one bar to exit on.
    ///
    /// RVOL is measured in sessions rather than bars and is not counted here.
    pub fn required_bars(&self) -> usize {
        let mut windows = vec![self.trailing_stop.atr_period];
        if self.keybar.enabled {
            windows.push(self.keybar.atr_len);
            windows.push(self.keybar.vol_avg_len);
        }
        if self.relative_strength.enabled {
            windows.push(self.relative_strength.price_change_len);
            windows.push(self.relative_strength.atr_len);
            if let AtrBaseline::Rolling { window } = self.relative_strength.baseline {
                windows.push(self.relative_strength.atr_len + window - 1);
            }
        }
        if self.volume.enabled && self.volume.sma_check {
            windows.push(self.volume.sma_len);
        }
        windows.into_iter().max().unwrap_or(0) + 1
    }
}

fn period(field: &'static str, value: usize) -> Result<(), ParamError> {
    if value == 0 {
        return Err(ParamError::ZeroPeriod { field });
    }
    Ok(())
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ParamError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ParamError::OutOfRange {
            field,
            value,
            reason: "must be finite and >= 0",
        });
    }
    Ok(())
}

fn positive(field: &'static str, value: f64) -> Result<(), ParamError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ParamError::OutOfRange {
            field,
            value,
            reason: "must be finite and > 0",
        });
    }
    Ok(())
}

fn percentage(field: &'static str, value: f64) -> Result<(), ParamError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(ParamError::OutOfRange {
            field,
            value,
            reason: "must lie in [0, 100]",
        });
    }
    Ok(())
}

/// Fully-populated configuration for unit and integration tests.
///
/// Every filter starts disabled; tests switch on what they exercise.
#[doc(hidden)]
pub fn test_strategy() -> StrategyConfig {
    StrategyConfig {
        keybar: KeyBarConfig {
            enabled: false,
            atr_len: 20,
            atr_mult: 1.5,
            volume_mult: 1.5,
            vol_avg_len: 20,
            min_body_pct: 50.0,
        },
        relative_strength: RelativeStrengthConfig {
            enabled: false,
            price_change_len: 20,
            atr_len: 20,
            baseline: AtrBaseline::Expanding,
        },
        volume: VolumeGateConfig {
            enabled: false,
            sma_check: true,
            sma_len: 20,
            rvol_days: 5,
            rvol_hard_threshold: 2.0,
            rvol_soft_threshold: 1.5,
        },
        checklist: ChecklistConfig {
            aligned_trend: false,
            momentum_crossover: false,
            keybar_vwap_breakout: false,
            red_to_green_strike: false,
            heikin_ashi_reversal: false,
            bullish_thrust: false,
            atr_trailing_cross: false,
            breakout_session_high: false,
            trend_fast_len: 9,
            trend_slow_len: 21,
            cross_fast_len: 3,
            cross_slow_len: 8,
        },
        trailing_stop: TrailingStopConfig {
            atr_period: 14,
            multiplier: 2.0,
        },
        profit_target: ProfitTargetConfig {
            enabled: false,
            pct: 5.0,
            amount: 5.0,
        },
    }
}

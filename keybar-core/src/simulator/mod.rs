//! TradeSimulator: single-position long-only state machine keyed by bar index.
//!
//! FLAT -> LONG on an entry flag once ATR(stop period) is defined; entry price is the
//! bar close and the stop starts at close - mult x ATR. While LONG, each later bar
//! ratchets the stop and checks, in order: stop breach, percentage target, absolute
//! target, exit flag. The first hit closes the position at that bar's close.
//!
//! One transition per bar: a bar that closes a position cannot reopen one. A position
//! still open at the last bar is reported as `open_position` and never becomes a trade.

pub mod ratchet;

pub use ratchet::TrailingStop;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Bar, BarSeries, ExitReason, Trade};
use crate::indicators::{atr, IndicatorSeries};
use crate::strategy::{ProfitTargetConfig, TrailingStopConfig};

/// Position still held when the series ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub entry_bar: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub stop_level: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    /// Closed trades in exit order.
    pub trades: Vec<Trade>,
    pub open_position: Option<OpenPosition>,
    /// Entry flags skipped because ATR(stop period) was still warming up.
    pub suppressed_entries: usize,
    /// Stop level on every bar a position was held, `None` while flat.
    pub stop_levels: IndicatorSeries,
}

#[derive(Debug, Clone, Copy)]
struct Position {
    entry_bar: usize,
    entry_time: DateTime<Utc>,
    entry_price: f64,
    stop: TrailingStop,
}

#[derive(Debug, Clone, Copy)]
enum State {
    Flat,
    Long(Position),
}

fn exit_reason(
    pos: &Position,
    bar: &Bar,
    exit_flag: bool,
    target: &ProfitTargetConfig,
) -> Option<ExitReason> {
    if pos.stop.is_breached(bar.close) {
        return Some(ExitReason::TrailingStop);
    }
    if target.enabled {
        if Trade::pnl_pct_of(pos.entry_price, bar.close) >= target.pct {
            return Some(ExitReason::ProfitTargetPct);
        }
        if bar.close - pos.entry_price >= target.amount {
            return Some(ExitReason::ProfitTargetAbs);
        }
    }
    if exit_flag {
        return Some(ExitReason::Signal);
    }
    None
}

/// Walk the series once and emit closed trades.
///
/// `entry` and `exit` are aligned with the bars; missing positions count as `false`.
pub fn simulate(
    series: &BarSeries,
    entry: &[bool],
    exit: &[bool],
    stop: &TrailingStopConfig,
    target: &ProfitTargetConfig,
) -> SimulationReport {
    let bars = series.bars();
    let atr = atr(bars, stop.atr_period);
    let flag = |flags: &[bool], i: usize| flags.get(i).copied().unwrap_or(false);

    let mut state = State::Flat;
    let mut trades = Vec::new();
    let mut suppressed_entries = 0usize;
    let mut stop_levels: IndicatorSeries = vec![None; bars.len()];

    for (i, bar) in bars.iter().enumerate() {
        match state {
            State::Flat => {
                if !flag(entry, i) {
                    continue;
                }
                let Some(a) = atr[i] else {
                    suppressed_entries += 1;
                    debug!(symbol = series.symbol(), index = i, "entry skipped during ATR warm-up");
                    continue;
                };
                let position = Position {
                    entry_bar: i,
                    entry_time: bar.timestamp,
                    entry_price: bar.close,
                    stop: TrailingStop::new(bar.close - stop.multiplier * a),
                };
                stop_levels[i] = Some(position.stop.level());
                state = State::Long(position);
            }
            State::Long(mut pos) => {
                if let Some(a) = atr[i] {
                    pos.stop.apply(bar.close - stop.multiplier * a);
                }
                stop_levels[i] = Some(pos.stop.level());

                match exit_reason(&pos, bar, flag(exit, i), target) {
                    Some(reason) => {
                        let trade = Trade {
                            ticker: series.symbol().to_string(),
                            entry_bar: pos.entry_bar,
                            entry_time: pos.entry_time,
                            entry_price: pos.entry_price,
                            exit_bar: i,
                            exit_time: bar.timestamp,
                            exit_price: bar.close,
                            exit_reason: reason,
                            pnl_pct: Trade::pnl_pct_of(pos.entry_price, bar.close),
                            duration_secs: (bar.timestamp - pos.entry_time).num_seconds(),
                        };
                        debug!(
                            symbol = series.symbol(),
                            entry_bar = trade.entry_bar,
                            exit_bar = trade.exit_bar,
                            reason = reason.as_str(),
                            pnl_pct = trade.pnl_pct,
                            "trade closed"
                        );
                        trades.push(trade);
                        state = State::Flat;
                    }
                    None => state = State::Long(pos),
                }
            }
        }
    }

    let open_position = match state {
        State::Flat => None,
        State::Long(pos) => Some(OpenPosition {
            entry_bar: pos.entry_bar,
            entry_time: pos.entry_time,
            entry_price: pos.entry_price,
            stop_level: pos.stop.level(),
        }),
    };

    SimulationReport {
        trades,
        open_position,
        suppressed_entries,
        stop_levels,
    }
}

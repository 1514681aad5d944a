//! Performance engine: equity curve and metric snapshot for one symbol.
//!
//! Both functions are pure. The equity curve is derived from the bars and the trade log
//! alone; metrics are derived from the trade log and the curve.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use keybar_core::domain::{Bar, Trade};
use serde::{Deserialize, Serialize};

use crate::config::AccountConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
}

/// Mark-to-market equity per bar plus the currency P&L realised by each trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityCurve {
    pub points: Vec<EquityPoint>,
    /// Aligned with the trade log. Zero for a trade whose exit never matched a bar.
    pub realized_pnl: Vec<f64>,
}

impl EquityCurve {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.equity).collect()
    }

    pub fn first_equity(&self) -> Option<f64> {
        self.points.first().map(|p| p.equity)
    }

    pub fn last_equity(&self) -> Option<f64> {
        self.points.last().map(|p| p.equity)
    }
}

#[derive(Debug, Clone, Copy)]
struct Allocation {
    entry_price: f64,
    notional: f64,
}

/// Builds the equity curve by replaying trades against the bar timestamps.
///
/// On a bar whose timestamp matches a trade entry, `account.allocation(cash)` is put at
/// risk and marked to market on every following close. On the matching exit the P&L at
/// the trade's exit price moves into cash. When several trades share a timestamp the
/// one later in the log wins.
pub fn equity_curve(bars: &[Bar], trades: &[Trade], account: &AccountConfig) -> EquityCurve {
    let entries: HashMap<DateTime<Utc>, usize> =
        trades.iter().enumerate().map(|(i, t)| (t.entry_time, i)).collect();
    let exits: HashMap<DateTime<Utc>, usize> =
        trades.iter().enumerate().map(|(i, t)| (t.exit_time, i)).collect();

    let mut cash = account.initial_capital;
    let mut open: Option<Allocation> = None;
    let mut realized_pnl = vec![0.0; trades.len()];
    let mut points = Vec::with_capacity(bars.len());

    for bar in bars {
        if open.is_none() {
            if let Some(&i) = entries.get(&bar.timestamp) {
                open = Some(Allocation {
                    entry_price: trades[i].entry_price,
                    notional: account.allocation(cash),
                });
            }
        }

        if let (Some(pos), Some(&j)) = (open, exits.get(&bar.timestamp)) {
            let pnl = pos.notional * (trades[j].exit_price / pos.entry_price - 1.0);
            cash += pnl;
            realized_pnl[j] = pnl;
            open = None;
        }

        let unrealized = open
            .map(|pos| pos.notional * (bar.close / pos.entry_price - 1.0))
            .unwrap_or(0.0);
        points.push(EquityPoint {
            timestamp: bar.timestamp,
            equity: cash + unrealized,
        });
    }

    EquityCurve {
        points,
        realized_pnl,
    }
}

/// Aggregate snapshot for one symbol. Every field is rounded to two decimals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub trade_count: usize,
    /// Percent of trades with positive P&L.
    pub win_rate: f64,
    pub avg_win_pct: f64,
    pub avg_loss_pct: f64,
    pub avg_win_abs: f64,
    pub avg_loss_abs: f64,
    pub total_pnl_pct: f64,
    pub total_pnl_abs: f64,
    /// Worst peak-to-trough decline in percent; never positive.
    pub max_drawdown_pct: f64,
}

pub fn metrics(trades: &[Trade], equity: &EquityCurve) -> Metrics {
    if trades.is_empty() {
        return Metrics::default();
    }

    let mut win_pct = Vec::new();
    let mut loss_pct = Vec::new();
    let mut win_abs = Vec::new();
    let mut loss_abs = Vec::new();
    for (i, t) in trades.iter().enumerate() {
        let abs = equity.realized_pnl.get(i).copied().unwrap_or(0.0);
        if t.pnl_pct > 0.0 {
            win_pct.push(t.pnl_pct);
            win_abs.push(abs);
        } else {
            // flat trades count against the win rate and into the losing averages
            loss_pct.push(t.pnl_pct);
            loss_abs.push(abs);
        }
    }

    let (first, last) = match (equity.first_equity(), equity.last_equity()) {
        (Some(f), Some(l)) => (f, l),
        _ => (0.0, 0.0),
    };

    Metrics {
        trade_count: trades.len(),
        win_rate: round2(win_pct.len() as f64 / trades.len() as f64 * 100.0),
        avg_win_pct: round2(mean(&win_pct)),
        avg_loss_pct: round2(mean(&loss_pct)),
        avg_win_abs: round2(mean(&win_abs)),
        avg_loss_abs: round2(mean(&loss_abs)),
        total_pnl_pct: round2(total_pnl_pct(first, last)),
        total_pnl_abs: round2(last - first),
        max_drawdown_pct: round2(max_drawdown_pct(&equity.values())),
    }
}

/// Percent change between two equity values. Zero when `first` is not positive.
pub fn total_pnl_pct(first: f64, last: f64) -> f64 {
    if first <= 0.0 {
        return 0.0;
    }
    (last / first - 1.0) * 100.0
}

/// Minimum over t of `(equity_t / running_peak − 1) × 100`.
pub fn max_drawdown_pct(equity: &[f64]) -> f64 {
    let Some(&first) = equity.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &eq in equity {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq / peak - 1.0) * 100.0;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

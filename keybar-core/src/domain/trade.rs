//! Trade: a completed long round trip: entry → exit.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Which exit condition closed the position.
///
/// When several conditions hold on the same bar the first in declaration order is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    TrailingStop,
    ProfitTargetPct,
    ProfitTargetAbs,
    Signal,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::TrailingStop => "trailing_stop",
            ExitReason::ProfitTargetPct => "profit_target_pct",
            ExitReason::ProfitTargetAbs => "profit_target_abs",
            ExitReason::Signal => "signal",
        }
    }
}

/// Immutable record of a closed position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub ticker: String,

    // ── Entry ──
    pub entry_bar: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_bar: usize,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    pub exit_reason: ExitReason,

    /// (exit / entry − 1) × 100.
    pub pnl_pct: f64,
    /// Holding time in seconds.
    pub duration_secs: i64,
}

impl Trade {
    /// Percent return of a long trade from entry to exit.
    pub fn pnl_pct_of(entry_price: f64, exit_price: f64) -> f64 {
        (exit_price / entry_price - 1.0) * 100.0
    }

    pub fn duration(&self) -> Duration {
        Duration::seconds(self.duration_secs)
    }

    pub fn bars_held(&self) -> usize {
        self.exit_bar - self.entry_bar
    }

    pub fn is_winner(&self) -> bool {
        self.pnl_pct > 0.0
    }
}

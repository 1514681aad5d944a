//! Screening: pick candidate symbols before backtesting.
//!
//! A [`Screener`] answers a [`ScreenFilter`] with an ordered symbol list. The optional
//! VWAP confirmation step then keeps only symbols whose latest intraday close is at or
//! above the session VWAP.

pub mod snapshot;

pub use snapshot::{QuoteSnapshot, SnapshotScreener};

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::data::{BarSource, Interval};
use crate::domain::Bar;
use crate::indicators::session_vwap;

#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("invalid screen filter: {0}")]
    InvalidFilter(String),

    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result ordering. Every key except `Symbol` sorts descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Volume,
    MarketCap,
    Change,
    RelativeVolume,
    Symbol,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Volume => "volume",
            SortKey::MarketCap => "market_cap",
            SortKey::Change => "change",
            SortKey::RelativeVolume => "relative_volume",
            SortKey::Symbol => "symbol",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "volume" => Ok(SortKey::Volume),
            "market_cap" => Ok(SortKey::MarketCap),
            "change" => Ok(SortKey::Change),
            "relative_volume" => Ok(SortKey::RelativeVolume),
            "symbol" => Ok(SortKey::Symbol),
            other => Err(format!("unknown sort key '{other}'")),
        }
    }
}

/// Liquidity and trend filter applied to a quote snapshot.
///
/// Price bounds are inclusive, the market-cap floor is inclusive, every other floor is
/// strict. An empty `exchanges` list admits all exchanges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScreenFilter {
    pub price_min: f64,
    pub price_max: f64,
    pub market_cap_min: f64,
    pub avg_volume_min: f64,
    pub volume_min: f64,
    /// Daily change floor in percent.
    pub change_min: f64,
    pub relative_volume_min: f64,
    pub sma50_below_close: bool,
    pub sma100_below_close: bool,
    pub sma200_below_close: bool,
    pub exchanges: Vec<String>,
    pub limit: usize,
    pub sort_by: SortKey,
    /// Keep only symbols whose last intraday close is at or above the session VWAP.
    pub vwap_confirm: bool,
}

impl ScreenFilter {
    pub fn validate(&self) -> Result<(), ScreenError> {
        if !(self.price_min >= 0.0 && self.price_min <= self.price_max) {
            return Err(ScreenError::InvalidFilter(format!(
                "price range [{}, {}] is empty or negative",
                self.price_min, self.price_max
            )));
        }
        if self.limit == 0 {
            return Err(ScreenError::InvalidFilter("limit must be at least 1".into()));
        }
        Ok(())
    }

    pub fn matches(&self, q: &QuoteSnapshot) -> bool {
        let sma_ok = |enabled: bool, sma: Option<f64>| !enabled || sma.is_some_and(|s| s < q.close);

        (self.price_min..=self.price_max).contains(&q.close)
            && q.market_cap >= self.market_cap_min
            && q.avg_volume_30d > self.avg_volume_min
            && q.volume > self.volume_min
            && q.change > self.change_min
            && q.relative_volume > self.relative_volume_min
            && sma_ok(self.sma50_below_close, q.sma50)
            && sma_ok(self.sma100_below_close, q.sma100)
            && sma_ok(self.sma200_below_close, q.sma200)
            && (self.exchanges.is_empty()
                || self.exchanges.iter().any(|e| e.eq_ignore_ascii_case(&q.exchange)))
    }
}

/// Screening query contract.
pub trait Screener: Send + Sync {
    fn name(&self) -> &str;

    fn query(&self, filter: &ScreenFilter) -> Result<Vec<String>, ScreenError>;
}

/// True when the last close is at or above the VWAP of the last bar's session.
pub fn vwap_confirms(bars: &[Bar]) -> bool {
    let vwap = session_vwap(bars);
    match (bars.last(), vwap.last().copied().flatten()) {
        (Some(bar), Some(v)) => bar.close >= v,
        _ => false,
    }
}

/// Keep the symbols whose `session` bars confirm above VWAP.
///
/// Symbols that fail to load are dropped and logged; screening never aborts on one
/// symbol's data.
pub fn confirm_with_vwap(
    source: &dyn BarSource,
    symbols: Vec<String>,
    session: NaiveDate,
    interval: Interval,
) -> Vec<String> {
    symbols
        .into_iter()
        .filter(|symbol| match source.fetch(symbol, session, session, interval) {
            Ok(series) => {
                let ok = vwap_confirms(series.bars());
                debug!(symbol = %symbol, confirmed = ok, "vwap confirmation");
                ok
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "vwap confirmation skipped");
                false
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) fn test_filter() -> ScreenFilter {
    ScreenFilter {
        price_min: 25.0,
        price_max: 250.0,
        market_cap_min: 1e9,
        avg_volume_min: 1e6,
        volume_min: 1e6,
        change_min: 0.0,
        relative_volume_min: 1.2,
        sma50_below_close: true,
        sma100_below_close: true,
        sma200_below_close: true,
        exchanges: vec!["NASDAQ".into(), "NYSE".into()],
        limit: 100,
        sort_by: SortKey::Volume,
        vwap_confirm: false,
    }
}

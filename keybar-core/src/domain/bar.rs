//! Bar and BarSeries: the fundamental market data units.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for a single symbol at a single intraday timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Returns true if any price field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: finite positive prices, high >= open/close >= low.
    pub fn is_sane(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        if !prices.iter().all(|p| p.is_finite()) {
            return false;
        }
        self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.low > 0.0
    }

    /// High minus low.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Absolute body as a percentage of the bar range. `None` when the range is zero.
    pub fn body_pct(&self) -> Option<f64> {
        let range = self.range();
        if range <= 0.0 {
            return None;
        }
        Some((self.close - self.open).abs() / range * 100.0)
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Trading session the bar belongs to (UTC calendar date).
    pub fn session(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum BarSeriesError {
    #[error("{symbol}: bar {index} at {timestamp} is not after the previous bar")]
    NotIncreasing {
        symbol: String,
        index: usize,
        timestamp: DateTime<Utc>,
    },

    #[error("{symbol}: bar {index} at {timestamp} has inconsistent OHLC values")]
    InsaneBar {
        symbol: String,
        index: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Ordered bar sequence for one symbol.
///
/// Timestamps are strictly increasing; gaps are allowed, duplicates are not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Validate and wrap a bar vector.
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, BarSeriesError> {
        let symbol = symbol.into();
        for (index, bar) in bars.iter().enumerate() {
            if !bar.is_sane() {
                return Err(BarSeriesError::InsaneBar {
                    symbol,
                    index,
                    timestamp: bar.timestamp,
                });
            }
            if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
                return Err(BarSeriesError::NotIncreasing {
                    symbol,
                    index,
                    timestamp: bar.timestamp,
                });
            }
        }
        Ok(Self { symbol, bars })
    }

    /// Sort by timestamp, keep the last bar of any duplicate timestamp, drop void bars,
    /// then validate. Used by adapters whose upstream data is loosely ordered.
    pub fn from_unordered(
        symbol: impl Into<String>,
        mut bars: Vec<Bar>,
    ) -> Result<Self, BarSeriesError> {
        bars.retain(|b| !b.is_void());
        bars.sort_by_key(|b| b.timestamp);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.timestamp == bar.timestamp => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self::new(symbol, deduped)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

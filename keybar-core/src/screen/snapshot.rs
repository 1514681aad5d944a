//! Screener over a quote snapshot CSV.
//!
//! Columns: `symbol,exchange,close,market_cap,avg_volume_30d,volume,change,
//! relative_volume,sma50,sma100,sma200`. SMA cells may be empty.

use std::cmp::Ordering;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ScreenError, ScreenFilter, Screener, SortKey};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub symbol: String,
    pub exchange: String,
    pub close: f64,
    pub market_cap: f64,
    pub avg_volume_30d: f64,
    pub volume: f64,
    /// Daily change in percent.
    pub change: f64,
    pub relative_volume: f64,
    pub sma50: Option<f64>,
    pub sma100: Option<f64>,
    pub sma200: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct SnapshotScreener {
    quotes: Vec<QuoteSnapshot>,
}

impl SnapshotScreener {
    pub fn new(quotes: Vec<QuoteSnapshot>) -> Self {
        Self { quotes }
    }

    pub fn from_csv(path: &Path) -> Result<Self, ScreenError> {
        let mut reader = csv::Reader::from_path(path)?;
        let quotes = reader
            .deserialize()
            .collect::<Result<Vec<QuoteSnapshot>, _>>()?;
        Ok(Self::new(quotes))
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

fn compare(key: SortKey, a: &QuoteSnapshot, b: &QuoteSnapshot) -> Ordering {
    let desc = |x: f64, y: f64| y.total_cmp(&x);
    match key {
        SortKey::Volume => desc(a.volume, b.volume),
        SortKey::MarketCap => desc(a.market_cap, b.market_cap),
        SortKey::Change => desc(a.change, b.change),
        SortKey::RelativeVolume => desc(a.relative_volume, b.relative_volume),
        SortKey::Symbol => a.symbol.cmp(&b.symbol),
    }
}

impl Screener for SnapshotScreener {
    fn name(&self) -> &str {
        "quote_snapshot"
    }

    fn query(&self, filter: &ScreenFilter) -> Result<Vec<String>, ScreenError> {
        filter.validate()?;

        let mut hits: Vec<&QuoteSnapshot> = self.quotes.iter().filter(|q| filter.matches(q)).collect();
        // stable sort: ties keep snapshot order
        hits.sort_by(|a, b| compare(filter.sort_by, a, b));
        hits.truncate(filter.limit);

        info!(
            universe = self.quotes.len(),
            matched = hits.len(),
            sort_by = %filter.sort_by,
            "screen complete"
        );
        Ok(hits.into_iter().map(|q| q.symbol.clone()).collect())
    }
}

//! CSV directory bar source.
//!
//! Reads `<dir>/<SYMBOL>.csv` with the header `timestamp,open,high,low,close,volume`,
//! where `timestamp` is RFC 3339 (e.g. `2024-03-04T14:30:00Z`). Rows may be unsorted;
//! duplicate timestamps keep the last row. The interval argument is informational: the
//! file is returned at whatever resolution it was written.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::debug;

use super::provider::{BarSource, DataError, DataSource, Interval};
use crate::domain::{Bar, BarSeries};

#[derive(Debug, Clone)]
pub struct CsvBarSource {
    dir: PathBuf,
}

impl CsvBarSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

/// Parse every row of a bar CSV.
pub fn read_bars(path: &Path) -> Result<Vec<Bar>, DataError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut bars = Vec::new();
    for row in reader.deserialize() {
        bars.push(row?);
    }
    Ok(bars)
}

/// Write a series in the format [`CsvBarSource`] reads.
pub fn write_bars<W: Write>(writer: W, series: &BarSeries) -> Result<(), DataError> {
    let mut w = csv::Writer::from_writer(writer);
    for bar in series.bars() {
        w.serialize(bar)?;
    }
    w.flush()?;
    Ok(())
}

impl BarSource for CsvBarSource {
    fn name(&self) -> &str {
        "csv_directory"
    }

    fn source(&self) -> DataSource {
        DataSource::CsvDirectory
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<BarSeries, DataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            debug!(symbol, path = %path.display(), "no csv file");
            return Err(DataError::DataUnavailable {
                symbol: symbol.to_string(),
            });
        }

        let mut bars = read_bars(&path)?;
        bars.retain(|b| (start..=end).contains(&b.session()));
        debug!(symbol, %interval, bars = bars.len(), "csv bars in range");

        if bars.is_empty() {
            return Err(DataError::DataUnavailable {
                symbol: symbol.to_string(),
            });
        }
        Ok(BarSeries::from_unordered(symbol, bars)?)
    }
}

/// Create `<dir>/<symbol>.csv` from a series.
pub fn save_series(dir: &Path, series: &BarSeries) -> Result<PathBuf, DataError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.csv", series.symbol()));
    write_bars(File::create(&path)?, series)?;
    Ok(path)
}

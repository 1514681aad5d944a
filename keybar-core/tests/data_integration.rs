//! Integration tests for the bar sources and the screening path.

use chrono::NaiveDate;
use keybar_core::data::{save_series, BarSource, CsvBarSource, DataError, Interval, SyntheticSource};
use keybar_core::screen::{confirm_with_vwap, vwap_confirms, Screener, SnapshotScreener};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

#[test]
fn synthetic_series_survives_csv_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let synthetic = SyntheticSource::new(2024);
    let series = synthetic.fetch("NVDA", day(4), day(8), Interval::M5).unwrap();

    let path = save_series(dir.path(), &series).unwrap();
    assert!(path.ends_with("NVDA.csv"));

    let csv = CsvBarSource::new(dir.path());
    let loaded = csv.fetch("NVDA", day(4), day(8), Interval::M5).unwrap();
    assert_eq!(loaded.bars(), series.bars());

    // narrower window keeps whole sessions only
    let one_day = csv.fetch("NVDA", day(6), day(6), Interval::M5).unwrap();
    assert_eq!(one_day.len(), 78);
    assert!(one_day.bars().iter().all(|b| b.session() == day(6)));
}

#[test]
fn unknown_symbol_is_unavailable_not_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let csv = CsvBarSource::new(dir.path());
    assert!(matches!(
        csv.fetch("NOPE", day(4), day(8), Interval::M5),
        Err(DataError::DataUnavailable { .. })
    ));
}

#[test]
fn screen_then_vwap_confirm() {
    let dir = tempfile::tempdir().unwrap();
    let synthetic = SyntheticSource::new(9);
    for symbol in ["AAA", "BBB"] {
        let s = synthetic.fetch(symbol, day(4), day(4), Interval::M5).unwrap();
        save_series(&dir.path().join("bars"), &s).unwrap();
    }

    let snapshot = dir.path().join("quotes.csv");
    std::fs::write(
        &snapshot,
        "symbol,exchange,close,market_cap,avg_volume_30d,volume,change,relative_volume,sma50,sma100,sma200\n\
         AAA,NASDAQ,50,5000000000,2000000,3000000,2.0,1.5,45,44,40\n\
         BBB,NYSE,60,5000000000,2000000,4000000,2.0,1.5,55,54,50\n\
         CCC,NYSE,60,5000000000,2000000,5000000,-1.0,1.5,55,54,50\n",
    )
    .unwrap();

    let screener = SnapshotScreener::from_csv(&snapshot).unwrap();
    let filter: keybar_core::screen::ScreenFilter = serde_json::from_str(
        r#"{
            "price_min": 25.0, "price_max": 250.0, "market_cap_min": 1e9,
            "avg_volume_min": 1e6, "volume_min": 1e6, "change_min": 0.0,
            "relative_volume_min": 1.2, "sma50_below_close": true,
            "sma100_below_close": true, "sma200_below_close": true,
            "exchanges": [], "limit": 10, "sort_by": "volume", "vwap_confirm": true
        }"#,
    )
    .unwrap();

    // CCC fails the change floor; BBB sorts first on volume
    let hits = screener.query(&filter).unwrap();
    assert_eq!(hits, vec!["BBB", "AAA"]);

    let bars = CsvBarSource::new(dir.path().join("bars"));
    let confirmed = confirm_with_vwap(&bars, hits.clone(), day(4), Interval::M5);
    let expected: Vec<String> = hits
        .into_iter()
        .filter(|s| {
            let series = bars.fetch(s, day(4), day(4), Interval::M5).unwrap();
            vwap_confirms(series.bars())
        })
        .collect();
    assert_eq!(confirmed, expected);
}

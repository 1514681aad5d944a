//! Reporting and export: JSON, CSV, and plain-text artifact generation.
//!
//! A batch is persisted as:
//! - `report.json`: the full `BatchReport` wrapped with a schema version
//! - `summary.csv`: one row per successful symbol
//! - `trades.csv`: every closed trade across symbols
//! - `equity/<SYMBOL>.csv`: bar-by-bar equity per symbol
//!
//! Unknown schema versions are rejected on load.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use keybar_core::domain::Trade;
use serde::{Deserialize, Serialize};

use crate::batch::{BatchReport, SummaryRow};
use crate::performance::EquityCurve;

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ReportEnvelope {
    schema_version: u32,
    report: BatchReport,
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &BatchReport) -> Result<String> {
    #[derive(Serialize)]
    struct Borrowed<'a> {
        schema_version: u32,
        report: &'a BatchReport,
    }
    serde_json::to_string_pretty(&Borrowed {
        schema_version: SCHEMA_VERSION,
        report,
    })
    .context("failed to serialize BatchReport to JSON")
}

/// Deserialize a report, rejecting schema versions newer than this build.
pub fn import_json(json: &str) -> Result<BatchReport> {
    let envelope: ReportEnvelope =
        serde_json::from_str(json).context("failed to deserialize BatchReport from JSON")?;
    if envelope.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            envelope.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(envelope.report)
}

// ─── CSV export ─────────────────────────────────────────────────────

pub fn export_summary_csv(rows: &[SummaryRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(row)?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: ticker, entry_bar, entry_time, entry_price, exit_bar, exit_time,
/// exit_price, exit_reason, pnl_pct, duration_secs, bars_held
pub fn export_trades_csv<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "ticker",
        "entry_bar",
        "entry_time",
        "entry_price",
        "exit_bar",
        "exit_time",
        "exit_price",
        "exit_reason",
        "pnl_pct",
        "duration_secs",
        "bars_held",
    ])?;

    for t in trades {
        wtr.write_record([
            &t.ticker,
            &t.entry_bar.to_string(),
            &t.entry_time.to_rfc3339(),
            &format!("{:.4}", t.entry_price),
            &t.exit_bar.to_string(),
            &t.exit_time.to_rfc3339(),
            &format!("{:.4}", t.exit_price),
            &t.exit_reason.as_str().to_string(),
            &format!("{:.4}", t.pnl_pct),
            &t.duration_secs.to_string(),
            &t.bars_held().to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn export_equity_csv(curve: &EquityCurve) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["bar_index", "timestamp", "equity"])?;
    for (i, p) in curve.points.iter().enumerate() {
        wtr.write_record([
            &i.to_string(),
            &p.timestamp.to_rfc3339(),
            &format!("{:.2}", p.equity),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Writes the full artifact set into `output_dir`, creating it if needed.
///
/// Returns `output_dir`.
pub fn save_artifacts(report: &BatchReport, output_dir: &Path) -> Result<PathBuf> {
    let equity_dir = output_dir.join("equity");
    std::fs::create_dir_all(&equity_dir)
        .with_context(|| format!("failed to create artifact dir: {}", equity_dir.display()))?;

    std::fs::write(output_dir.join("report.json"), export_json(report)?)?;
    std::fs::write(
        output_dir.join("summary.csv"),
        export_summary_csv(&report.summary)?,
    )?;
    std::fs::write(
        output_dir.join("trades.csv"),
        export_trades_csv(report.results.iter().flat_map(|r| r.trades.iter()))?,
    )?;

    for r in &report.results {
        let path = equity_dir.join(format!("{}.csv", r.symbol));
        std::fs::write(&path, export_equity_csv(&r.equity)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(output_dir.to_path_buf())
}

pub fn load_artifacts(dir: &Path) -> Result<BatchReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Plain-text table ───────────────────────────────────────────────

/// Fixed-width summary table followed by the failure list.
pub fn render_summary_table(report: &BatchReport) -> String {
    let mut out = String::with_capacity(256 + report.summary.len() * 96);

    let _ = writeln!(
        out,
        "{:<8} {:>6} {:>6} {:>8} {:>9} {:>9} {:>10} {:>10} {:>10} {:>12} {:>8} {:>5}",
        "SYMBOL",
        "BARS",
        "TRADES",
        "WIN%",
        "AVG_WIN%",
        "AVG_LOSS%",
        "AVG_WIN",
        "AVG_LOSS",
        "PNL%",
        "PNL",
        "MAX_DD%",
        "OPEN"
    );
    for r in &report.summary {
        let _ = writeln!(
            out,
            "{:<8} {:>6} {:>6} {:>8.2} {:>9.2} {:>9.2} {:>10.2} {:>10.2} {:>10.2} {:>12.2} {:>8.2} {:>5}",
            r.symbol,
            r.bars,
            r.trades,
            r.win_rate,
            r.avg_win_pct,
            r.avg_loss_pct,
            r.avg_win_abs,
            r.avg_loss_abs,
            r.total_pnl_pct,
            r.total_pnl_abs,
            r.max_drawdown_pct,
            if r.open_position { "yes" } else { "no" }
        );
    }

    if !report.failures.is_empty() {
        let _ = writeln!(out, "\nskipped {} symbol(s):", report.failures.len());
        for f in &report.failures {
            let _ = writeln!(out, "  {:<8} {:<20} {}", f.symbol, f.kind, f.message);
        }
    }
    out
}

//! KeyBar Runner: backtest orchestration, performance metrics, batch runs, export.
//!
//! This crate builds on `keybar-core` to provide:
//! - TOML configuration with validation and fingerprinting
//! - Equity curve and metric derivation per symbol
//! - The per-symbol pipeline (fetch, signals, simulation, performance)
//! - Parallel batch runs with per-symbol failure isolation
//! - CSV/JSON artifact export

pub mod batch;
pub mod config;
pub mod export;
pub mod performance;
pub mod runner;

pub use batch::{run_batch, BatchError, BatchReport, SummaryRow, SymbolFailure};
pub use config::{AccountConfig, BacktestConfig, BatchConfig, ConfigError, ConfigId};
pub use export::{load_artifacts, render_summary_table, save_artifacts, SCHEMA_VERSION};
pub use performance::{equity_curve, metrics, EquityCurve, EquityPoint, Metrics};
pub use runner::{history_window, run_series, run_symbol, SymbolError, SymbolResult};

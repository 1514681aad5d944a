//! KeyBar Core: bar domain types, indicators, signals, trade simulation, data sources.
//!
//! This crate contains the per-symbol backtesting engine:
//! - Domain types (bars, bar series, trades)
//! - Pure indicator library (EMA, ATR, rolling stats, session VWAP, RVOL, Heikin-Ashi)
//! - Signal engine (key bar, relative strength, volume gate, checklist)
//! - Index-keyed long-only trade simulator with a ratcheting ATR stop
//! - BarSource and Screener contracts with their reference adapters

pub mod data;
pub mod domain;
pub mod indicators;
pub mod screen;
pub mod signals;
pub mod simulator;
pub mod strategy;

//! Domain types for KeyBar Lab

pub mod bar;
pub mod trade;

pub use bar::{Bar, BarSeries, BarSeriesError};
pub use trade::{ExitReason, Trade};

/// Symbol type alias
pub type Symbol = String;

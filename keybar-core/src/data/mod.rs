//! Bar retrieval: the BarSource contract and its adapters.

pub mod circuit_breaker;
pub mod csv_source;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use csv_source::{save_series, CsvBarSource};
pub use provider::{BarSource, DataError, DataSource, Interval};
pub use synthetic::SyntheticSource;
pub use yahoo::YahooProvider;

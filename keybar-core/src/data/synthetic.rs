//! Seeded random-walk bar source for offline runs and benchmarks.
//!
//! Bars cover the regular US session (14:30 to 21:00 UTC) on weekdays. Each symbol gets
//! its own sub-seed derived with BLAKE3 from `(seed, symbol)`, so a series does not
//! depend on which other symbols were generated or in what order.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{BarSource, DataError, DataSource, Interval};
use crate::domain::{Bar, BarSeries};

const SESSION_OPEN: (u32, u32) = (14, 30);
const SESSION_MINUTES: i64 = 390;

#[derive(Debug, Clone)]
pub struct SyntheticSource {
    seed: u64,
    /// Per-bar return half-width (uniform in [-v, v]).
    volatility: f64,
    /// Probability that a bar is a volume/range spike.
    spike_prob: f64,
}

impl SyntheticSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            volatility: 0.002,
            spike_prob: 0.02,
        }
    }

    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility;
        self
    }

    pub fn with_spike_prob(mut self, spike_prob: f64) -> Self {
        self.spike_prob = spike_prob.clamp(0.0, 1.0);
        self
    }

    /// Deterministic sub-seed for one symbol.
    pub fn sub_seed(&self, symbol: &str) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(symbol.as_bytes());
        let hash = hasher.finalize();
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(buf)
    }

    pub fn generate(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Vec<Bar> {
        let mut rng = StdRng::seed_from_u64(self.sub_seed(symbol));
        let mut price: f64 = rng.gen_range(20.0..200.0);
        let base_volume: f64 = rng.gen_range(50_000.0..500_000.0);

        let step = interval.duration();
        let per_session = match interval {
            Interval::D1 => 1,
            _ => (SESSION_MINUTES / step.num_minutes()).max(1),
        };
        let open_time =
            NaiveTime::from_hms_opt(SESSION_OPEN.0, SESSION_OPEN.1, 0).unwrap_or(NaiveTime::MIN);

        let mut bars = Vec::new();
        for day in start.iter_days().take_while(|d| *d <= end) {
            if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                continue;
            }
            let session_start = day.and_time(open_time).and_utc();
            for slot in 0..per_session {
                let spike = rng.gen_bool(self.spike_prob);
                let vol = if spike { self.volatility * 5.0 } else { self.volatility };
                let drift = if spike { vol * 0.5 } else { 0.0 };

                let open = price;
                let close = (open * (1.0 + drift + rng.gen_range(-vol..=vol))).max(0.01);
                let wick = open.max(close) * rng.gen_range(0.0..=vol);
                let tail = open.min(close) * rng.gen_range(0.0..=vol);
                let volume_mult = if spike { rng.gen_range(3.0..6.0) } else { rng.gen_range(0.5..1.5) };

                bars.push(Bar {
                    timestamp: session_start + Duration::minutes(slot * step.num_minutes()),
                    open,
                    high: open.max(close) + wick,
                    low: (open.min(close) - tail).max(0.005),
                    close,
                    volume: (base_volume * volume_mult) as u64,
                });
                price = close;
            }
        }
        bars
    }
}

impl BarSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<BarSeries, DataError> {
        let bars = self.generate(symbol, start, end, interval);
        if bars.is_empty() {
            return Err(DataError::DataUnavailable {
                symbol: symbol.to_string(),
            });
        }
        Ok(BarSeries::new(symbol, bars)?)
    }
}

//! Serializable backtest configuration.
//!
//! One TOML document carries every operator-tunable value: account sizing, the strategy
//! parameters and batch settings. The engine has no hidden defaults; `configs/default.toml`
//! ships the reference values.

use std::path::Path;

use keybar_core::data::Interval;
use keybar_core::screen::ScreenFilter;
use keybar_core::strategy::{ParamError, StrategyConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Content hash of a validated configuration.
pub type ConfigId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<ParamError> for ConfigError {
    fn from(e: ParamError) -> Self {
        ConfigError::Invalid(e.to_string())
    }
}

/// Capital and data window shared by every symbol in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountConfig {
    pub initial_capital: f64,
    /// Percent of current cash committed per trade.
    pub alloc_pct: f64,
    pub leverage: f64,
    /// Calendar days of history fetched per symbol, ending at the run date.
    pub lookback_days: u32,
    pub interval: Interval,
}

impl AccountConfig {
    /// Notional put at risk on entry for the given cash balance.
    pub fn allocation(&self, cash: f64) -> f64 {
        cash * (self.alloc_pct / 100.0) * self.leverage
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    /// Worker threads for the per-symbol pipelines.
    pub concurrency: usize,
}

/// Complete, reproducible description of a backtest batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BacktestConfig {
    pub account: AccountConfig,
    pub strategy: StrategyConfig,
    pub batch: BatchConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<ScreenFilter>,
}

impl BacktestConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let cfg: BacktestConfig = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Rejects values no run could use. Called before any symbol is fetched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.account;
        if !(a.initial_capital.is_finite() && a.initial_capital > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "account.initial_capital must be positive, got {}",
                a.initial_capital
            )));
        }
        if !(a.alloc_pct > 0.0 && a.alloc_pct <= 100.0) {
            return Err(ConfigError::Invalid(format!(
                "account.alloc_pct must be in (0, 100], got {}",
                a.alloc_pct
            )));
        }
        if !(a.leverage.is_finite() && a.leverage > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "account.leverage must be positive, got {}",
                a.leverage
            )));
        }
        if a.lookback_days == 0 {
            return Err(ConfigError::Invalid("account.lookback_days must be at least 1".into()));
        }
        if self.batch.concurrency == 0 {
            return Err(ConfigError::Invalid("batch.concurrency must be at least 1".into()));
        }
        if let Some(screen) = &self.screen {
            screen
                .validate()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        self.strategy.validate()?;
        Ok(())
    }

    /// Deterministic BLAKE3 hash of the configuration.
    ///
    /// Two batches with identical configs share a fingerprint; it is stamped on every
    /// exported report.
    pub fn fingerprint(&self) -> ConfigId {
        // Serializing plain structs of numbers, strings and bools cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> BacktestConfig {
    BacktestConfig {
        account: AccountConfig {
            initial_capital: 10_000.0,
            alloc_pct: 10.0,
            leverage: 1.0,
            lookback_days: 15,
            interval: Interval::M5,
        },
        strategy: keybar_core::strategy::test_strategy(),
        batch: BatchConfig { concurrency: 2 },
        screen: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_roundtrip() {
        let cfg = test_config();
        let text = cfg.to_toml().unwrap();
        let back = BacktestConfig::from_toml(&text).unwrap();
        assert_eq!(cfg, back);
        assert_eq!(cfg.fingerprint(), back.fingerprint());
    }

    #[test]
    fn fingerprint_tracks_changes() {
        let a = test_config();
        let mut b = test_config();
        b.strategy.trailing_stop.multiplier = 2.5;
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn rejects_bad_account_values() {
        let mut cfg = test_config();
        cfg.account.alloc_pct = 0.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));

        let mut cfg = test_config();
        cfg.account.initial_capital = -1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = test_config();
        cfg.batch.concurrency = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn strategy_errors_surface_as_invalid() {
        let mut cfg = test_config();
        cfg.strategy.trailing_stop.atr_period = 0;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut text = test_config().to_toml().unwrap();
        text = text.replace("[batch]", "[batch]\nthreads = 4");
        assert!(matches!(
            BacktestConfig::from_toml(&text),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn allocation_applies_leverage() {
        let mut a = test_config().account;
        a.leverage = 2.0;
        assert!((a.allocation(10_000.0) - 2_000.0).abs() < 1e-9);
    }
}

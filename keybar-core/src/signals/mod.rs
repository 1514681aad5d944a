//! SignalEngine: per-bar entry and exit flags.
//!
//! Signals are position-agnostic: they see bar history and strategy parameters, never
//! the simulator's state. Entry is the conjunction of the enabled sub-filters (a disabled
//! filter contributes `true`); exit is a bearish bar. Undefined indicator values always
//! evaluate to `false`.

pub mod checklist;
pub mod keybar;
pub mod relative_strength;
pub mod volume;

pub use checklist::{checklist_signal, ChecklistCheck, ChecklistContext};
pub use keybar::keybar_signal;
pub use relative_strength::{atr_baseline, relative_strength_signal};
pub use volume::volume_gate;

use tracing::debug;

use crate::domain::Bar;
use crate::strategy::StrategyConfig;

/// Boolean series aligned with a bar series.
pub type SignalSeries = Vec<bool>;

/// Every filter series plus the combined entry/exit flags, kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSet {
    pub keybar: SignalSeries,
    pub relative_strength: SignalSeries,
    pub volume: SignalSeries,
    pub checklist: SignalSeries,
    pub entry: SignalSeries,
    pub exit: SignalSeries,
}

impl SignalSet {
    pub fn len(&self) -> usize {
        self.entry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.entry.iter().filter(|&&e| e).count()
    }

    pub fn exit_count(&self) -> usize {
        self.exit.iter().filter(|&&e| e).count()
    }
}

/// Exit flag: close below open.
pub fn bearish_exit(bars: &[Bar]) -> SignalSeries {
    bars.iter().map(Bar::is_bearish).collect()
}

pub fn compute_signals(bars: &[Bar], cfg: &StrategyConfig) -> SignalSet {
    let n = bars.len();

    // Always computed: the checklist's VWAP breakout reads it even with the filter off.
    let keybar = keybar_signal(bars, &cfg.keybar);

    let relative_strength = if cfg.relative_strength.enabled {
        relative_strength_signal(bars, &cfg.relative_strength)
    } else {
        vec![true; n]
    };

    let volume = if cfg.volume.enabled {
        volume_gate(bars, &cfg.volume)
    } else {
        vec![true; n]
    };

    let checklist = checklist_signal(bars, &keybar, &cfg.checklist, &cfg.trailing_stop);

    let entry: SignalSeries = (0..n)
        .map(|i| {
            (!cfg.keybar.enabled || keybar[i]) && relative_strength[i] && volume[i] && checklist[i]
        })
        .collect();

    for (i, bar) in bars.iter().enumerate() {
        if keybar[i] && !entry[i] {
            debug!(
                index = i,
                timestamp = %bar.timestamp,
                relative_strength = relative_strength[i],
                volume = volume[i],
                checklist = checklist[i],
                "key bar filtered out"
            );
        }
    }

    SignalSet {
        keybar,
        relative_strength,
        volume,
        checklist,
        entry,
        exit: bearish_exit(bars),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;
    use crate::strategy::test_strategy;

    #[test]
    fn all_filters_disabled_enters_everywhere() {
        let bars = make_bars(&[100.0, 101.0, 99.0]);
        let set = compute_signals(&bars, &test_strategy());
        assert_eq!(set.entry, vec![true; 3]);
        assert_eq!(set.exit, vec![false, false, true]);
        assert_eq!(set.entry_count(), 3);
        assert_eq!(set.exit_count(), 1);
    }

    #[test]
    fn enabled_keybar_gates_entry() {
        let bars = make_bars(&vec![100.0; 30]);
        let mut cfg = test_strategy();
        cfg.keybar.enabled = true;
        let set = compute_signals(&bars, &cfg);
        assert_eq!(set.entry_count(), 0);
        assert_eq!(set.len(), 30);
    }

    #[test]
    fn series_align_with_bars() {
        let bars = make_bars(&[100.0; 7]);
        let mut cfg = test_strategy();
        cfg.keybar.enabled = true;
        cfg.relative_strength.enabled = true;
        cfg.volume.enabled = true;
        cfg.checklist.bullish_thrust = true;
        let set = compute_signals(&bars, &cfg);
        for series in [
            &set.keybar,
            &set.relative_strength,
            &set.volume,
            &set.checklist,
            &set.entry,
            &set.exit,
        ] {
            assert_eq!(series.len(), bars.len());
        }
    }

    #[test]
    fn empty_series() {
        let set = compute_signals(&[], &test_strategy());
        assert!(set.is_empty());
    }
}

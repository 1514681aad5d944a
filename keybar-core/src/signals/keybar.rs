//! Key-bar detection.
//!
//! A key bar has TR > atr_mult x ATR(atr_len), volume > volume_mult x SMA(volume,
//! vol_avg_len) and a body larger than min_body_pct of its range. A zero-range bar is
//! never a key bar.

use crate::domain::Bar;
use crate::indicators::{atr, gt, rolling_mean, true_range, Field};
use crate::strategy::KeyBarConfig;

pub fn keybar_signal(bars: &[Bar], cfg: &KeyBarConfig) -> Vec<bool> {
    let tr = true_range(bars);
    let atr = atr(bars, cfg.atr_len);
    let vol_avg = rolling_mean(&Field::Volume.series(bars), cfg.vol_avg_len);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let wide = gt(Some(tr[i]), atr[i].map(|a| cfg.atr_mult * a));
            let heavy = gt(
                Some(bar.volume as f64),
                vol_avg[i].map(|v| cfg.volume_mult * v),
            );
            let bodied = gt(bar.body_pct(), Some(cfg.min_body_pct));
            wide && heavy && bodied
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;
    use crate::strategy::test_strategy;

    fn cfg() -> KeyBarConfig {
        KeyBarConfig {
            enabled: true,
            atr_len: 3,
            atr_mult: 1.5,
            volume_mult: 1.5,
            vol_avg_len: 3,
            min_body_pct: 50.0,
        }
    }

    #[test]
    fn flat_bars_never_qualify() {
        let mut bars = make_bars(&vec![100.0; 20]);
        for b in &mut bars {
            b.high = 100.0;
            b.low = 100.0;
        }
        assert!(keybar_signal(&bars, &cfg()).iter().all(|&k| !k));
    }

    #[test]
    fn wide_heavy_bar_qualifies() {
        let mut bars = make_bars(&vec![100.0; 6]);
        // bars 0..5 have range 2; bar 5 jumps from 100 to 110 on triple volume
        bars[5].open = 100.0;
        bars[5].close = 110.0;
        bars[5].high = 110.5;
        bars[5].low = 99.5;
        bars[5].volume = 5000;
        let signal = keybar_signal(&bars, &cfg());
        assert!(signal[5]);
        assert!(signal[..5].iter().all(|&k| !k));
    }

    #[test]
    fn small_body_fails() {
        let mut bars = make_bars(&vec![100.0; 6]);
        bars[5].open = 100.0;
        bars[5].close = 101.0;
        bars[5].high = 110.0;
        bars[5].low = 95.0;
        bars[5].volume = 5000;
        assert!(!keybar_signal(&bars, &cfg())[5]);
    }

    #[test]
    fn warmup_is_false() {
        let bars = make_bars(&[100.0, 110.0]);
        let kb = test_strategy().keybar;
        assert_eq!(keybar_signal(&bars, &kb), vec![false, false]);
    }
}

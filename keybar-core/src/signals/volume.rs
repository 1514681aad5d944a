//! Volume gate.
//!
//! (sma_check and volume > SMA(volume, sma_len)) or rvol > hard or rvol > soft.

use crate::domain::Bar;
use crate::indicators::{gt, relative_volume, rolling_mean, Field};
use crate::strategy::VolumeGateConfig;

pub fn volume_gate(bars: &[Bar], cfg: &VolumeGateConfig) -> Vec<bool> {
    let vol_sma = rolling_mean(&Field::Volume.series(bars), cfg.sma_len);
    let rvol = relative_volume(bars, cfg.rvol_days);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let above_sma = cfg.sma_check && gt(Some(bar.volume as f64), vol_sma[i]);
            let hard = gt(rvol[i], Some(cfg.rvol_hard_threshold));
            let soft = gt(rvol[i], Some(cfg.rvol_soft_threshold));
            above_sma || hard || soft
        })
        .collect()
}

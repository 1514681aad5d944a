/// Long-side trailing stop with the ratchet invariant.
///
/// **Core Rule:** the stop may tighten, never loosen (even if ATR expands).
///
/// A widening ATR would otherwise pull the stop down after a favourable move and give
/// back the gain it was protecting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailingStop {
    level: f64,
}

impl TrailingStop {
    pub fn new(initial_level: f64) -> Self {
        Self {
            level: initial_level,
        }
    }

    /// Apply a proposed level; returns the ratcheted level.
    ///
    /// ```
    /// use keybar_core::simulator::TrailingStop;
    ///
    /// let mut stop = TrailingStop::new(95.0);
    /// assert_eq!(stop.apply(100.0), 100.0); // tighten
    /// assert_eq!(stop.apply(90.0), 100.0); // loosening blocked
    /// ```
    pub fn apply(&mut self, proposed: f64) -> f64 {
        if proposed > self.level {
            self.level = proposed;
        }
        self.level
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    /// True when `close` has fallen strictly below the stop.
    pub fn is_breached(&self, close: f64) -> bool {
        close < self.level
    }
}

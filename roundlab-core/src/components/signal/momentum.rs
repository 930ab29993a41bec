//! Momentum signal — fast/slow EMA gap over recent close prices.
//!
//! gap% = (EMA_fast - EMA_slow) / EMA_slow * 100, both EMAs computed over the
//! last `window` closes. Fires UP when gap% > `min_gap_percent`, DOWN when
//! gap% < -`min_gap_percent`. Strength is `|gap%|`.

use crate::components::history::{History, RoundView};
use crate::domain::Side;
use crate::indicators::last_ema;

use super::{priced, SignalDecision, SignalGenerator};

#[derive(Debug, Clone)]
pub struct Momentum {
    pub fast_period: usize,
    pub slow_period: usize,
    /// Closes fed to both EMAs; at least `slow_period`.
    pub window: usize,
    pub min_gap_percent: f64,
    pub fee_factor: f64,
}

impl Momentum {
    pub fn new(fast_period: usize, slow_period: usize, min_gap_percent: f64, fee_factor: f64) -> Self {
        assert!(fast_period >= 1, "fast_period must be >= 1");
        assert!(
            slow_period > fast_period,
            "slow_period must be greater than fast_period"
        );
        assert!(
            min_gap_percent >= 0.0 && min_gap_percent.is_finite(),
            "min_gap_percent must be non-negative and finite"
        );
        Self {
            fast_period,
            slow_period,
            window: slow_period.saturating_mul(2),
            min_gap_percent,
            fee_factor,
        }
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(self.slow_period);
        self
    }

    /// EMA gap in percent over the given closes.
    pub fn gap_percent<I>(&self, closes: I) -> Option<f64>
    where
        I: Iterator<Item = f64> + Clone,
    {
        let fast = last_ema(closes.clone(), self.fast_period)?;
        let slow = last_ema(closes, self.slow_period)?;
        if slow == 0.0 {
            return None;
        }
        Some((fast - slow) / slow * 100.0)
    }
}

impl SignalGenerator for Momentum {
    fn name(&self) -> &str {
        "momentum"
    }

    fn lookback(&self) -> usize {
        self.window
    }

    fn generate(&self, round: &RoundView<'_>, history: &History<'_>) -> Option<SignalDecision> {
        let closes = history.closes(self.window)?;
        let gap = self.gap_percent(closes)?;

        let side = if gap > self.min_gap_percent {
            Side::Up
        } else if gap < -self.min_gap_percent {
            Side::Down
        } else {
            return None;
        };
        priced(round, side, gap.abs(), self.fee_factor)
    }
}

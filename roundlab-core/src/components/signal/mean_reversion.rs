//! Mean-reversion signal — fade price at a Bollinger band extreme.
//!
//! Bands are built from the close prices of the last `period` rounds. The
//! latest close is expressed in half-widths from the middle band (`z`); when
//! `z >= 1 - proximity` the signal calls DOWN, when `z <= -(1 - proximity)` it
//! calls UP. Strength is `|z|`.

use crate::components::history::{History, RoundView};
use crate::domain::Side;
use crate::indicators::bands;

use super::{priced, SignalDecision, SignalGenerator};

#[derive(Debug, Clone)]
pub struct MeanReversion {
    pub period: usize,
    pub std_multiplier: f64,
    /// Fraction of the half-width inside the band that still counts as "at the edge".
    pub proximity: f64,
    pub fee_factor: f64,
}

impl MeanReversion {
    pub fn new(period: usize, std_multiplier: f64, proximity: f64, fee_factor: f64) -> Self {
        assert!(period >= 2, "period must be >= 2");
        assert!(
            std_multiplier > 0.0 && std_multiplier.is_finite(),
            "std_multiplier must be positive and finite"
        );
        assert!(
            (0.0..1.0).contains(&proximity),
            "proximity must be in [0, 1)"
        );
        Self {
            period,
            std_multiplier,
            proximity,
            fee_factor,
        }
    }

    pub fn default_params(fee_factor: f64) -> Self {
        Self::new(20, 2.0, 0.0, fee_factor)
    }
}

impl SignalGenerator for MeanReversion {
    fn name(&self) -> &str {
        "mean_reversion"
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn generate(&self, round: &RoundView<'_>, history: &History<'_>) -> Option<SignalDecision> {
        let closes = history.closes(self.period)?;
        let price = closes.clone().last()?;
        let b = bands(closes, self.period, self.std_multiplier)?;
        let half_width = b.half_width();
        if half_width <= 0.0 {
            return None;
        }

        let z = (price - b.middle) / half_width;
        let edge = 1.0 - self.proximity;

        let side = if z >= edge {
            Side::Down
        } else if z <= -edge {
            Side::Up
        } else {
            return None;
        };
        priced(round, side, z.abs(), self.fee_factor)
    }
}

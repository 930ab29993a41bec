//! Trend-follow signal — trades the precomputed trend indicator directly.
//!
//! The ingestion side attaches `trend_signal` and `trend_gap_percent` (EMA gap)
//! to each round before lock. Fires in the trend's direction when the gap
//! magnitude reaches `min_gap_percent`.

use crate::components::history::{History, RoundView};

use super::{priced, SignalDecision, SignalGenerator};

#[derive(Debug, Clone)]
pub struct TrendFollow {
    pub min_gap_percent: f64,
    pub fee_factor: f64,
}

impl TrendFollow {
    pub fn new(min_gap_percent: f64, fee_factor: f64) -> Self {
        assert!(
            min_gap_percent >= 0.0 && min_gap_percent.is_finite(),
            "min_gap_percent must be non-negative and finite"
        );
        Self {
            min_gap_percent,
            fee_factor,
        }
    }
}

impl SignalGenerator for TrendFollow {
    fn name(&self) -> &str {
        "trend_follow"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn generate(&self, round: &RoundView<'_>, _history: &History<'_>) -> Option<SignalDecision> {
        let side = round.trend_signal()?.side()?;
        let gap = round.trend_gap_percent()?.abs();
        if gap.is_nan() || gap < self.min_gap_percent {
            return None;
        }
        priced(round, side, gap, self.fee_factor)
    }
}

//! Crowd signals — bet with or against the pool majority.
//!
//! Contrarian backs the side holding the smaller pool share (higher payout);
//! follow backs the majority. Both optionally require the round's precomputed
//! trend indicator to agree with the chosen side, and both require the implied
//! payout to clear `min_payout`.

use crate::components::history::{History, RoundView};

use super::{priced, SignalDecision, SignalGenerator};

/// Which side of the crowd to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrowdStance {
    Contrarian,
    Follow,
}

#[derive(Debug, Clone)]
pub struct CrowdSignal {
    pub stance: CrowdStance,
    pub min_payout: f64,
    pub fee_factor: f64,
    pub require_trend_agreement: bool,
}

impl CrowdSignal {
    pub fn new(stance: CrowdStance, min_payout: f64, fee_factor: f64) -> Self {
        assert!(
            min_payout >= 0.0 && min_payout.is_finite(),
            "min_payout must be non-negative and finite"
        );
        assert!(
            fee_factor > 0.0 && fee_factor <= 1.0,
            "fee_factor must be in (0, 1]"
        );
        Self {
            stance,
            min_payout,
            fee_factor,
            require_trend_agreement: true,
        }
    }

    pub fn contrarian(min_payout: f64, fee_factor: f64) -> Self {
        Self::new(CrowdStance::Contrarian, min_payout, fee_factor)
    }

    pub fn follow(min_payout: f64, fee_factor: f64) -> Self {
        Self::new(CrowdStance::Follow, min_payout, fee_factor)
    }

    pub fn with_trend_agreement(mut self, required: bool) -> Self {
        self.require_trend_agreement = required;
        self
    }
}

impl SignalGenerator for CrowdSignal {
    fn name(&self) -> &str {
        match self.stance {
            CrowdStance::Contrarian => "crowd_contrarian",
            CrowdStance::Follow => "crowd_follow",
        }
    }

    fn lookback(&self) -> usize {
        0
    }

    fn generate(&self, round: &RoundView<'_>, _history: &History<'_>) -> Option<SignalDecision> {
        // Balanced pools have no crowd to lean against.
        let minority = round.minority_side()?;
        let side = match self.stance {
            CrowdStance::Contrarian => minority,
            CrowdStance::Follow => minority.opposite(),
        };

        if self.require_trend_agreement && round.trend_signal()?.side()? != side {
            return None;
        }

        let strength = round.trend_gap_percent().map(f64::abs).unwrap_or(0.0);
        let decision = priced(round, side, strength, self.fee_factor)?;
        match decision.implied_payout {
            Some(payout) if payout >= self.min_payout => Some(decision),
            _ => None,
        }
    }
}

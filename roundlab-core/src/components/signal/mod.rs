//! Signal generation — maps a round and its history to a directional call.
//!
//! Signals are bankroll-agnostic: they receive the pre-lock view of the current
//! round and the strictly-earlier history window, never ledger or breaker state.
//! Strength is consumed by position sizing only.

pub mod confluence;
pub mod crowd;
pub mod mean_reversion;
pub mod momentum;
pub mod trend_follow;

use serde::{Deserialize, Serialize};

use crate::domain::Side;

use super::history::{History, RoundView};

/// A directional call for one round.
///
/// "No trade" is expressed by the generator returning `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalDecision {
    pub direction: Side,
    /// Indicator magnitude (e.g. |EMA gap %|, band distance). Units are
    /// generator-specific; the sizing threshold is configured to match.
    pub strength: f64,
    /// Decision-time payout `(total * fee_factor) / pool[direction]`, if priced.
    pub implied_payout: Option<f64>,
}

/// Trait for signal generators.
///
/// # Architecture invariant
/// `generate` receives a [`RoundView`] (no settlement fields) and a [`History`]
/// holding only rounds before the current one. Implementations must return
/// `None` when the history is shorter than [`SignalGenerator::lookback`] or the
/// chosen side cannot be priced.
pub trait SignalGenerator: Send + Sync {
    /// Human-readable name (e.g., "crowd_contrarian").
    fn name(&self) -> &str;

    /// Number of earlier rounds this generator needs.
    fn lookback(&self) -> usize;

    fn generate(&self, round: &RoundView<'_>, history: &History<'_>) -> Option<SignalDecision>;
}

/// Null signal — never trades. Used as a stub in tests.
pub struct NullSignal;

impl SignalGenerator for NullSignal {
    fn name(&self) -> &str {
        "null"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn generate(&self, _round: &RoundView<'_>, _history: &History<'_>) -> Option<SignalDecision> {
        None
    }
}

/// Price `side` on the current round, returning a decision only if the pool
/// on that side is non-empty.
pub(crate) fn priced(
    round: &RoundView<'_>,
    side: Side,
    strength: f64,
    fee_factor: f64,
) -> Option<SignalDecision> {
    let payout = round.implied_payout(side, fee_factor)?;
    Some(SignalDecision {
        direction: side,
        strength,
        implied_payout: Some(payout),
    })
}

pub use confluence::Confluence;
pub use crowd::{CrowdSignal, CrowdStance};
pub use mean_reversion::MeanReversion;
pub use momentum::Momentum;
pub use trend_follow::TrendFollow;

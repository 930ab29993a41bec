//! TradeOutcome — one settled wager in the trade log.

use super::round::Side;
use serde::{Deserialize, Serialize};

/// An executed and settled wager.
///
/// `payout_multiple` is the settlement multiple recorded on the round (already
/// net of fee); `implied_payout` is what the signal priced at decision time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub epoch: u64,
    pub lock_timestamp: i64,
    pub direction: Side,
    pub bet_amount: f64,
    pub won: bool,
    pub payout_multiple: f64,
    pub profit_or_loss: f64,
    pub balance_after: f64,
    pub is_cooldown_trade: bool,
    pub strength: f64,
    pub implied_payout: Option<f64>,
}

impl TradeOutcome {
    /// Profit relative to the stake.
    pub fn return_on_bet(&self) -> f64 {
        if self.bet_amount <= 0.0 {
            return 0.0;
        }
        self.profit_or_loss / self.bet_amount
    }
}

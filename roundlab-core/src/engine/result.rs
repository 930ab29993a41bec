//! Run result types. Built once at the end of a run, never mutated after.

use serde::{Deserialize, Serialize};

use crate::domain::{DataGap, TradeOutcome};

/// Why the driver stopped consuming records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every record was processed.
    Exhausted,
    /// The balance reached zero.
    Busted,
    /// The balance reached `bankroll_ceiling` with `halt_at_ceiling` set.
    CeilingReached,
}

/// Rounds that were valid but not traded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCounts {
    /// The active generator returned no decision.
    pub no_signal: usize,
    /// Cooldown under the skip policy.
    pub cooldown: usize,
    /// Sized bet was `<= 0` or exceeded the balance.
    pub bet_rejected: usize,
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.no_signal + self.cooldown + self.bet_rejected
    }
}

/// Records that could not be traded, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataGapCounts {
    pub missing_field: usize,
    pub empty_pool: usize,
    pub unknown_winner: usize,
    pub out_of_order: usize,
}

impl DataGapCounts {
    pub fn record(&mut self, gap: DataGap) {
        match gap {
            DataGap::MissingField => self.missing_field += 1,
            DataGap::EmptyPool => self.empty_pool += 1,
            DataGap::UnknownWinner => self.unknown_winner += 1,
            DataGap::OutOfOrder => self.out_of_order += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.missing_field + self.empty_pool + self.unknown_winner + self.out_of_order
    }
}

/// Trade statistics for one breaker phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseStats {
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub net_profit: f64,
}

/// Result of a complete backtest run.
///
/// `total_trades + skipped.total() + data_gaps.total() == total_rounds`, where
/// `total_rounds` counts records consumed before the run stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub total_rounds: usize,
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub starting_balance: f64,
    pub final_balance: f64,
    pub peak_balance: f64,
    /// `(final_balance - starting_balance) / starting_balance`, a fraction.
    pub roi: f64,
    pub max_drawdown_percent: f64,
    pub longest_win_streak: usize,
    pub longest_loss_streak: usize,
    pub skipped: SkipCounts,
    pub data_gaps: DataGapCounts,
    pub busted: bool,
    pub stop_reason: StopReason,
    pub cooldown_activations: usize,
    pub normal: PhaseStats,
    pub cooldown: PhaseStats,
    pub trades: Vec<TradeOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gap_counts_by_reason() {
        let mut gaps = DataGapCounts::default();
        gaps.record(DataGap::EmptyPool);
        gaps.record(DataGap::EmptyPool);
        gaps.record(DataGap::OutOfOrder);
        assert_eq!(gaps.empty_pool, 2);
        assert_eq!(gaps.out_of_order, 1);
        assert_eq!(gaps.total(), 3);
    }

    #[test]
    fn stop_reason_serializes_snake_case() {
        let json = serde_json::to_string(&StopReason::CeilingReached).unwrap();
        assert_eq!(json, "\"ceiling_reached\"");
    }
}

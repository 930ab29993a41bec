//! Mutable state threaded through every step of a run.

use crate::domain::{DataGap, RoundRecord, TradeOutcome};

use super::breaker::CircuitBreaker;
use super::config::EngineConfig;
use super::ledger::BankrollLedger;
use super::metrics;
use super::result::{BacktestResult, DataGapCounts, SkipCounts, StopReason};

/// Rejects records that go backwards in epoch or lock time.
///
/// Compares against the last in-order record, valid or not. An out-of-order
/// record also cuts the history window, so no later round can see it.
#[derive(Debug, Clone, Default)]
pub struct SequenceGuard {
    last_epoch: Option<u64>,
    last_lock: Option<i64>,
    history_floor: usize,
}

impl SequenceGuard {
    pub fn check(&mut self, index: usize, record: &RoundRecord) -> Result<(), DataGap> {
        let epoch_back = self.last_epoch.is_some_and(|e| record.epoch <= e);
        let time_back = match (self.last_lock, record.lock_timestamp) {
            (Some(prev), Some(ts)) => ts < prev,
            _ => false,
        };
        if epoch_back || time_back {
            self.history_floor = index + 1;
            return Err(DataGap::OutOfOrder);
        }
        self.last_epoch = Some(record.epoch);
        if record.lock_timestamp.is_some() {
            self.last_lock = record.lock_timestamp;
        }
        Ok(())
    }

    /// First index a history window ending at `index` may include.
    pub fn history_start(&self, index: usize, lookback: usize) -> usize {
        index.saturating_sub(lookback).max(self.history_floor).min(index)
    }
}

/// Mutable state that evolves round-by-round during the driver loop.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub ledger: BankrollLedger,
    pub breaker: CircuitBreaker,
    pub sequence: SequenceGuard,
    pub rounds_processed: usize,
    pub skipped: SkipCounts,
    pub data_gaps: DataGapCounts,
    pub trades: Vec<TradeOutcome>,
}

impl SimulationState {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            ledger: BankrollLedger::new(config.starting_balance, config.outcome_window),
            breaker: CircuitBreaker::from_config(config),
            sequence: SequenceGuard::default(),
            rounds_processed: 0,
            skipped: SkipCounts::default(),
            data_gaps: DataGapCounts::default(),
            trades: Vec::new(),
        }
    }

    /// Assemble the immutable result.
    pub fn into_result(self, starting_balance: f64, stop_reason: StopReason) -> BacktestResult {
        let bankroll = self.ledger.state();
        let wins = self.trades.iter().filter(|t| t.won).count();
        let total_trades = self.trades.len();
        BacktestResult {
            total_rounds: self.rounds_processed,
            total_trades,
            wins,
            losses: total_trades - wins,
            win_rate: metrics::win_rate(wins, total_trades),
            starting_balance,
            final_balance: bankroll.balance,
            peak_balance: bankroll.peak,
            roi: metrics::roi(starting_balance, bankroll.balance),
            max_drawdown_percent: bankroll.max_drawdown_percent,
            longest_win_streak: metrics::longest_win_streak(&self.trades),
            longest_loss_streak: metrics::longest_loss_streak(&self.trades),
            skipped: self.skipped,
            data_gaps: self.data_gaps,
            busted: self.ledger.is_busted(),
            stop_reason,
            cooldown_activations: self.breaker.activations(),
            normal: metrics::phase_stats(&self.trades, false),
            cooldown: metrics::phase_stats(&self.trades, true),
            trades: self.trades,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::signal::test_support::round_with_close;

    #[test]
    fn guard_rejects_repeated_or_earlier_epochs() {
        let mut g = SequenceGuard::default();
        assert!(g.check(0, &round_with_close(5, 1.0)).is_ok());
        assert_eq!(g.check(1, &round_with_close(5, 1.0)), Err(DataGap::OutOfOrder));
        assert_eq!(g.check(2, &round_with_close(3, 1.0)), Err(DataGap::OutOfOrder));
        assert!(g.check(3, &round_with_close(6, 1.0)).is_ok());
    }

    #[test]
    fn guard_rejects_earlier_lock_time() {
        let mut g = SequenceGuard::default();
        assert!(g.check(0, &round_with_close(1, 1.0)).is_ok());
        let mut r = round_with_close(2, 1.0);
        r.lock_timestamp = Some(0);
        assert_eq!(g.check(1, &r), Err(DataGap::OutOfOrder));
    }

    #[test]
    fn out_of_order_cuts_history() {
        let mut g = SequenceGuard::default();
        g.check(0, &round_with_close(1, 1.0)).unwrap();
        g.check(1, &round_with_close(9, 1.0)).unwrap();
        assert!(g.check(2, &round_with_close(4, 1.0)).is_err());
        assert_eq!(g.history_start(5, 10), 3);
        assert_eq!(g.history_start(20, 10), 10);
    }

    #[test]
    fn empty_run_result() {
        let config = EngineConfig::default();
        let r = SimulationState::new(&config).into_result(1.0, StopReason::Exhausted);
        assert_eq!(r.total_rounds, 0);
        assert_eq!(r.final_balance, 1.0);
        assert_eq!(r.roi, 0.0);
        assert!(!r.busted);
    }
}

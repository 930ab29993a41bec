//! Round-by-round driver — the heart of the backtesting engine.
//!
//! Per record, in order:
//! 0. Ordering guard and field validation (data gap → counted, continue)
//! 1. Advance the circuit breaker to this round's lock time
//! 2. Pick the phase's generator and ask it for a decision
//! 3. No decision → skipped
//! 4. Size the wager
//! 5. Bet `<= 0` or above the balance → skipped
//! 6. Resolve against the recorded winner
//! 7. Settle through the ledger and append to the trade log
//! 8. Feed the breaker (normal-phase trades only)
//! 9. Bust or ceiling → stop

use tracing::{debug, info};

use crate::components::history::{History, RoundView};
use crate::components::signal::SignalGenerator;
use crate::components::sizing::SizingPolicy;
use crate::domain::{DataGap, RoundRecord};

use super::breaker::Phase;
use super::config::{ConfigError, CooldownPolicy, EngineConfig};
use super::ledger::Wager;
use super::result::{BacktestResult, StopReason};
use super::state::SimulationState;

/// Why a valid round was not traded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoSignal,
    Cooldown,
    BetRejected,
}

/// What one step of the driver did with its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Traded { won: bool, phase: Phase },
    Skipped(SkipReason),
    DataGap(DataGap),
    /// A trade took the balance to zero.
    Busted,
    /// A trade took the balance to the ceiling with `halt_at_ceiling` set.
    CeilingReached,
}

impl StepOutcome {
    /// Terminal outcomes end the run.
    pub fn stop_reason(self) -> Option<StopReason> {
        match self {
            StepOutcome::Busted => Some(StopReason::Busted),
            StepOutcome::CeilingReached => Some(StopReason::CeilingReached),
            _ => None,
        }
    }
}

/// A configured strategy ready to replay round records.
///
/// Holds no per-run state, so one instance can run many datasets and is
/// shareable across threads.
pub struct Backtester {
    config: EngineConfig,
    sizing: SizingPolicy,
    primary: Box<dyn SignalGenerator>,
    fallback: Option<Box<dyn SignalGenerator>>,
}

impl std::fmt::Debug for Backtester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backtester")
            .field("config", &self.config)
            .field("primary", &self.primary.name())
            .field("fallback", &self.fallback.as_ref().map(|g| g.name()))
            .finish()
    }
}

impl Backtester {
    /// Validate `config` and bind the generators. Fails before any simulation work.
    pub fn new(
        config: EngineConfig,
        primary: Box<dyn SignalGenerator>,
        fallback: Option<Box<dyn SignalGenerator>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if config.cooldown_policy == CooldownPolicy::Fallback && fallback.is_none() {
            return Err(ConfigError::MissingFallback);
        }
        Ok(Self {
            sizing: SizingPolicy::from_config(&config),
            config,
            primary,
            fallback,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn initial_state(&self) -> SimulationState {
        SimulationState::new(&self.config)
    }

    /// Replay `records` in order and return the aggregate result.
    pub fn run(&self, records: &[RoundRecord]) -> BacktestResult {
        let mut state = self.initial_state();
        let stop_reason = (0..records.len())
            .find_map(|index| self.step(&mut state, records, index)?.stop_reason())
            .unwrap_or(StopReason::Exhausted);

        let result = state.into_result(self.config.starting_balance, stop_reason);
        info!(
            signal = self.primary.name(),
            rounds = result.total_rounds,
            trades = result.total_trades,
            final_balance = result.final_balance,
            stop_reason = ?result.stop_reason,
            "backtest complete"
        );
        result
    }

    /// Process `records[index]` against `state`.
    ///
    /// `None`, with `state` untouched, when `index` is past the end of `records`.
    pub fn step(
        &self,
        state: &mut SimulationState,
        records: &[RoundRecord],
        index: usize,
    ) -> Option<StepOutcome> {
        let record = records.get(index)?;
        Some(self.step_record(state, records, index, record))
    }

    fn step_record(
        &self,
        state: &mut SimulationState,
        records: &[RoundRecord],
        index: usize,
        record: &RoundRecord,
    ) -> StepOutcome {
        state.rounds_processed += 1;

        // ─── 0: data gaps ───
        let checked = state
            .sequence
            .check(index, record)
            .and_then(|()| record.validate());
        if let Err(gap) = checked {
            return data_gap(state, record, gap);
        }
        let (Some(lock_ts), Some(winner), Some(payout_multiple)) = (
            record.lock_timestamp,
            record.winner.side(),
            record.winner_payout_multiple,
        ) else {
            return data_gap(state, record, DataGap::MissingField);
        };

        // ─── 1-3: phase and decision ───
        let phase = state.breaker.advance(lock_ts);
        let generator = match (phase, self.config.cooldown_policy) {
            (Phase::Normal, _) => Some(self.primary.as_ref()),
            (Phase::Cooldown, CooldownPolicy::Fallback) => self.fallback.as_deref(),
            (Phase::Cooldown, CooldownPolicy::Skip) => None,
        };
        let Some(generator) = generator else {
            state.skipped.cooldown += 1;
            return StepOutcome::Skipped(SkipReason::Cooldown);
        };

        let start = state.sequence.history_start(index, generator.lookback());
        let history = History::new(&records[start..index]);
        let Some(decision) = generator.generate(&RoundView::new(record), &history) else {
            state.skipped.no_signal += 1;
            return StepOutcome::Skipped(SkipReason::NoSignal);
        };

        // ─── 4-5: sizing ───
        let bet = self.sizing.size(state.ledger.state(), &decision, phase);
        let balance = state.ledger.balance();
        if !(bet > 0.0 && bet <= balance) {
            debug!(epoch = record.epoch, bet, balance, "bet rejected");
            state.skipped.bet_rejected += 1;
            return StepOutcome::Skipped(SkipReason::BetRejected);
        }

        // ─── 6-8: settle ───
        let won = winner == decision.direction;
        let wager = Wager {
            epoch: record.epoch,
            lock_timestamp: lock_ts,
            direction: decision.direction,
            amount: bet,
            strength: decision.strength,
            implied_payout: decision.implied_payout,
            is_cooldown_trade: phase == Phase::Cooldown,
        };
        let outcome = state.ledger.apply(wager, won, payout_multiple);
        state.trades.push(outcome);
        if phase == Phase::Normal {
            state.breaker.record(won, lock_ts);
        }

        // ─── 9: terminal checks ───
        if state.ledger.is_busted() {
            info!(epoch = record.epoch, trades = state.trades.len(), "bankroll busted");
            return StepOutcome::Busted;
        }
        if let (true, Some(ceiling)) = (self.config.halt_at_ceiling, self.config.bankroll_ceiling) {
            if state.ledger.balance() >= ceiling {
                info!(epoch = record.epoch, ceiling, "bankroll ceiling reached");
                return StepOutcome::CeilingReached;
            }
        }
        StepOutcome::Traded { won, phase }
    }
}

fn data_gap(state: &mut SimulationState, record: &RoundRecord, gap: DataGap) -> StepOutcome {
    debug!(epoch = record.epoch, ?gap, "data gap");
    state.data_gaps.record(gap);
    StepOutcome::DataGap(gap)
}

//! Position sizing — fraction of bankroll to wager on a decided round.
//!
//! bet = min(balance, ceiling) * base_fraction * momentum * recovery * cooldown
//!
//! - momentum: outside cooldown only, when `strength > momentum_strength_threshold`
//! - recovery: when the last two recorded outcomes were both losses
//! - cooldown: on cooldown-phase trades only
//!
//! The recovery multiplier is a tunable policy for faster drawdown recovery,
//! not a validated edge. Any multiplier set to `1.0` is effectively disabled.
//!
//! The sizer never clips against the balance; the driver rejects bets larger
//! than the balance instead.

use crate::components::signal::SignalDecision;
use crate::engine::breaker::Phase;
use crate::engine::config::EngineConfig;
use crate::engine::ledger::BankrollState;

#[derive(Debug, Clone, PartialEq)]
pub struct SizingPolicy {
    pub base_position_fraction: f64,
    pub momentum_multiplier: f64,
    pub momentum_strength_threshold: f64,
    pub recovery_multiplier: f64,
    pub cooldown_multiplier: f64,
    pub bankroll_ceiling: Option<f64>,
}

impl SizingPolicy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            base_position_fraction: config.base_position_fraction,
            momentum_multiplier: config.momentum_multiplier,
            momentum_strength_threshold: config.momentum_strength_threshold,
            recovery_multiplier: config.recovery_multiplier,
            cooldown_multiplier: config.cooldown_multiplier,
            bankroll_ceiling: config.bankroll_ceiling,
        }
    }

    /// Bankroll the base fraction applies to.
    pub fn effective_bankroll(&self, balance: f64) -> f64 {
        match self.bankroll_ceiling {
            Some(ceiling) => balance.min(ceiling),
            None => balance,
        }
    }

    /// Combined multiplier for this decision and phase.
    pub fn multiplier(&self, bankroll: &BankrollState, signal: &SignalDecision, phase: Phase) -> f64 {
        let mut m = 1.0;
        if phase == Phase::Normal && signal.strength > self.momentum_strength_threshold {
            m *= self.momentum_multiplier;
        }
        if bankroll.recent_outcomes.last_n_all_losses(2) {
            m *= self.recovery_multiplier;
        }
        if phase == Phase::Cooldown {
            m *= self.cooldown_multiplier;
        }
        m
    }

    pub fn size(&self, bankroll: &BankrollState, signal: &SignalDecision, phase: Phase) -> f64 {
        self.effective_bankroll(bankroll.balance)
            * self.base_position_fraction
            * self.multiplier(bankroll, signal, phase)
    }
}

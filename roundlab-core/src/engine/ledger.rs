//! Bankroll ledger — the only writer of the balance.
//!
//! Win: `balance += bet * (payout - 1)`. Loss: `balance -= bet`. After each
//! trade the peak and max drawdown are updated. A balance at or below zero is
//! clamped to zero and the ledger is marked busted; no further trades apply.

use std::collections::VecDeque;

use crate::domain::{Side, TradeOutcome};

/// Fixed-capacity FIFO of recent normal-phase outcomes (`true` = win).
///
/// Push-then-evict: the newest outcome is always retained.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeWindow {
    outcomes: VecDeque<bool>,
    capacity: usize,
}

impl OutcomeWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "outcome window capacity must be >= 2");
        Self {
            outcomes: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, won: bool) {
        self.outcomes.push_back(won);
        if self.outcomes.len() > self.capacity {
            self.outcomes.pop_front();
        }
    }

    /// Whether the newest `n` outcomes exist and are all losses.
    pub fn last_n_all_losses(&self, n: usize) -> bool {
        self.outcomes.len() >= n && self.outcomes.iter().rev().take(n).all(|&won| !won)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.outcomes.iter().copied()
    }
}

/// Bankroll snapshot visible to position sizing.
#[derive(Debug, Clone, PartialEq)]
pub struct BankrollState {
    pub balance: f64,
    pub peak: f64,
    pub max_drawdown_percent: f64,
    pub recent_outcomes: OutcomeWindow,
}

impl BankrollState {
    pub fn new(starting_balance: f64, outcome_window: usize) -> Self {
        Self {
            balance: starting_balance,
            peak: starting_balance,
            max_drawdown_percent: 0.0,
            recent_outcomes: OutcomeWindow::new(outcome_window),
        }
    }
}

/// A sized wager about to be settled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wager {
    pub epoch: u64,
    pub lock_timestamp: i64,
    pub direction: Side,
    pub amount: f64,
    pub strength: f64,
    pub implied_payout: Option<f64>,
    pub is_cooldown_trade: bool,
}

#[derive(Debug, Clone)]
pub struct BankrollLedger {
    state: BankrollState,
    busted: bool,
}

impl BankrollLedger {
    pub fn new(starting_balance: f64, outcome_window: usize) -> Self {
        Self {
            state: BankrollState::new(starting_balance, outcome_window),
            busted: false,
        }
    }

    pub fn state(&self) -> &BankrollState {
        &self.state
    }

    pub fn balance(&self) -> f64 {
        self.state.balance
    }

    pub fn is_busted(&self) -> bool {
        self.busted
    }

    /// Settle `wager` and return the trade log entry.
    ///
    /// Cooldown trades move the balance but do not enter `recent_outcomes`.
    pub fn apply(&mut self, wager: Wager, won: bool, payout_multiple: f64) -> TradeOutcome {
        debug_assert!(!self.busted, "wager applied after bust");
        let before = self.state.balance;
        let delta = if won {
            wager.amount * (payout_multiple - 1.0)
        } else {
            -wager.amount
        };

        let mut after = before + delta;
        if after <= 0.0 {
            after = 0.0;
            self.busted = true;
        }
        self.state.balance = after;

        let s = &mut self.state;
        s.peak = s.peak.max(after);
        if s.peak > 0.0 {
            let drawdown = (s.peak - after) / s.peak * 100.0;
            s.max_drawdown_percent = s.max_drawdown_percent.max(drawdown);
        }
        if !wager.is_cooldown_trade {
            s.recent_outcomes.push(won);
        }

        TradeOutcome {
            epoch: wager.epoch,
            lock_timestamp: wager.lock_timestamp,
            direction: wager.direction,
            bet_amount: wager.amount,
            won,
            payout_multiple,
            profit_or_loss: after - before,
            balance_after: after,
            is_cooldown_trade: wager.is_cooldown_trade,
            strength: wager.strength,
            implied_payout: wager.implied_payout,
        }
    }
}

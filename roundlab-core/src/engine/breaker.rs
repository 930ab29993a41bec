//! Circuit breaker — timed cooldown after a losing streak.
//!
//! Two phases, starting in `Normal`:
//!
//! - `Normal → Cooldown` once `consecutive_losses >= loss_threshold`; the
//!   cooldown runs until `lock_timestamp + cooldown_duration` of the round that
//!   tripped it, and the loss counter resets.
//! - `Cooldown → Normal` on the first round whose lock timestamp reaches
//!   `cooldown_until`. Checked once per round, before signal generation.
//!
//! Time comes from round timestamps only, never the wall clock, so replays
//! are deterministic. Only normal-phase trades are recorded here.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::EngineConfig;

/// Trading phase of the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Normal,
    Cooldown,
}

/// Breaker-owned state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownState {
    pub active: bool,
    /// Unix seconds; `Some` only while `active`.
    pub cooldown_until: Option<i64>,
    pub consecutive_losses: u32,
}

#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    state: CooldownState,
    loss_threshold: u32,
    cooldown_seconds: i64,
    activations: usize,
}

impl CircuitBreaker {
    pub fn new(loss_threshold: u32, cooldown_seconds: i64) -> Self {
        assert!(loss_threshold >= 1, "loss_threshold must be >= 1");
        assert!(cooldown_seconds >= 0, "cooldown_seconds must be >= 0");
        Self {
            state: CooldownState::default(),
            loss_threshold,
            cooldown_seconds,
            activations: 0,
        }
    }

    /// Build from a validated config.
    pub fn from_config(config: &EngineConfig) -> Self {
        let threshold = u32::try_from(config.loss_threshold.max(1)).unwrap_or(u32::MAX);
        Self::new(threshold, config.cooldown_duration_seconds.max(0))
    }

    pub fn phase(&self) -> Phase {
        if self.state.active {
            Phase::Cooldown
        } else {
            Phase::Normal
        }
    }

    pub fn state(&self) -> &CooldownState {
        &self.state
    }

    /// Number of `Normal → Cooldown` transitions so far.
    pub fn activations(&self) -> usize {
        self.activations
    }

    /// Expire the cooldown if `lock_timestamp` has reached its end. Returns the
    /// phase the current round trades in.
    pub fn advance(&mut self, lock_timestamp: i64) -> Phase {
        if let Some(until) = self.state.cooldown_until {
            if self.state.active && lock_timestamp >= until {
                self.state.active = false;
                self.state.cooldown_until = None;
                debug!(lock_timestamp, until, "cooldown expired");
            }
        }
        self.phase()
    }

    /// Record a settled normal-phase trade. Returns `true` if this trade
    /// tripped the breaker.
    ///
    /// Ignored while a cooldown is active.
    pub fn record(&mut self, won: bool, lock_timestamp: i64) -> bool {
        if self.state.active {
            return false;
        }
        if won {
            self.state.consecutive_losses = 0;
            return false;
        }
        self.state.consecutive_losses += 1;
        if self.state.consecutive_losses < self.loss_threshold {
            return false;
        }

        let until = lock_timestamp.saturating_add(self.cooldown_seconds);
        self.state = CooldownState {
            active: true,
            cooldown_until: Some(until),
            consecutive_losses: 0,
        };
        self.activations += 1;
        debug!(
            lock_timestamp,
            until,
            activations = self.activations,
            "cooldown activated"
        );
        true
    }
}

//! Engine configuration — immutable for the lifetime of a run.

use serde::{Deserialize, Serialize};

/// What happens to rounds that fall inside an active cooldown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownPolicy {
    /// Suspend betting; cooldown rounds count as skipped.
    #[default]
    Skip,
    /// Replace the primary signal with the fallback generator.
    Fallback,
}

/// Configuration for a single backtest run.
///
/// `min_payout_threshold` and `fee_factor` are pricing defaults handed to the
/// signal factory; generators that set their own values ignore them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub base_position_fraction: f64,
    pub momentum_multiplier: f64,
    pub momentum_strength_threshold: f64,
    pub recovery_multiplier: f64,
    pub cooldown_multiplier: f64,
    pub min_payout_threshold: f64,
    pub loss_threshold: i64,
    pub cooldown_duration_seconds: i64,
    pub cooldown_policy: CooldownPolicy,
    pub bankroll_ceiling: Option<f64>,
    /// Stop the run once the balance reaches `bankroll_ceiling`.
    pub halt_at_ceiling: bool,
    pub starting_balance: f64,
    pub fee_factor: f64,
    /// Capacity of the recent-outcomes FIFO.
    pub outcome_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_position_fraction: 0.045,
            momentum_multiplier: 1.0,
            momentum_strength_threshold: 0.0,
            recovery_multiplier: 1.0,
            cooldown_multiplier: 1.0,
            min_payout_threshold: 1.45,
            loss_threshold: 3,
            cooldown_duration_seconds: 2700,
            cooldown_policy: CooldownPolicy::Skip,
            bankroll_ceiling: None,
            halt_at_ceiling: false,
            starting_balance: 1.0,
            fee_factor: 0.97,
            outcome_window: 10,
        }
    }
}

/// Startup configuration failures. No simulation work happens after one of these.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },
    #[error("loss_threshold must be >= 1, got {0}")]
    InvalidLossThreshold(i64),
    #[error("cooldown_duration_seconds must be >= 0, got {0}")]
    NegativeCooldown(i64),
    #[error("outcome_window must be >= 2, got {0}")]
    OutcomeWindowTooSmall(usize),
    #[error("halt_at_ceiling requires bankroll_ceiling")]
    HaltWithoutCeiling,
    #[error("cooldown_policy = fallback requires a fallback signal")]
    MissingFallback,
}

fn check(
    field: &'static str,
    value: f64,
    expected: &'static str,
    ok: impl Fn(f64) -> bool,
) -> Result<(), ConfigError> {
    if value.is_finite() && ok(value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            expected,
            value,
        })
    }
}

impl EngineConfig {
    /// Reject configurations the engine cannot run.
    ///
    /// The fallback-generator requirement is checked by the driver, which is
    /// the only place that knows whether one was supplied.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check(
            "base_position_fraction",
            self.base_position_fraction,
            "in (0, 1]",
            |v| v > 0.0 && v <= 1.0,
        )?;
        for (field, value) in [
            ("momentum_multiplier", self.momentum_multiplier),
            ("recovery_multiplier", self.recovery_multiplier),
            ("cooldown_multiplier", self.cooldown_multiplier),
        ] {
            check(field, value, "> 0", |v| v > 0.0)?;
        }
        check(
            "momentum_strength_threshold",
            self.momentum_strength_threshold,
            ">= 0",
            |v| v >= 0.0,
        )?;
        check(
            "min_payout_threshold",
            self.min_payout_threshold,
            ">= 0",
            |v| v >= 0.0,
        )?;
        check("fee_factor", self.fee_factor, "in (0, 1]", |v| {
            v > 0.0 && v <= 1.0
        })?;
        check("starting_balance", self.starting_balance, "> 0", |v| v > 0.0)?;
        if let Some(ceiling) = self.bankroll_ceiling {
            check("bankroll_ceiling", ceiling, "> 0", |v| v > 0.0)?;
        } else if self.halt_at_ceiling {
            return Err(ConfigError::HaltWithoutCeiling);
        }
        if self.loss_threshold <= 0 {
            return Err(ConfigError::InvalidLossThreshold(self.loss_threshold));
        }
        if self.cooldown_duration_seconds < 0 {
            return Err(ConfigError::NegativeCooldown(self.cooldown_duration_seconds));
        }
        if self.outcome_window < 2 {
            return Err(ConfigError::OutcomeWindowTooSmall(self.outcome_window));
        }
        Ok(())
    }
}

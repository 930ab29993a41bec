//! Factory system — converts `ComponentConfig` into signal generator trait objects.
//!
//! Parameters are validated here and reported as `FactoryError`, so the
//! asserting constructors of the concrete generators are never reached with
//! bad input from a configuration file.

use crate::engine::config::EngineConfig;
use crate::fingerprint::ComponentConfig;

use super::signal::{
    Confluence, CrowdSignal, CrowdStance, MeanReversion, Momentum, SignalGenerator, TrendFollow,
};

// ─── Error type ──────────────────────────────────────────────────────

/// Errors that can occur during component construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FactoryError {
    #[error("Unknown signal type: {0}")]
    UnknownSignal(String),
    #[error("{component}: unknown parameter `{param}`")]
    UnknownParam { component: String, param: String },
    #[error("{component}: `{param}` {reason}, got {value}")]
    InvalidParam {
        component: String,
        param: &'static str,
        reason: &'static str,
        value: f64,
    },
    #[error("{0}: needs at least one member")]
    MissingMembers(String),
    #[error("{0}: members are only allowed on confluence")]
    UnexpectedMembers(String),
}

// ─── Defaults ────────────────────────────────────────────────────────

/// Engine-level pricing defaults injected into generators that price rounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingDefaults {
    pub fee_factor: f64,
    pub min_payout: f64,
}

impl Default for PricingDefaults {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for PricingDefaults {
    fn from(config: &EngineConfig) -> Self {
        Self {
            fee_factor: config.fee_factor,
            min_payout: config.min_payout_threshold,
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────

/// Extract a named f64 parameter from a `ComponentConfig`, falling back to `default`.
fn param(config: &ComponentConfig, name: &str, default: f64) -> f64 {
    config.params.get(name).copied().unwrap_or(default)
}

fn invalid(config: &ComponentConfig, param: &'static str, reason: &'static str, value: f64) -> FactoryError {
    FactoryError::InvalidParam {
        component: config.component_type.clone(),
        param,
        reason,
        value,
    }
}

/// f64 parameter that must satisfy `ok` and be finite.
fn checked(
    config: &ComponentConfig,
    name: &'static str,
    default: f64,
    reason: &'static str,
    ok: impl Fn(f64) -> bool,
) -> Result<f64, FactoryError> {
    let value = param(config, name, default);
    if value.is_finite() && ok(value) {
        Ok(value)
    } else {
        Err(invalid(config, name, reason, value))
    }
}

/// Largest window or count a whole-number parameter may take.
pub const MAX_WHOLE_PARAM: usize = 1_000_000;

/// Whole-number parameter in `min..=MAX_WHOLE_PARAM`.
fn param_usize(
    config: &ComponentConfig,
    name: &'static str,
    default: usize,
    min: usize,
) -> Result<usize, FactoryError> {
    let value = param(config, name, default as f64);
    if !value.is_finite() || value.fract() != 0.0 || value < min as f64 {
        let reason = if min == 0 {
            "must be a non-negative integer"
        } else {
            "must be an integer above its minimum"
        };
        return Err(invalid(config, name, reason, value));
    }
    if value > MAX_WHOLE_PARAM as f64 {
        return Err(invalid(config, name, "exceeds the largest supported window", value));
    }
    Ok(value as usize)
}

fn flag(config: &ComponentConfig, name: &'static str, default: bool) -> Result<bool, FactoryError> {
    let value = param(config, name, if default { 1.0 } else { 0.0 });
    match value {
        v if v == 1.0 => Ok(true),
        v if v == 0.0 => Ok(false),
        v => Err(invalid(config, name, "must be 0 or 1", v)),
    }
}

fn fee_factor(config: &ComponentConfig, defaults: &PricingDefaults) -> Result<f64, FactoryError> {
    checked(config, "fee_factor", defaults.fee_factor, "must be in (0, 1]", |v| {
        v > 0.0 && v <= 1.0
    })
}

fn only_params(config: &ComponentConfig, allowed: &[&str]) -> Result<(), FactoryError> {
    match config.params.keys().find(|k| !allowed.contains(&k.as_str())) {
        Some(unknown) => Err(FactoryError::UnknownParam {
            component: config.component_type.clone(),
            param: unknown.clone(),
        }),
        None => Ok(()),
    }
}

// ─── Signal factory ──────────────────────────────────────────────────

/// Every signal type `create_signal` understands.
pub const SIGNAL_TYPES: &[&str] = &[
    "crowd_contrarian",
    "crowd_follow",
    "trend_follow",
    "mean_reversion",
    "momentum",
    "confluence",
];

/// Create a signal generator from a `ComponentConfig`.
pub fn create_signal(
    config: &ComponentConfig,
    defaults: &PricingDefaults,
) -> Result<Box<dyn SignalGenerator>, FactoryError> {
    let kind = config.component_type.as_str();
    if kind != "confluence" && !config.members.is_empty() {
        return Err(FactoryError::UnexpectedMembers(kind.to_string()));
    }

    match kind {
        "crowd_contrarian" | "crowd_follow" => {
            only_params(config, &["min_payout", "fee_factor", "require_trend"])?;
            let stance = if kind == "crowd_contrarian" {
                CrowdStance::Contrarian
            } else {
                CrowdStance::Follow
            };
            let min_payout = checked(config, "min_payout", defaults.min_payout, "must be >= 0", |v| {
                v >= 0.0
            })?;
            let fee = fee_factor(config, defaults)?;
            let require_trend = flag(config, "require_trend", true)?;
            Ok(Box::new(
                CrowdSignal::new(stance, min_payout, fee).with_trend_agreement(require_trend),
            ))
        }
        "trend_follow" => {
            only_params(config, &["min_gap_percent", "fee_factor"])?;
            let min_gap = checked(config, "min_gap_percent", 0.0, "must be >= 0", |v| v >= 0.0)?;
            Ok(Box::new(TrendFollow::new(min_gap, fee_factor(config, defaults)?)))
        }
        "mean_reversion" => {
            only_params(config, &["period", "std_multiplier", "proximity", "fee_factor"])?;
            let period = param_usize(config, "period", 20, 2)?;
            let std_multiplier =
                checked(config, "std_multiplier", 2.0, "must be > 0", |v| v > 0.0)?;
            let proximity = checked(config, "proximity", 0.0, "must be in [0, 1)", |v| {
                (0.0..1.0).contains(&v)
            })?;
            Ok(Box::new(MeanReversion::new(
                period,
                std_multiplier,
                proximity,
                fee_factor(config, defaults)?,
            )))
        }
        "momentum" => {
            only_params(
                config,
                &["fast_period", "slow_period", "window", "min_gap_percent", "fee_factor"],
            )?;
            let fast = param_usize(config, "fast_period", 5, 1)?;
            let slow = param_usize(config, "slow_period", 20, fast.saturating_add(1))?;
            let window = param_usize(config, "window", slow.saturating_mul(2), slow)?;
            let min_gap = checked(config, "min_gap_percent", 0.0, "must be >= 0", |v| v >= 0.0)?;
            Ok(Box::new(
                Momentum::new(fast, slow, min_gap, fee_factor(config, defaults)?).with_window(window),
            ))
        }
        "confluence" => {
            only_params(config, &["min_agree"])?;
            if config.members.is_empty() {
                return Err(FactoryError::MissingMembers(kind.to_string()));
            }
            let members = config
                .members
                .iter()
                .map(|m| create_signal(m, defaults))
                .collect::<Result<Vec<_>, _>>()?;
            let count = members.len();
            let min_agree = param_usize(config, "min_agree", count / 2 + 1, 1)?;
            if min_agree > count {
                return Err(invalid(
                    config,
                    "min_agree",
                    "exceeds the member count",
                    min_agree as f64,
                ));
            }
            Ok(Box::new(Confluence::new(members, min_agree)))
        }
        other => Err(FactoryError::UnknownSignal(other.to_string())),
    }
}

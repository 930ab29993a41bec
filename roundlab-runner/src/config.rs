//! Serializable run configuration loaded from TOML.

use roundlab_core::engine::EngineConfig;
use roundlab_core::fingerprint::{ComponentConfig, StrategyConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading or parsing a run configuration file.
#[derive(Debug, Error)]
pub enum RunnerConfigError {
    #[error("read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Everything needed to reproduce one backtest apart from the round data.
///
/// ```toml
/// [engine]
/// loss_threshold = 3
/// cooldown_policy = "fallback"
///
/// [signal]
/// type = "crowd_contrarian"
/// [signal.params]
/// min_payout = 1.45
///
/// [fallback]
/// type = "mean_reversion"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    pub signal: ComponentConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<ComponentConfig>,
}

impl BacktestConfig {
    pub fn new(engine: EngineConfig, signal: ComponentConfig) -> Self {
        Self {
            engine,
            signal,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: ComponentConfig) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RunnerConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| RunnerConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string.
    ///
    /// Only syntax and field names are checked here; parameter ranges are
    /// checked when the backtester is built.
    pub fn from_toml(content: &str) -> Result<Self, RunnerConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, RunnerConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The signal part of the configuration, as fingerprinted by the core.
    pub fn strategy(&self) -> StrategyConfig {
        StrategyConfig {
            signal: self.signal.clone(),
            fallback: self.fallback.clone(),
        }
    }
}

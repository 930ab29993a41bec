//! Backtest runner — wires configuration, signal factory and engine together.
//!
//! Two entry points:
//! - `run_backtest()`: takes pre-loaded records and their dataset hash. Used by sweeps.
//! - `run_from_files()`: loads config and rounds from disk, then runs. Used by the CLI.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use roundlab_core::components::{create_signal, FactoryError, PricingDefaults};
use roundlab_core::domain::{ConfigHash, DatasetHash, RoundRecord, RunId};
use roundlab_core::engine::{BacktestResult, Backtester, ConfigError};

use crate::config::{BacktestConfig, RunnerConfigError};
use crate::data_loader::{load_rounds_csv, LoadError};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("engine config error: {0}")]
    Config(#[from] ConfigError),
    #[error("config file error: {0}")]
    ConfigFile(#[from] RunnerConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("signal error: {0}")]
    Signal(#[from] FactoryError),
}

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Fingerprinted result of one backtest run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub config_hash: ConfigHash,
    /// Generator types only; groups sweep results that differ by parameters.
    pub structure_hash: ConfigHash,
    pub dataset_hash: DatasetHash,
    pub config: BacktestConfig,
    pub result: BacktestResult,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Validate the engine config and build primary and fallback generators.
///
/// Engine validation runs first so generator defaults never see an
/// out-of-range fee factor.
pub fn build_backtester(config: &BacktestConfig) -> Result<Backtester, RunError> {
    config.engine.validate()?;
    let defaults = PricingDefaults::from(&config.engine);
    let primary = create_signal(&config.signal, &defaults)?;
    let fallback = config
        .fallback
        .as_ref()
        .map(|c| create_signal(c, &defaults))
        .transpose()?;
    Ok(Backtester::new(config.engine.clone(), primary, fallback)?)
}

/// Run one backtest over pre-loaded records.
pub fn run_backtest(
    config: &BacktestConfig,
    records: &[RoundRecord],
    dataset_hash: &DatasetHash,
) -> Result<RunReport, RunError> {
    let backtester = build_backtester(config)?;
    let strategy = config.strategy();
    let config_hash = strategy.config_hash(&config.engine);
    let run_id = RunId::derive(&config_hash, dataset_hash);

    let result = backtester.run(records);
    info!(
        run = run_id.short(),
        signal = %strategy.signal.structure(),
        trades = result.total_trades,
        final_balance = result.final_balance,
        stop = ?result.stop_reason,
        "run finished"
    );

    Ok(RunReport {
        schema_version: SCHEMA_VERSION,
        run_id,
        config_hash,
        structure_hash: strategy.structure_hash(),
        dataset_hash: dataset_hash.clone(),
        config: config.clone(),
        result,
    })
}

/// Load a TOML config and a round CSV from disk, then run.
pub fn run_from_files(config_path: &Path, data_path: &Path) -> Result<RunReport, RunError> {
    let config = BacktestConfig::from_file(config_path)?;
    let loaded = load_rounds_csv(data_path)?;
    run_backtest(&config, &loaded.records, &loaded.dataset_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::dataset_hash;
    use crate::synthetic::synthetic_rounds;
    use roundlab_core::engine::{CooldownPolicy, EngineConfig};
    use roundlab_core::fingerprint::ComponentConfig;

    fn config() -> BacktestConfig {
        BacktestConfig::new(
            EngineConfig {
                cooldown_policy: CooldownPolicy::Fallback,
                ..Default::default()
            },
            ComponentConfig::new("trend_follow"),
        )
        .with_fallback(ComponentConfig::new("mean_reversion").with_param("period", 10.0))
    }

    #[test]
    fn report_carries_fingerprints() {
        let rounds = synthetic_rounds(300, 5);
        let hash = dataset_hash(&rounds);
        let report = run_backtest(&config(), &rounds, &hash).unwrap();
        assert_eq!(report.schema_version, SCHEMA_VERSION);
        assert_eq!(report.dataset_hash, hash);
        assert_eq!(report.run_id, RunId::derive(&report.config_hash, &hash));
        assert_eq!(report.result.total_rounds, 300);
    }

    #[test]
    fn run_id_changes_with_data_and_config() {
        let rounds = synthetic_rounds(100, 5);
        let hash = dataset_hash(&rounds);
        let base = run_backtest(&config(), &rounds, &hash).unwrap();

        let other_rounds = synthetic_rounds(100, 6);
        let other = run_backtest(&config(), &other_rounds, &dataset_hash(&other_rounds)).unwrap();
        assert_ne!(base.run_id, other.run_id);
        assert_eq!(base.config_hash, other.config_hash);

        let mut tweaked = config();
        tweaked.engine.base_position_fraction = 0.02;
        let tweaked = run_backtest(&tweaked, &rounds, &hash).unwrap();
        assert_ne!(base.config_hash, tweaked.config_hash);
        assert_eq!(base.structure_hash, tweaked.structure_hash);
    }

    #[test]
    fn fallback_policy_without_fallback_is_rejected() {
        let mut config = config();
        config.fallback = None;
        let err = build_backtester(&config).unwrap_err();
        assert!(matches!(err, RunError::Config(ConfigError::MissingFallback)));
    }

    #[test]
    fn bad_fee_factor_is_a_config_error_not_a_panic() {
        let mut config = config();
        config.engine.fee_factor = 0.0;
        assert!(matches!(build_backtester(&config), Err(RunError::Config(_))));
    }

    #[test]
    fn unknown_signal_is_rejected() {
        let mut config = config();
        config.signal = ComponentConfig::new("astrology");
        assert!(matches!(
            build_backtester(&config),
            Err(RunError::Signal(FactoryError::UnknownSignal(_)))
        ));
    }

    #[test]
    fn report_json_reloads_with_identity() {
        let rounds = synthetic_rounds(50, 1);
        let report = run_backtest(&config(), &rounds, &dataset_hash(&rounds)).unwrap();
        let json = serde_json::to_string(&report).unwrap();
        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.run_id, report.run_id);
        assert_eq!(back.config, report.config);
        assert_eq!(back.result.trades.len(), report.result.trades.len());
    }

    #[test]
    fn older_reports_default_schema_version() {
        let rounds = synthetic_rounds(20, 1);
        let report = run_backtest(&config(), &rounds, &dataset_hash(&rounds)).unwrap();
        let mut value = serde_json::to_value(&report).unwrap();
        value.as_object_mut().unwrap().remove("schema_version");
        let back: RunReport = serde_json::from_value(value).unwrap();
        assert_eq!(back.schema_version, SCHEMA_VERSION);
    }
}

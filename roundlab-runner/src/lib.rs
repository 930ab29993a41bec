//! RoundLab Runner — backtest orchestration on top of `roundlab-core`.
//!
//! This crate provides:
//! - TOML run configuration (engine parameters, primary and fallback signal)
//! - Round CSV loading with ordering, de-duplication and dataset hashing
//! - Seeded synthetic rounds for smoke runs and benchmarks
//! - Single-run orchestration producing fingerprinted reports
//! - Parallel parameter sweeps with deterministic result order

pub mod config;
pub mod data_loader;
pub mod runner;
pub mod sweep;
pub mod synthetic;

pub use config::{BacktestConfig, RunnerConfigError};
pub use data_loader::{
    dataset_hash, load_rounds_csv, parse_rounds_csv, write_rounds_csv, LoadError, LoadedRounds,
};
pub use runner::{
    build_backtester, run_backtest, run_from_files, RunError, RunReport, SCHEMA_VERSION,
};
pub use sweep::{Axis, AxisTarget, GridError, ParamGrid, ParamSweep, SweepEntry, SweepResults};
pub use synthetic::{synthetic_rounds, synthetic_rounds_with, SyntheticParams};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn backtest_config_is_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
    }

    #[test]
    fn run_report_is_send_sync() {
        assert_send::<RunReport>();
        assert_sync::<RunReport>();
    }

    #[test]
    fn run_error_is_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }

    #[test]
    fn sweep_is_send_sync() {
        assert_send::<ParamGrid>();
        assert_sync::<ParamGrid>();
        assert_send::<ParamSweep>();
        assert_sync::<ParamSweep>();
    }
}

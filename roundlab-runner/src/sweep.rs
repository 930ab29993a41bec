//! Parameter sweep utilities for grid search.
//!
//! A grid is a base `BacktestConfig` plus axes, each naming one parameter and
//! the values to try. Configurations are expanded as a cartesian product
//! (first axis outermost) and run in parallel with rayon. Results come back
//! in grid order whatever the thread count.

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use roundlab_core::domain::{DatasetHash, RoundRecord};
use roundlab_core::engine::EngineConfig;
use roundlab_core::fingerprint::ComponentConfig;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::config::BacktestConfig;
use crate::runner::{run_backtest, RunError, RunReport};

/// Errors building a parameter grid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("axis '{0}' must look like target.name=v1,v2,...")]
    Syntax(String),
    #[error("unknown axis target '{0}' (expected engine, signal or fallback)")]
    UnknownTarget(String),
    #[error("axis '{0}' has no values")]
    Empty(String),
    #[error("axis '{axis}': '{value}' is not a number")]
    NotANumber { axis: String, value: String },
    #[error("unknown engine field '{0}'")]
    UnknownEngineField(String),
    #[error("engine field '{field}' cannot take {value}")]
    InvalidEngineValue { field: String, value: f64 },
    #[error("fallback axis '{0}' but the base config has no fallback")]
    NoFallback(String),
}

/// Which part of the config an axis writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisTarget {
    Engine,
    Signal,
    Fallback,
}

impl AxisTarget {
    fn as_str(self) -> &'static str {
        match self {
            AxisTarget::Engine => "engine",
            AxisTarget::Signal => "signal",
            AxisTarget::Fallback => "fallback",
        }
    }
}

/// One swept parameter and its candidate values.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub target: AxisTarget,
    pub name: String,
    pub values: Vec<f64>,
}

impl Axis {
    pub fn new(target: AxisTarget, name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            target,
            name: name.into(),
            values,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.target.as_str(), self.name)
    }
}

/// Parses `engine.loss_threshold=2,3,4` or `signal.min_payout=1.3,1.5`.
impl FromStr for Axis {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let syntax = || GridError::Syntax(s.to_string());
        let (key, values) = s.split_once('=').ok_or_else(syntax)?;
        let (target, name) = key.trim().split_once('.').ok_or_else(syntax)?;
        if name.is_empty() {
            return Err(syntax());
        }
        let target = match target {
            "engine" => AxisTarget::Engine,
            "signal" => AxisTarget::Signal,
            "fallback" => AxisTarget::Fallback,
            other => return Err(GridError::UnknownTarget(other.to_string())),
        };
        let values = values
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| {
                v.parse::<f64>().map_err(|_| GridError::NotANumber {
                    axis: key.to_string(),
                    value: v.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if values.is_empty() {
            return Err(GridError::Empty(key.to_string()));
        }
        Ok(Axis::new(target, name, values))
    }
}

/// Base configuration plus the axes swept over it.
#[derive(Debug, Clone)]
pub struct ParamGrid {
    pub base: BacktestConfig,
    pub axes: Vec<Axis>,
}

impl ParamGrid {
    pub fn new(base: BacktestConfig) -> Self {
        Self {
            base,
            axes: Vec::new(),
        }
    }

    pub fn with_axis(mut self, axis: Axis) -> Self {
        self.axes.push(axis);
        self
    }

    /// Returns the total number of configurations in this grid.
    pub fn size(&self) -> usize {
        self.axes.iter().map(|a| a.values.len()).product()
    }

    /// Generates all configurations in the grid, first axis outermost.
    ///
    /// Configurations the engine would reject are still generated; they fail
    /// individually when run.
    pub fn generate_configs(&self) -> Result<Vec<BacktestConfig>, GridError> {
        let mut configs = vec![self.base.clone()];
        for axis in &self.axes {
            let mut next = Vec::with_capacity(configs.len() * axis.values.len());
            for config in &configs {
                for &value in &axis.values {
                    let mut config = config.clone();
                    apply(&mut config, axis, value)?;
                    next.push(config);
                }
            }
            configs = next;
        }
        Ok(configs)
    }
}

fn apply(config: &mut BacktestConfig, axis: &Axis, value: f64) -> Result<(), GridError> {
    match axis.target {
        AxisTarget::Engine => {
            config.engine = set_engine_field(&config.engine, &axis.name, value)?;
        }
        AxisTarget::Signal => set_param(&mut config.signal, &axis.name, value),
        AxisTarget::Fallback => {
            let fallback = config
                .fallback
                .as_mut()
                .ok_or_else(|| GridError::NoFallback(axis.to_string()))?;
            set_param(fallback, &axis.name, value);
        }
    }
    Ok(())
}

fn set_param(component: &mut ComponentConfig, name: &str, value: f64) {
    component.params.insert(name.to_string(), value);
}

/// Engine fields are addressed by their serialized name, so every numeric
/// field is sweepable without a hand-kept list.
fn set_engine_field(
    engine: &EngineConfig,
    field: &str,
    value: f64,
) -> Result<EngineConfig, GridError> {
    let invalid = || GridError::InvalidEngineValue {
        field: field.to_string(),
        value,
    };
    let mut json = serde_json::to_value(engine).map_err(|_| invalid())?;
    let slot = json
        .get_mut(field)
        .ok_or_else(|| GridError::UnknownEngineField(field.to_string()))?;
    *slot = match &*slot {
        Value::Number(n) if n.is_i64() || n.is_u64() => {
            if value.fract() != 0.0 {
                return Err(invalid());
            }
            Value::from(value as i64)
        }
        Value::Number(_) | Value::Null => Value::from(value),
        _ => return Err(invalid()),
    };
    serde_json::from_value(json).map_err(|_| invalid())
}

/// Parameter sweep executor.
///
/// Runs backtests for all configurations in a grid, optionally in parallel.
#[derive(Debug, Clone)]
pub struct ParamSweep {
    parallel: bool,
}

impl Default for ParamSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamSweep {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Executes a parameter sweep over the given grid and dataset.
    ///
    /// A configuration that fails to build is recorded as a failed entry; it
    /// does not abort the rest of the sweep.
    pub fn sweep(
        &self,
        grid: &ParamGrid,
        records: &[RoundRecord],
        dataset_hash: &DatasetHash,
    ) -> Result<SweepResults, GridError> {
        let configs = grid.generate_configs()?;
        info!(configs = configs.len(), parallel = self.parallel, "sweep started");

        let run = |config: BacktestConfig| {
            let outcome = run_backtest(&config, records, dataset_hash);
            SweepEntry { config, outcome }
        };
        let entries: Vec<SweepEntry> = if self.parallel {
            // Indexed parallel iterators collect in input order.
            configs.into_par_iter().map(run).collect()
        } else {
            configs.into_iter().map(run).collect()
        };

        let results = SweepResults { entries };
        info!(
            completed = results.successes().count(),
            failed = results.failures().count(),
            "sweep finished"
        );
        Ok(results)
    }
}

/// One grid point and how its run went.
#[derive(Debug)]
pub struct SweepEntry {
    pub config: BacktestConfig,
    pub outcome: Result<RunReport, RunError>,
}

/// Results from a parameter sweep, in grid order.
#[derive(Debug)]
pub struct SweepResults {
    entries: Vec<SweepEntry>,
}

impl SweepResults {
    pub fn entries(&self) -> &[SweepEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn successes(&self) -> impl Iterator<Item = &RunReport> {
        self.entries.iter().filter_map(|e| e.outcome.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&BacktestConfig, &RunError)> {
        self.entries
            .iter()
            .filter_map(|e| e.outcome.as_ref().err().map(|err| (&e.config, err)))
    }

    /// Highest final balance; ties go to the earlier grid point.
    pub fn best(&self) -> Option<&RunReport> {
        self.successes().fold(None, |best: Option<&RunReport>, r| match best {
            Some(b) if b.result.final_balance >= r.result.final_balance => Some(b),
            _ => Some(r),
        })
    }
}

//! Backtesting engine — round-by-round driver and supporting state.
//!
//! The driver consumes an ordered slice of round records and, per round:
//!
//! 1. Validates the record and advances the circuit breaker
//! 2. Asks the phase's signal generator for a decision
//! 3. Sizes the wager from bankroll, streak and phase
//! 4. Settles it through the bankroll ledger

pub mod breaker;
pub mod config;
pub mod ledger;
pub mod loop_runner;
pub mod metrics;
pub mod result;
pub mod state;

pub use breaker::{CircuitBreaker, CooldownState, Phase};
pub use config::{ConfigError, CooldownPolicy, EngineConfig};
pub use ledger::{BankrollLedger, BankrollState, OutcomeWindow, Wager};
pub use loop_runner::{Backtester, SkipReason, StepOutcome};
pub use result::{BacktestResult, DataGapCounts, PhaseStats, SkipCounts, StopReason};
pub use state::{SequenceGuard, SimulationState};

//! RoundLab Core — domain types, signals, sizing, circuit breaker, bankroll ledger, driver.
//!
//! This crate contains the heart of the backtesting engine for binary UP/DOWN
//! prediction rounds:
//! - Domain types (round records, trade outcomes, content hashes)
//! - Signal generators behind one trait, built from declarative config
//! - Multi-factor position sizing
//! - Loss-streak circuit breaker with timed cooldown
//! - Compounding bankroll ledger with a bust floor
//! - Deterministic round-by-round driver
//!
//! No I/O happens here; records arrive as an in-memory slice.

pub mod components;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod indicators;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types shared across sweep threads are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::RoundRecord>();
        require_sync::<domain::RoundRecord>();
        require_send::<domain::TradeOutcome>();
        require_sync::<domain::TradeOutcome>();
        require_send::<domain::ConfigHash>();
        require_sync::<domain::ConfigHash>();
        require_send::<domain::RunId>();
        require_sync::<domain::RunId>();

        // Config
        require_send::<fingerprint::StrategyConfig>();
        require_sync::<fingerprint::StrategyConfig>();
        require_send::<engine::EngineConfig>();
        require_sync::<engine::EngineConfig>();

        // Engine
        require_send::<engine::Backtester>();
        require_sync::<engine::Backtester>();
        require_send::<engine::SimulationState>();
        require_send::<engine::BacktestResult>();
        require_sync::<engine::BacktestResult>();

        // Signals
        require_send::<components::signal::CrowdSignal>();
        require_sync::<components::signal::CrowdSignal>();
        require_send::<components::signal::MeanReversion>();
        require_sync::<components::signal::MeanReversion>();
        require_send::<components::signal::Momentum>();
        require_sync::<components::signal::Momentum>();
        require_send::<components::signal::TrendFollow>();
        require_sync::<components::signal::TrendFollow>();
        require_send::<components::signal::Confluence>();
        require_sync::<components::signal::Confluence>();
        require_send::<components::signal::NullSignal>();
        require_sync::<components::signal::NullSignal>();
    }

    /// Architecture contract: signals cannot see bankroll, breaker, or outcome data.
    ///
    /// `generate` takes a `RoundView` (no prices, winner, or payout multiple)
    /// and a `History` of strictly earlier rounds. If the trait signature
    /// changes to include engine state, this stops compiling.
    #[test]
    fn signal_generator_sees_only_decision_time_data() {
        fn _check_trait_object_builds(
            sig: &dyn components::SignalGenerator,
            round: &components::RoundView<'_>,
            history: &components::History<'_>,
        ) -> Option<components::SignalDecision> {
            sig.generate(round, history)
        }
    }
}

//! Strategy components: decision-time views, signal generators, sizing, and
//! the factory that builds generators from configuration.

pub mod factory;
pub mod history;
pub mod signal;
pub mod sizing;

pub use factory::{create_signal, FactoryError, PricingDefaults};
pub use history::{History, RoundView};
pub use signal::{SignalDecision, SignalGenerator};
pub use sizing::SizingPolicy;

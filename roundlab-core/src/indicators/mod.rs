//! Indicator math over close-price series taken from the history window.
//!
//! All functions are pure and read `f64` iterators, so callers can stream
//! closes straight out of the rounds they are allowed to see.

pub mod bollinger;
pub mod ema;

pub use bollinger::{bands, Bands};
pub use ema::last_ema;

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

//! Seeded synthetic rounds for smoke runs and benchmarks.
//!
//! Prices follow a Gaussian-ish random walk, pools are drawn independently
//! with a mild tilt toward the recent trend, and settlement is derived from
//! the generated prices so every record is internally consistent. The same
//! `(params, seed)` always yields the same rounds.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use roundlab_core::domain::{RoundRecord, TrendSignal, Winner, PRICE_DECIMALS};

const WEI: u128 = 1_000_000_000_000_000_000;

/// Shape of the generated series.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticParams {
    /// Lock timestamp of the first round.
    pub start_timestamp: i64,
    /// Seconds between consecutive locks; also the round duration.
    pub interval_seconds: i64,
    pub start_price: f64,
    /// Per-round standard deviation of the price change, as a fraction.
    pub volatility: f64,
    /// Typical total pool per round, in whole units.
    pub mean_pool: f64,
    /// Fraction of the pool paid out to winners.
    pub fee_factor: f64,
}

impl Default for SyntheticParams {
    fn default() -> Self {
        Self {
            start_timestamp: 1_700_000_000,
            interval_seconds: 300,
            start_price: 300.0,
            volatility: 0.002,
            mean_pool: 5.0,
            fee_factor: 0.97,
        }
    }
}

/// `n` rounds with default parameters.
pub fn synthetic_rounds(n: usize, seed: u64) -> Vec<RoundRecord> {
    synthetic_rounds_with(n, seed, &SyntheticParams::default())
}

pub fn synthetic_rounds_with(n: usize, seed: u64, params: &SyntheticParams) -> Vec<RoundRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let scale = 10f64.powi(PRICE_DECIMALS as i32);
    let mut price = params.start_price;
    let mut fast = price;
    let mut slow = price;

    (0..n)
        .map(|i| {
            let lock_price = price;
            // Sum of uniforms: cheap, bounded, roughly normal.
            let shock: f64 = (0..4).map(|_| rng.gen_range(-1.0..1.0)).sum::<f64>() / 2.0;
            price = (price * (1.0 + shock * params.volatility)).max(0.01);

            let gap_percent = (fast - slow) / slow * 100.0;
            let trend = if gap_percent > 0.05 {
                TrendSignal::Up
            } else if gap_percent < -0.05 {
                TrendSignal::Down
            } else {
                TrendSignal::Neutral
            };

            let total = params.mean_pool * rng.gen_range(0.2..1.8);
            let tilt = (0.5 + gap_percent.clamp(-0.2, 0.2)).clamp(0.1, 0.9);
            let up_share = (tilt + rng.gen_range(-0.25..0.25)).clamp(0.02, 0.98);
            let up_pool = (total * up_share * WEI as f64) as u128;
            let down_pool = (total * (1.0 - up_share) * WEI as f64) as u128;

            let lock_raw = (lock_price * scale).round() as i64;
            let close_raw = (price * scale).round() as i64;
            // Ties go to DOWN, matching a strict "close above lock" rule for UP.
            let winner = if close_raw > lock_raw {
                Winner::Up
            } else {
                Winner::Down
            };
            let winner_pool = match winner {
                Winner::Up => up_pool,
                _ => down_pool,
            };
            let payout = (up_pool + down_pool) as f64 * params.fee_factor / winner_pool as f64;

            fast += (price - fast) * 2.0 / 6.0;
            slow += (price - slow) * 2.0 / 21.0;

            let lock_ts = params.start_timestamp + i as i64 * params.interval_seconds;
            RoundRecord {
                epoch: i as u64 + 1,
                lock_timestamp: Some(lock_ts),
                close_timestamp: Some(lock_ts + params.interval_seconds),
                lock_price: Some(lock_raw),
                close_price: Some(close_raw),
                up_pool: Some(up_pool),
                down_pool: Some(down_pool),
                winner,
                winner_payout_multiple: Some(payout),
                trend_signal: Some(trend),
                trend_gap_percent: Some(gap_percent),
            }
        })
        .collect()
}

//! Look-ahead contamination tests.
//!
//! Invariant: the decision for round `t` may depend only on the pre-lock view
//! of round `t` and on rounds before it.
//!
//! Methods:
//! 1. Per generator: scramble the settlement fields of round `t` and every
//!    later round; the decision at `t` must not change.
//! 2. Whole engine: run on a truncated prefix and on the full series; the
//!    truncated trade log must be a prefix of the full one.

use roundlab_core::components::{
    create_signal, History, PricingDefaults, RoundView, SignalGenerator,
};
use roundlab_core::domain::{RoundRecord, TrendSignal, Winner};
use roundlab_core::engine::{Backtester, CooldownPolicy, EngineConfig};
use roundlab_core::fingerprint::ComponentConfig;

const WEI: u128 = 1_000_000_000_000_000_000;

/// Generate N rounds of synthetic data with realistic variation.
fn make_test_rounds(n: usize) -> Vec<RoundRecord> {
    let mut rounds = Vec::with_capacity(n);
    let mut price: i64 = 30_000_000_000;

    for i in 0..n {
        // Deterministic pseudo-random walk using a simple LCG
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let step = ((seed >> 33) % 200) as i64 - 100;
        let lock = price;
        price = (price + step * 2_000_000).max(1_000_000_000);
        let up = 1 + (seed >> 17) % 9;
        let down = 1 + (seed >> 41) % 9;
        let gap = step as f64 / 100.0;
        let epoch = i as u64 + 1;

        rounds.push(RoundRecord {
            epoch,
            lock_timestamp: Some(1_700_000_000 + epoch as i64 * 300),
            close_timestamp: Some(1_700_000_300 + epoch as i64 * 300),
            lock_price: Some(lock),
            close_price: Some(price),
            up_pool: Some(up as u128 * WEI),
            down_pool: Some(down as u128 * WEI),
            winner: if price > lock { Winner::Up } else { Winner::Down },
            winner_payout_multiple: Some(1.9),
            trend_signal: Some(if gap > 0.1 {
                TrendSignal::Up
            } else if gap < -0.1 {
                TrendSignal::Down
            } else {
                TrendSignal::Neutral
            }),
            trend_gap_percent: Some(gap),
        });
    }
    rounds
}

fn generators() -> Vec<Box<dyn SignalGenerator>> {
    let defaults = PricingDefaults::default();
    let configs = [
        ComponentConfig::new("crowd_contrarian").with_param("min_payout", 1.0),
        ComponentConfig::new("crowd_follow")
            .with_param("require_trend", 0.0)
            .with_param("min_payout", 0.0),
        ComponentConfig::new("trend_follow").with_param("min_gap_percent", 0.2),
        ComponentConfig::new("mean_reversion")
            .with_param("period", 10.0)
            .with_param("proximity", 0.5),
        ComponentConfig::new("momentum")
            .with_param("fast_period", 3.0)
            .with_param("slow_period", 8.0),
        ComponentConfig::new("confluence")
            .with_param("min_agree", 1.0)
            .with_member(
                ComponentConfig::new("momentum")
                    .with_param("fast_period", 3.0)
                    .with_param("slow_period", 8.0),
            )
            .with_member(ComponentConfig::new("mean_reversion").with_param("period", 10.0)),
    ];
    configs
        .iter()
        .map(|c| create_signal(c, &defaults).unwrap())
        .collect()
}

/// Overwrite outcome data of round `from` and everything after it.
fn scramble_from(rounds: &mut [RoundRecord], from: usize) {
    for r in &mut rounds[from..] {
        r.close_price = r.close_price.map(|p| p * 3);
        r.lock_price = r.lock_price.map(|p| p / 2);
        r.winner = match r.winner {
            Winner::Up => Winner::Down,
            _ => Winner::Up,
        };
        r.winner_payout_multiple = Some(9.9);
    }
}

#[test]
fn generators_ignore_current_and_future_outcomes() {
    let original = make_test_rounds(120);
    for sig in generators() {
        let mut fired = 0;
        for t in 20..original.len() {
            let mut scrambled = original.clone();
            scramble_from(&mut scrambled, t);

            let start = t.saturating_sub(sig.lookback());
            let before = sig.generate(
                &RoundView::new(&original[t]),
                &History::new(&original[start..t]),
            );
            let after = sig.generate(
                &RoundView::new(&scrambled[t]),
                &History::new(&scrambled[start..t]),
            );
            assert_eq!(before, after, "{}: decision at round {t} saw outcome data", sig.name());
            fired += usize::from(before.is_some());
        }
        assert!(fired > 0, "{} never fired on the test series", sig.name());
    }
}

#[test]
fn truncated_run_is_prefix_of_full_run() {
    let rounds = make_test_rounds(200);
    let defaults = PricingDefaults::default();
    let build = || {
        let config = EngineConfig {
            loss_threshold: 2,
            cooldown_duration_seconds: 900,
            cooldown_policy: CooldownPolicy::Fallback,
            recovery_multiplier: 1.5,
            ..Default::default()
        };
        let primary = create_signal(
            &ComponentConfig::new("momentum")
                .with_param("fast_period", 3.0)
                .with_param("slow_period", 8.0),
            &defaults,
        )
        .unwrap();
        let fallback = create_signal(
            &ComponentConfig::new("mean_reversion").with_param("period", 10.0),
            &defaults,
        )
        .unwrap();
        Backtester::new(config, primary, Some(fallback)).unwrap()
    };

    let full = build().run(&rounds);
    let partial = build().run(&rounds[..100]);

    assert!(partial.total_trades > 0);
    assert!(partial.trades.len() <= full.trades.len());
    assert_eq!(partial.trades[..], full.trades[..partial.trades.len()]);
}

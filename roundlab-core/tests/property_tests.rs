//! Property tests for engine invariants.
//!
//! Uses proptest to verify, over random round sequences and configurations:
//! 1. Accounting — wins + losses == trades; trades + skipped + gaps == rounds
//! 2. Bankroll floor — balance never negative; zero exactly when busted
//! 3. Termination — a busted run stops at the busting trade
//! 4. Determinism — identical inputs serialize to identical JSON
//! 5. Sizing monotonicity — raising a multiplier never shrinks the first bet

use proptest::prelude::*;
use roundlab_core::components::{create_signal, PricingDefaults};
use roundlab_core::domain::{RoundRecord, Winner};
use roundlab_core::engine::{Backtester, BacktestResult, CooldownPolicy, EngineConfig, StopReason};
use roundlab_core::fingerprint::ComponentConfig;

const WEI: u128 = 1_000_000_000_000_000_000;
const BASE_TS: i64 = 1_700_000_000;

// ── Strategies (proptest) ────────────────────────────────────────────

/// (up units, down units, up wins, payout multiple, trend gap)
type RawRound = (u128, u128, bool, f64, f64);

fn arb_round() -> impl Strategy<Value = RawRound> {
    (0u128..6, 0u128..6, any::<bool>(), 0.0..3.0_f64, -1.0..1.0_f64)
}

fn to_records(raw: &[RawRound]) -> Vec<RoundRecord> {
    raw.iter()
        .enumerate()
        .map(|(i, &(up, down, up_wins, payout, gap))| {
            let epoch = i as u64 + 1;
            let lock = BASE_TS + epoch as i64 * 300;
            let close = 60_000_000_000 + (gap * 1e8) as i64;
            RoundRecord {
                epoch,
                lock_timestamp: Some(lock),
                close_timestamp: Some(lock + 300),
                lock_price: Some(60_000_000_000),
                close_price: Some(close),
                up_pool: Some(up * WEI),
                down_pool: Some(down * WEI),
                winner: if up_wins { Winner::Up } else { Winner::Down },
                winner_payout_multiple: Some(payout),
                trend_signal: None,
                trend_gap_percent: Some(gap),
            }
        })
        .collect()
}

fn arb_config() -> impl Strategy<Value = EngineConfig> {
    (
        0.01..=1.0_f64,
        0.5..3.0_f64,
        0.5..3.0_f64,
        0.25..2.0_f64,
        1i64..5,
        0i64..2000,
        any::<bool>(),
    )
        .prop_map(
            |(fraction, momentum, recovery, cooldown_mult, threshold, cooldown, fallback)| {
                EngineConfig {
                    base_position_fraction: fraction,
                    momentum_multiplier: momentum,
                    momentum_strength_threshold: 0.5,
                    recovery_multiplier: recovery,
                    cooldown_multiplier: cooldown_mult,
                    loss_threshold: threshold,
                    cooldown_duration_seconds: cooldown,
                    cooldown_policy: if fallback {
                        CooldownPolicy::Fallback
                    } else {
                        CooldownPolicy::Skip
                    },
                    ..Default::default()
                }
            },
        )
}

fn backtester(config: EngineConfig) -> Backtester {
    let defaults = PricingDefaults::from(&config);
    let primary = create_signal(
        &ComponentConfig::new("crowd_contrarian")
            .with_param("require_trend", 0.0)
            .with_param("min_payout", 0.0),
        &defaults,
    )
    .unwrap();
    let fallback = create_signal(
        &ComponentConfig::new("crowd_follow")
            .with_param("require_trend", 0.0)
            .with_param("min_payout", 0.0),
        &defaults,
    )
    .unwrap();
    Backtester::new(config, primary, Some(fallback)).unwrap()
}

fn run(config: EngineConfig, raw: &[RawRound]) -> BacktestResult {
    backtester(config).run(&to_records(raw))
}

// ── 1-3. Accounting, floor, termination ──────────────────────────────

proptest! {
    #[test]
    fn trade_accounting_holds(config in arb_config(), raw in prop::collection::vec(arb_round(), 0..120)) {
        let r = run(config, &raw);
        prop_assert_eq!(r.wins + r.losses, r.total_trades);
        prop_assert_eq!(r.total_trades + r.skipped.total() + r.data_gaps.total(), r.total_rounds);
        prop_assert_eq!(r.normal.trades + r.cooldown.trades, r.total_trades);
        prop_assert!(r.total_rounds <= raw.len());
        if r.stop_reason == StopReason::Exhausted {
            prop_assert_eq!(r.total_rounds, raw.len());
        }
    }

    #[test]
    fn balance_never_negative(config in arb_config(), raw in prop::collection::vec(arb_round(), 0..120)) {
        let r = run(config, &raw);
        prop_assert!(r.trades.iter().all(|t| t.balance_after >= 0.0));
        prop_assert!(r.final_balance >= 0.0);
        prop_assert_eq!(r.final_balance == 0.0, r.busted);
        prop_assert!(r.peak_balance >= r.final_balance);
        prop_assert!(r.max_drawdown_percent >= 0.0 && r.max_drawdown_percent <= 100.0);
    }

    #[test]
    fn bust_is_terminal(config in arb_config(), raw in prop::collection::vec(arb_round(), 0..120)) {
        let r = run(config, &raw);
        if r.busted {
            prop_assert_eq!(r.stop_reason, StopReason::Busted);
            let last = r.trades.last().unwrap();
            prop_assert_eq!(last.balance_after, 0.0);
            // Every earlier trade left a positive balance.
            prop_assert!(r.trades[..r.trades.len() - 1].iter().all(|t| t.balance_after > 0.0));
        }
    }

    #[test]
    fn bets_never_exceed_prior_balance(config in arb_config(), raw in prop::collection::vec(arb_round(), 1..80)) {
        let r = run(config, &raw);
        let mut balance = r.starting_balance;
        for t in &r.trades {
            prop_assert!(t.bet_amount > 0.0 && t.bet_amount <= balance);
            balance = t.balance_after;
        }
    }
}

// ── 4. Determinism ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn runs_are_deterministic(config in arb_config(), raw in prop::collection::vec(arb_round(), 0..80)) {
        let bt = backtester(config);
        let records = to_records(&raw);
        let a = serde_json::to_string(&bt.run(&records)).unwrap();
        let b = serde_json::to_string(&bt.run(&records)).unwrap();
        prop_assert_eq!(a, b);
    }
}

// ── 5. Sizing monotonicity ───────────────────────────────────────────

proptest! {
    /// First trade happens with no streak and outside cooldown, so only the
    /// momentum multiplier can apply.
    #[test]
    fn momentum_multiplier_is_monotone(
        low in 1.0..2.0_f64,
        extra in 0.0..2.0_f64,
        gap in 0.6..1.0_f64,
    ) {
        let raw = [(3u128, 1u128, true, 1.9, gap)];
        let config = |m: f64| EngineConfig {
            momentum_multiplier: m,
            momentum_strength_threshold: 0.5,
            ..Default::default()
        };
        let small = run(config(low), &raw);
        let large = run(config(low + extra), &raw);
        prop_assert_eq!(small.total_trades, 1);
        prop_assert!(large.trades[0].bet_amount >= small.trades[0].bet_amount);
    }

    /// Third trade follows two normal-phase losses, so recovery applies.
    #[test]
    fn recovery_multiplier_is_monotone(low in 1.0..2.0_f64, extra in 0.0..2.0_f64) {
        // Contrarian bets DOWN on 3:1 pools; UP wins twice, then DOWN.
        let raw = [
            (3u128, 1u128, true, 1.9, 0.0),
            (3, 1, true, 1.9, 0.0),
            (3, 1, false, 3.8, 0.0),
        ];
        let base = EngineConfig { loss_threshold: 10, ..Default::default() };
        let small = run(EngineConfig { recovery_multiplier: low, ..base.clone() }, &raw);
        let large = run(EngineConfig { recovery_multiplier: low + extra, ..base }, &raw);
        prop_assert_eq!(small.total_trades, 3);
        prop_assert!(large.trades[2].bet_amount >= small.trades[2].bet_amount);
    }
}

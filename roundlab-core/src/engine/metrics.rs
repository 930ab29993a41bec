//! Trade-log statistics — pure functions over `TradeOutcome` slices.

use crate::domain::TradeOutcome;

use super::result::PhaseStats;

/// Fraction of trades won; 0.0 for an empty log.
pub fn win_rate(wins: usize, trades: usize) -> f64 {
    if trades == 0 {
        return 0.0;
    }
    wins as f64 / trades as f64
}

/// Return on starting balance as a fraction: `(final - start) / start`.
pub fn roi(starting: f64, final_balance: f64) -> f64 {
    if starting <= 0.0 {
        return 0.0;
    }
    (final_balance - starting) / starting
}

/// Maximum consecutive winning trades.
pub fn longest_win_streak(trades: &[TradeOutcome]) -> usize {
    longest_streak(trades, true)
}

/// Maximum consecutive losing trades.
pub fn longest_loss_streak(trades: &[TradeOutcome]) -> usize {
    longest_streak(trades, false)
}

fn longest_streak(trades: &[TradeOutcome], won: bool) -> usize {
    let mut best = 0;
    let mut current = 0;
    for t in trades {
        if t.won == won {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

/// Statistics for the trades of one phase.
pub fn phase_stats(trades: &[TradeOutcome], cooldown: bool) -> PhaseStats {
    let mut stats = PhaseStats::default();
    for t in trades.iter().filter(|t| t.is_cooldown_trade == cooldown) {
        stats.trades += 1;
        if t.won {
            stats.wins += 1;
        } else {
            stats.losses += 1;
        }
        stats.net_profit += t.profit_or_loss;
    }
    stats.win_rate = win_rate(stats.wins, stats.trades);
    stats
}

//! Decision-time views: the current round before lock, and the rounds before it.
//!
//! Both views borrow from the record arena owned by the caller, so advancing to
//! the next round never copies or reallocates history.

use crate::domain::{RoundRecord, Side, TrendSignal};

/// The current round as visible before lock.
///
/// Exposes pools and precomputed trend fields only. Prices, winner and payout
/// multiple are settlement data and are unreachable through this type, so a
/// signal cannot peek at the outcome it is predicting.
#[derive(Debug, Clone, Copy)]
pub struct RoundView<'a> {
    record: &'a RoundRecord,
}

impl<'a> RoundView<'a> {
    pub fn new(record: &'a RoundRecord) -> Self {
        Self { record }
    }

    pub fn epoch(&self) -> u64 {
        self.record.epoch
    }

    pub fn lock_timestamp(&self) -> Option<i64> {
        self.record.lock_timestamp
    }

    pub fn pool(&self, side: Side) -> Option<u128> {
        self.record.pool(side)
    }

    pub fn total_pool(&self) -> u128 {
        self.record.total_pool()
    }

    pub fn minority_side(&self) -> Option<Side> {
        self.record.minority_side()
    }

    pub fn implied_payout(&self, side: Side, fee_factor: f64) -> Option<f64> {
        self.record.implied_payout(side, fee_factor)
    }

    pub fn trend_signal(&self) -> Option<TrendSignal> {
        self.record.trend_signal
    }

    pub fn trend_gap_percent(&self) -> Option<f64> {
        self.record.trend_gap_percent
    }
}

/// Bounded, ordered window of rounds strictly before the current one.
#[derive(Debug, Clone, Copy)]
pub struct History<'a> {
    rounds: &'a [RoundRecord],
}

impl<'a> History<'a> {
    pub fn new(rounds: &'a [RoundRecord]) -> Self {
        Self { rounds }
    }

    /// Window ending just before `index`, holding at most `lookback` rounds.
    pub fn before(records: &'a [RoundRecord], index: usize, lookback: usize) -> Self {
        let end = index.min(records.len());
        let start = end.saturating_sub(lookback);
        Self::new(&records[start..end])
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn rounds(&self) -> &'a [RoundRecord] {
        self.rounds
    }

    pub fn last(&self) -> Option<&'a RoundRecord> {
        self.rounds.last()
    }

    /// The trailing `n` rounds (or fewer if the window is shorter).
    pub fn tail(&self, n: usize) -> History<'a> {
        let start = self.rounds.len().saturating_sub(n);
        History::new(&self.rounds[start..])
    }

    /// Close prices of the trailing `n` rounds, oldest first, read lazily
    /// from the borrowed records.
    ///
    /// `None` if fewer than `n` rounds are available or any close is missing.
    pub fn closes(&self, n: usize) -> Option<impl ExactSizeIterator<Item = f64> + Clone + 'a> {
        if self.rounds.len() < n {
            return None;
        }
        let window = self.tail(n).rounds;
        if window.iter().any(|r| r.close_price.is_none()) {
            return None;
        }
        Some(
            window
                .iter()
                .map(|r| r.close_price_f64().unwrap_or(f64::NAN)),
        )
    }
}

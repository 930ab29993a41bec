//! RoundRecord — one resolved prediction round.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Implied decimals of `lock_price` / `close_price` (oracle fixed-point).
pub const PRICE_DECIMALS: u32 = 8;

/// One side of a binary round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Up,
    Down,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Up => Side::Down,
            Side::Down => Side::Up,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Up => "up",
            Side::Down => "down",
        }
    }
}

/// Resolved winner of a round. `Unknown` rounds never settle a wager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Up,
    Down,
    Unknown,
}

impl Winner {
    pub fn side(self) -> Option<Side> {
        match self {
            Winner::Up => Some(Side::Up),
            Winner::Down => Some(Side::Down),
            Winner::Unknown => None,
        }
    }
}

/// Precomputed trend indicator attached to a round by the ingestion side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendSignal {
    Up,
    Down,
    Neutral,
}

impl TrendSignal {
    pub fn side(self) -> Option<Side> {
        match self {
            TrendSignal::Up => Some(Side::Up),
            TrendSignal::Down => Some(Side::Down),
            TrendSignal::Neutral => None,
        }
    }
}

/// Why a record could not be traded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataGap {
    /// A required field (timestamp, price, pool, payout multiple) is absent.
    MissingField,
    /// `up_pool + down_pool == 0`.
    EmptyPool,
    /// Winner was never resolved.
    UnknownWinner,
    /// Lock timestamp or epoch goes backwards relative to the previous record.
    OutOfOrder,
}

/// A resolved round as materialized by the ingestion pipeline.
///
/// Pool amounts are wei at the chosen snapshot time. Prices are fixed-point
/// with [`PRICE_DECIMALS`] implied decimals. `winner_payout_multiple` is the
/// multiple actually paid to winners, already net of the house fee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub epoch: u64,
    pub lock_timestamp: Option<i64>,
    pub close_timestamp: Option<i64>,
    pub lock_price: Option<i64>,
    pub close_price: Option<i64>,
    #[serde(with = "wei_opt")]
    pub up_pool: Option<u128>,
    #[serde(with = "wei_opt")]
    pub down_pool: Option<u128>,
    pub winner: Winner,
    pub winner_payout_multiple: Option<f64>,
    #[serde(default)]
    pub trend_signal: Option<TrendSignal>,
    #[serde(default)]
    pub trend_gap_percent: Option<f64>,
}

impl RoundRecord {
    /// Check every field the driver needs before a wager can settle.
    pub fn validate(&self) -> Result<(), DataGap> {
        if self.lock_timestamp.is_none()
            || self.close_timestamp.is_none()
            || self.lock_price.is_none()
            || self.close_price.is_none()
            || self.up_pool.is_none()
            || self.down_pool.is_none()
        {
            return Err(DataGap::MissingField);
        }
        match self.winner_payout_multiple {
            Some(m) if m.is_finite() && m >= 0.0 => {}
            _ => return Err(DataGap::MissingField),
        }
        if self.total_pool() == 0 {
            return Err(DataGap::EmptyPool);
        }
        if self.winner == Winner::Unknown {
            return Err(DataGap::UnknownWinner);
        }
        Ok(())
    }

    /// Sum of both pools in wei (missing pools count as zero).
    pub fn total_pool(&self) -> u128 {
        self.up_pool
            .unwrap_or(0)
            .saturating_add(self.down_pool.unwrap_or(0))
    }

    pub fn pool(&self, side: Side) -> Option<u128> {
        match side {
            Side::Up => self.up_pool,
            Side::Down => self.down_pool,
        }
    }

    /// Side holding the smaller pool. Ties resolve to `None`.
    pub fn minority_side(&self) -> Option<Side> {
        let up = self.up_pool?;
        let down = self.down_pool?;
        match up.cmp(&down) {
            std::cmp::Ordering::Less => Some(Side::Up),
            std::cmp::Ordering::Greater => Some(Side::Down),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Decision-time payout for backing `side`: `(total * fee_factor) / pool[side]`.
    ///
    /// `None` when the chosen side's pool is zero or missing.
    pub fn implied_payout(&self, side: Side, fee_factor: f64) -> Option<f64> {
        let side_pool = self.pool(side)?;
        if side_pool == 0 {
            return None;
        }
        let total = self.total_pool() as f64;
        Some(total * fee_factor / side_pool as f64)
    }

    /// Close price as a float in quote units.
    pub fn close_price_f64(&self) -> Option<f64> {
        self.close_price.map(fixed_to_f64)
    }

    pub fn lock_price_f64(&self) -> Option<f64> {
        self.lock_price.map(fixed_to_f64)
    }

    pub fn lock_time(&self) -> Option<DateTime<Utc>> {
        self.lock_timestamp
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
    }
}

fn fixed_to_f64(raw: i64) -> f64 {
    raw as f64 / 10f64.powi(PRICE_DECIMALS as i32)
}

/// Wei amounts exceed `u64` and JSON numbers lose precision past 2^53,
/// so pools travel as decimal strings.
mod wei_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<u128>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => s.serialize_some(&v.to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u128>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s.parse::<u128>().map(Some).map_err(serde::de::Error::custom),
        }
    }
}

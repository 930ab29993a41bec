//! Round loading for the runner.
//!
//! Reads already-materialized round records from CSV. Rows are sorted by
//! epoch and duplicate epochs are dropped (first occurrence wins). Fields the
//! driver cannot use are left as `None` so they surface as data gaps during the
//! run rather than failing the load; only cells that are present but
//! unparseable abort loading.

use chrono::{DateTime, Utc};
use roundlab_core::domain::{DatasetHash, RoundRecord, TrendSignal, Winner};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("open round file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: invalid {column} value '{value}'")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },
}

/// Result of loading rounds, with provenance for fingerprinting.
#[derive(Debug, Clone)]
pub struct LoadedRounds {
    /// Records sorted by epoch, one per epoch.
    pub records: Vec<RoundRecord>,
    /// BLAKE3 over the canonical serialization of `records`.
    pub dataset_hash: DatasetHash,
    /// Rows discarded because their epoch was already seen.
    pub duplicates_dropped: usize,
}

impl LoadedRounds {
    /// Lock times of the first and last record that carry one.
    pub fn span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.records.iter().find_map(RoundRecord::lock_time)?;
        let last = self.records.iter().rev().find_map(RoundRecord::lock_time)?;
        Some((first, last))
    }
}

/// One CSV row as written by the ingestion side. Empty cells become `None`.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    epoch: u64,
    lock_timestamp: Option<i64>,
    close_timestamp: Option<i64>,
    lock_price: Option<i64>,
    close_price: Option<i64>,
    up_pool: Option<String>,
    down_pool: Option<String>,
    winner: Option<String>,
    winner_payout_multiple: Option<f64>,
    #[serde(default)]
    trend_signal: Option<String>,
    #[serde(default)]
    trend_gap_percent: Option<f64>,
}

impl CsvRow {
    fn from_record(r: &RoundRecord) -> Self {
        let label = |text: Option<&'static str>| text.map(str::to_string);
        Self {
            epoch: r.epoch,
            lock_timestamp: r.lock_timestamp,
            close_timestamp: r.close_timestamp,
            lock_price: r.lock_price,
            close_price: r.close_price,
            up_pool: r.up_pool.map(|p| p.to_string()),
            down_pool: r.down_pool.map(|p| p.to_string()),
            winner: label(r.winner.side().map(|s| s.as_str())),
            winner_payout_multiple: r.winner_payout_multiple,
            trend_signal: label(r.trend_signal.map(|t| match t {
                TrendSignal::Up => "up",
                TrendSignal::Down => "down",
                TrendSignal::Neutral => "neutral",
            })),
            trend_gap_percent: r.trend_gap_percent,
        }
    }

    fn into_record(self, row: usize) -> Result<RoundRecord, LoadError> {
        Ok(RoundRecord {
            epoch: self.epoch,
            lock_timestamp: self.lock_timestamp,
            close_timestamp: self.close_timestamp,
            lock_price: self.lock_price,
            close_price: self.close_price,
            up_pool: parse_wei(row, "up_pool", self.up_pool)?,
            down_pool: parse_wei(row, "down_pool", self.down_pool)?,
            winner: parse_winner(row, self.winner)?,
            winner_payout_multiple: self.winner_payout_multiple,
            trend_signal: parse_trend(row, self.trend_signal)?,
            trend_gap_percent: self.trend_gap_percent,
        })
    }
}

fn parse_wei(
    row: usize,
    column: &'static str,
    raw: Option<String>,
) -> Result<Option<u128>, LoadError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(|_| LoadError::InvalidValue {
            row,
            column,
            value: s.to_string(),
        }),
    }
}

fn parse_winner(row: usize, raw: Option<String>) -> Result<Winner, LoadError> {
    let Some(raw) = raw else {
        return Ok(Winner::Unknown);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "up" | "bull" => Ok(Winner::Up),
        "down" | "bear" => Ok(Winner::Down),
        "" | "unknown" | "none" => Ok(Winner::Unknown),
        _ => Err(LoadError::InvalidValue {
            row,
            column: "winner",
            value: raw,
        }),
    }
}

fn parse_trend(row: usize, raw: Option<String>) -> Result<Option<TrendSignal>, LoadError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "up" => Ok(Some(TrendSignal::Up)),
        "down" => Ok(Some(TrendSignal::Down)),
        "neutral" => Ok(Some(TrendSignal::Neutral)),
        _ => Err(LoadError::InvalidValue {
            row,
            column: "trend_signal",
            value: raw,
        }),
    }
}

/// Load rounds from a CSV file with a header row.
pub fn load_rounds_csv(path: &Path) -> Result<LoadedRounds, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = parse_rounds_csv(file)?;
    debug!(
        path = %path.display(),
        rounds = loaded.records.len(),
        dataset = loaded.dataset_hash.short(),
        "rounds loaded"
    );
    Ok(loaded)
}

/// Parse rounds from any CSV reader with a header row.
pub fn parse_rounds_csv<R: Read>(reader: R) -> Result<LoadedRounds, LoadError> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (i, row) in csv.deserialize::<CsvRow>().enumerate() {
        // Header is line 1, first data row is line 2.
        records.push(row?.into_record(i + 2)?);
    }

    // Stable sort keeps the first occurrence of a duplicated epoch in front.
    records.sort_by_key(|r| r.epoch);
    let before = records.len();
    records.dedup_by_key(|r| r.epoch);
    let duplicates_dropped = before - records.len();
    if duplicates_dropped > 0 {
        warn!(duplicates_dropped, "duplicate epochs dropped, first occurrence kept");
    }

    let dataset_hash = dataset_hash(&records);
    Ok(LoadedRounds {
        records,
        dataset_hash,
        duplicates_dropped,
    })
}

/// Write rounds as CSV in the column layout `parse_rounds_csv` reads.
pub fn write_rounds_csv<W: Write>(writer: W, records: &[RoundRecord]) -> Result<(), LoadError> {
    let mut csv = csv::Writer::from_writer(writer);
    for record in records {
        csv.serialize(CsvRow::from_record(record))?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// BLAKE3 over one canonical JSON line per record.
pub fn dataset_hash(records: &[RoundRecord]) -> DatasetHash {
    let mut hasher = blake3::Hasher::new();
    for record in records {
        // Plain fields and string-encoded pools: serialization cannot fail.
        if let Ok(line) = serde_json::to_vec(record) {
            hasher.update(&line);
        }
        hasher.update(b"\n");
    }
    DatasetHash(hasher.finalize().to_hex().to_string())
}

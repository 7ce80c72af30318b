//! Domain errors raised by the ledgers.
//!
//! Everything is returned through `anyhow::Result`; callers that need to react to a
//! specific case use `err.downcast_ref::<LedgerError>()`.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("No entry at position {rank} for {date} ({len} entries on that date)")]
    IndexOutOfRange {
        date: NaiveDate,
        rank: usize,
        len: usize,
    },

    #[error("Entry {0} not found")]
    EntryNotFound(String),

    #[error("Grams must be a positive number (got {0})")]
    InvalidGrams(f64),

    #[error("kcal must not be negative (got {0})")]
    InvalidKcal(i64),

    #[error("Weight must be a positive number (got {0})")]
    InvalidWeight(f64),
}

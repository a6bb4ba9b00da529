//! Storage traits and error types
//!
//! This module defines the trait interfaces for the cursor and record stores and
//! their shared error type.

use crate::model::{Cursor, Record};
use crate::storage::IdIndex;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Dataset has {found} columns, the configured schema expects {expected}")]
    SchemaMismatch { expected: usize, found: usize },

    #[error("Duplicate record id: {0}")]
    DuplicateId(i64),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable home of the single resume cursor
pub trait CursorStore {
    /// Loads the saved cursor
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Cursor))` - A cursor was saved by an earlier run
    /// * `Ok(None)` - No cursor exists yet (first run)
    /// * `Err(StorageError)` - The cursor exists but could not be read or parsed
    fn load(&self) -> StorageResult<Option<Cursor>>;

    /// Replaces the saved cursor
    ///
    /// The previous cursor is overwritten as a whole. A crash mid-write may lose it.
    fn save(&mut self, cursor: &Cursor) -> StorageResult<()>;
}

/// Append-only home of harvested records
pub trait RecordStore {
    /// Scans the whole dataset and collects every stored id
    ///
    /// A dataset that does not exist yet yields an empty index.
    fn load_existing_ids(&self) -> StorageResult<IdIndex>;

    /// Appends one record
    ///
    /// The row must be durable (flushed) when this returns. Callers guarantee that
    /// `record.id` is not already stored.
    fn append(&mut self, record: &Record) -> StorageResult<()>;
}

//! In-memory stores
//!
//! Used to drive the ingestion controller deterministically without touching
//! the filesystem. Both stores can be told to fail so error paths are testable.

use crate::model::{Cursor, Record};
use crate::storage::traits::{CursorStore, RecordStore, StorageError, StorageResult};
use crate::storage::IdIndex;
use std::io;

/// Cursor store backed by a field
#[derive(Debug, Clone, Default)]
pub struct MemoryCursorStore {
    /// Currently saved cursor
    pub cursor: Option<Cursor>,

    /// Every cursor ever saved, oldest first
    pub history: Vec<Cursor>,

    /// Make `load` return an error (simulates a corrupt cursor file)
    pub fail_load: bool,

    /// Make `save` return an error (simulates an unwritable cursor file)
    pub fail_save: bool,
}

impl MemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cursor(cursor: Cursor) -> Self {
        Self {
            cursor: Some(cursor),
            ..Self::default()
        }
    }
}

impl CursorStore for MemoryCursorStore {
    fn load(&self) -> StorageResult<Option<Cursor>> {
        if self.fail_load {
            return Err(simulated("cursor load"));
        }
        Ok(self.cursor)
    }

    fn save(&mut self, cursor: &Cursor) -> StorageResult<()> {
        if self.fail_save {
            return Err(simulated("cursor save"));
        }
        self.cursor = Some(*cursor);
        self.history.push(*cursor);
        Ok(())
    }
}

/// Record store backed by a vector
///
/// Rejects a second append of the same id, so a controller bug that would
/// duplicate a record surfaces as an error instead of silently passing.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    pub records: Vec<Record>,

    /// Fail every append once this many records are stored
    pub fail_after: Option<usize>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records,
            fail_after: None,
        }
    }

    pub fn ids(&self) -> Vec<i64> {
        self.records.iter().map(|r| r.id).collect()
    }
}

impl RecordStore for MemoryRecordStore {
    fn load_existing_ids(&self) -> StorageResult<IdIndex> {
        Ok(self.records.iter().map(|r| r.id).collect())
    }

    fn append(&mut self, record: &Record) -> StorageResult<()> {
        if self.fail_after.is_some_and(|limit| self.records.len() >= limit) {
            return Err(simulated("record append"));
        }
        if self.records.iter().any(|r| r.id == record.id) {
            return Err(StorageError::DuplicateId(record.id));
        }
        self.records.push(record.clone());
        Ok(())
    }
}

fn simulated(what: &str) -> StorageError {
    StorageError::Io(io::Error::new(
        io::ErrorKind::Other,
        format!("simulated {} failure", what),
    ))
}

//! Storage module for persisting harvest data
//!
//! This module handles everything the harvester keeps on disk:
//! - The append-only CSV dataset of records
//! - The JSON resume cursor
//! - The in-memory id index rebuilt from the dataset at startup

mod csv_store;
mod cursor_file;
mod id_index;
mod memory;
mod traits;

pub use csv_store::CsvRecordStore;
pub use cursor_file::JsonCursorStore;
pub use id_index::IdIndex;
pub use memory::{MemoryCursorStore, MemoryRecordStore};
pub use traits::{CursorStore, RecordStore, StorageError, StorageResult};

use crate::config::OutputConfig;

/// Opens the file-backed stores named by the output configuration
///
/// Nothing is created on disk until something is written.
pub fn open_stores(config: &OutputConfig) -> (JsonCursorStore, CsvRecordStore) {
    (
        JsonCursorStore::new(&config.cursor_path),
        CsvRecordStore::new(&config.records_path, config.schema),
    )
}

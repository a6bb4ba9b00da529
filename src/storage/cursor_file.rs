//! JSON file cursor store

use crate::model::Cursor;
use crate::storage::traits::{CursorStore, StorageResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Cursor persisted as a small pretty-printed JSON document
#[derive(Debug, Clone)]
pub struct JsonCursorStore {
    path: PathBuf,
}

impl JsonCursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CursorStore for JsonCursorStore {
    fn load(&self) -> StorageResult<Option<Cursor>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&mut self, cursor: &Cursor) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(cursor)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

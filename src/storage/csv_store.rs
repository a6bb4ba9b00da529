//! CSV record store
//!
//! The dataset is a plain CSV file opened in append mode. Every append is flushed
//! before returning so a crash never loses a record that was reported as written.

use crate::model::{Record, RecordSchema};
use crate::storage::traits::{RecordStore, StorageError, StorageResult};
use crate::storage::IdIndex;
use csv::{Reader, ReaderBuilder, Writer};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Append-only CSV dataset of harvested records
pub struct CsvRecordStore {
    path: PathBuf,
    schema: RecordSchema,
    writer: Option<Writer<File>>,
}

impl CsvRecordStore {
    /// Creates a store for the dataset at `path`
    ///
    /// Nothing is opened until the first append, so a run that finds no new
    /// records leaves the filesystem untouched.
    pub fn new(path: impl Into<PathBuf>, schema: RecordSchema) -> Self {
        Self {
            path: path.into(),
            schema,
            writer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> RecordSchema {
        self.schema
    }

    /// Reads every well-formed row back into a record
    ///
    /// Rows that are too short for the schema or whose id is not numeric are
    /// skipped. Content is decoded back to its original HTML. A header of another
    /// width is [`StorageError::SchemaMismatch`].
    pub fn read_records(&self) -> StorageResult<Vec<Record>> {
        let Some(mut reader) = self.open_reader()? else {
            return Ok(Vec::new());
        };

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            match self.schema.from_row(row.iter()) {
                Some(record) => records.push(record),
                None => tracing::debug!("Skipping malformed dataset row: {:?}", row),
            }
        }
        Ok(records)
    }

    /// Opens the dataset for reading and checks its header against the schema
    ///
    /// Returns `None` when the dataset does not exist yet. An empty file has no
    /// header and passes the check.
    fn open_reader(&self) -> StorageResult<Option<Reader<File>>> {
        let Some(file) = open_if_exists(&self.path)? else {
            return Ok(None);
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let found = reader.byte_headers()?.len();
        let expected = self.schema.column_count();
        if found != 0 && found != expected {
            tracing::error!(
                "Dataset {} has {} columns but the {} schema expects {}",
                self.path.display(),
                found,
                self.schema,
                expected
            );
            return Err(StorageError::SchemaMismatch { expected, found });
        }
        Ok(Some(reader))
    }

    /// Returns the append writer, opening the dataset on first use
    fn writer(&mut self) -> StorageResult<&mut Writer<File>> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => self.open_writer()?,
        };
        Ok(self.writer.insert(writer))
    }

    /// Opens the dataset for appending, writing the header if the file is empty
    fn open_writer(&self) -> StorageResult<Writer<File>> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let is_empty = file.metadata()?.len() == 0;
        if !is_empty {
            // The existing header must match the schema
            self.open_reader()?;
        }

        let mut writer = Writer::from_writer(file);
        if is_empty {
            writer.write_record(self.schema.header())?;
            writer.flush()?;
        }
        Ok(writer)
    }
}

impl RecordStore for CsvRecordStore {
    fn load_existing_ids(&self) -> StorageResult<IdIndex> {
        let Some(mut reader) = self.open_reader()? else {
            return Ok(IdIndex::new());
        };

        let mut index = IdIndex::new();
        for row in reader.byte_records() {
            let row = row?;
            let id = row
                .get(0)
                .and_then(|field| std::str::from_utf8(field).ok())
                .and_then(|field| field.trim().parse::<i64>().ok());
            if let Some(id) = id {
                index.insert(id);
            }
        }
        Ok(index)
    }

    fn append(&mut self, record: &Record) -> StorageResult<()> {
        let row = self.schema.to_row(record);
        let writer = self.writer()?;
        writer.write_record(&row)?;
        writer.flush()?;
        Ok(())
    }
}

fn open_if_exists(path: &Path) -> StorageResult<Option<File>> {
    match File::open(path) {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

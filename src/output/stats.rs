//! Statistics over the harvested dataset
//!
//! This module reads the dataset and cursor back from disk and summarizes
//! what has been collected so far.

use crate::config::OutputConfig;
use crate::model::{Cursor, Record};
use crate::storage::{open_stores, CursorStore, StorageError};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Dataset statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStatistics {
    /// Total number of well-formed rows
    pub total_records: usize,

    /// Number of distinct authors
    pub unique_authors: usize,

    /// Earliest parseable publication time
    pub earliest: Option<DateTime<Utc>>,

    /// Latest parseable publication time
    pub latest: Option<DateTime<Utc>>,

    /// Rows whose publication time could not be parsed
    pub unparseable_timestamps: usize,

    /// The saved resume cursor, if any
    pub cursor: Option<Cursor>,
}

impl DatasetStatistics {
    /// Summarizes `records` together with the saved cursor
    pub fn from_records(records: &[Record], cursor: Option<Cursor>) -> Self {
        let mut authors = HashSet::new();
        let mut earliest: Option<DateTime<Utc>> = None;
        let mut latest: Option<DateTime<Utc>> = None;
        let mut unparseable_timestamps = 0;

        for record in records {
            authors.insert(record.author.as_str());
            match record.published() {
                Ok(t) => {
                    earliest = Some(earliest.map_or(t, |e| e.min(t)));
                    latest = Some(latest.map_or(t, |l| l.max(t)));
                }
                Err(_) => unparseable_timestamps += 1,
            }
        }

        Self {
            total_records: records.len(),
            unique_authors: authors.len(),
            earliest,
            latest,
            unparseable_timestamps,
            cursor,
        }
    }
}

/// Loads statistics from the stores named by the output configuration
///
/// # Returns
///
/// * `Ok(DatasetStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - The dataset or the cursor could not be read
pub fn load_statistics(config: &OutputConfig) -> Result<DatasetStatistics, StorageError> {
    let (cursors, records) = open_stores(config);
    let rows = records.read_records()?;
    let cursor = cursors.load()?;
    Ok(DatasetStatistics::from_records(&rows, cursor))
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &DatasetStatistics) {
    println!("=== Dataset Statistics ===\n");

    println!("Overview:");
    println!("  Total records: {}", stats.total_records);
    println!("  Unique authors: {}", stats.unique_authors);
    println!();

    println!("Publication Range:");
    match (stats.earliest, stats.latest) {
        (Some(earliest), Some(latest)) => {
            println!("  Earliest: {}", earliest.to_rfc3339());
            println!("  Latest: {}", latest.to_rfc3339());
        }
        _ => println!("  (no parseable timestamps)"),
    }
    if stats.unparseable_timestamps > 0 {
        println!("  Unparseable timestamps: {}", stats.unparseable_timestamps);
    }
    println!();

    println!("Cursor:");
    match &stats.cursor {
        Some(cursor) => {
            println!("  Last page: {}", cursor.last_page);
            println!("  Last execution: {}", cursor.last_execution.to_rfc3339());
            println!("  Next run resumes ascending from page {}", cursor.resume_page());
        }
        None => println!("  (none, next run backfills)"),
    }
}

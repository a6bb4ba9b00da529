//! Harvest module: the resumable paginated ingestion engine
//!
//! This module contains the core harvesting logic, including:
//! - HTTP page fetching and decoding
//! - The fixed inter-request pause
//! - The ingestion controller (resume vs. backfill walk, dedup, cursor updates)

mod controller;
mod fetcher;
mod throttle;

pub use controller::{cutoff_before, Controller, HarvestSettings, RunMode, RunReport, StopReason};
pub use fetcher::{build_http_client, HttpPageFetcher, PageFetcher};
pub use throttle::Throttle;

use crate::config::Config;
use crate::storage::{open_stores, CsvRecordStore, JsonCursorStore};
use crate::HarvestError;

/// Controller wired to the live API and the file-backed stores
pub type FileController = Controller<HttpPageFetcher, JsonCursorStore, CsvRecordStore>;

/// Builds a controller from configuration
///
/// Scans the existing dataset to build the id index.
pub fn build_controller(config: &Config) -> Result<FileController, HarvestError> {
    let fetcher = HttpPageFetcher::new(&config.source)?;
    let (cursors, records) = open_stores(&config.output);
    Controller::new(
        fetcher,
        cursors,
        records,
        HarvestSettings::from_config(config),
    )
}

/// Runs a complete harvest
///
/// This is the main entry point for a run. It will:
/// 1. Load the ids already in the dataset
/// 2. Pick resume or backfill mode from the saved cursor
/// 3. Walk the remote pages, appending unseen records
/// 4. Advance the cursor as pages complete
///
/// # Returns
///
/// * `Ok(RunReport)` - The run stopped normally
/// * `Err(HarvestError)` - The run was aborted
pub async fn run_harvest(config: &Config) -> Result<RunReport, HarvestError> {
    tracing::info!("Dataset: {}", config.output.records_path);
    tracing::info!("Cursor: {}", config.output.cursor_path);

    let mut controller = build_controller(config)?;
    controller.run().await
}

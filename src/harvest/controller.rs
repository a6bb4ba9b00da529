//! Ingestion controller - resumable page walk orchestration
//!
//! This module contains the harvest state machine:
//!
//! ```text
//! Start -> { Resuming | Backfilling } -> Done | Aborted
//! ```
//!
//! - **Resuming** (a cursor exists): re-fetch `last_page`, then walk forward up to
//!   the reported `total_pages`, saving the cursor after every page.
//! - **Backfilling** (no cursor): discover the latest page from page 0, seed the
//!   cursor there, then walk backwards until a record at or before the cutoff.
//!
//! Records are always appended before the cursor that would skip past them is
//! saved. Any fetch error aborts the run; the saved cursor stays where it was.

use crate::config::Config;
use crate::harvest::fetcher::PageFetcher;
use crate::harvest::throttle::Throttle;
use crate::model::{Cursor, Page, Record};
use crate::storage::{CursorStore, IdIndex, RecordStore};
use crate::HarvestError;
use chrono::{DateTime, Months, Utc};
use std::fmt;
use std::time::Duration;

/// Which walk a run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Ascending walk from a saved cursor
    Resuming,

    /// One-off descending walk bounded by the cutoff
    Backfilling,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resuming => write!(f, "ascending"),
            Self::Backfilling => write!(f, "descending"),
        }
    }
}

/// Why a run stopped without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every page in range was processed
    Exhausted,

    /// A record at or before the backfill cutoff was seen
    CutoffReached { record_id: i64 },
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub mode: RunMode,
    pub pages_fetched: usize,
    pub records_appended: usize,
    pub last_page: Option<u64>,
    pub stop: StopReason,
}

impl RunReport {
    fn new(mode: RunMode) -> Self {
        Self {
            mode,
            pages_fetched: 0,
            records_appended: 0,
            last_page: None,
            stop: StopReason::Exhausted,
        }
    }
}

/// Controller settings taken from the configuration
#[derive(Debug, Clone, Copy)]
pub struct HarvestSettings {
    /// Pause between consecutive page requests
    pub request_delay: Duration,

    /// Backfill stops at records published this many months before run start
    pub cutoff_months: u32,
}

impl HarvestSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            request_delay: config.source.request_delay(),
            cutoff_months: config.backfill.cutoff_months,
        }
    }
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            request_delay: Duration::from_secs(1),
            cutoff_months: 1,
        }
    }
}

/// Drives one harvest run over a fetcher and a pair of stores
pub struct Controller<F, C, R> {
    fetcher: F,
    cursors: C,
    records: R,
    index: IdIndex,
    throttle: Throttle,
    cutoff_months: u32,
}

impl<F, C, R> Controller<F, C, R>
where
    F: PageFetcher,
    C: CursorStore,
    R: RecordStore,
{
    /// Creates a controller and builds the id index from the record store
    ///
    /// # Returns
    ///
    /// * `Ok(Controller)` - Ready to run
    /// * `Err(HarvestError)` - The existing dataset could not be scanned
    pub fn new(
        fetcher: F,
        cursors: C,
        records: R,
        settings: HarvestSettings,
    ) -> Result<Self, HarvestError> {
        let index = records.load_existing_ids()?;
        tracing::info!("Loaded {} existing record ids", index.len());

        Ok(Self {
            fetcher,
            cursors,
            records,
            index,
            throttle: Throttle::new(settings.request_delay),
            cutoff_months: settings.cutoff_months,
        })
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn cursors(&self) -> &C {
        &self.cursors
    }

    pub fn records(&self) -> &R {
        &self.records
    }

    pub fn index(&self) -> &IdIndex {
        &self.index
    }

    /// Hands the stores back, e.g. to start another run over the same data
    pub fn into_stores(self) -> (C, R) {
        (self.cursors, self.records)
    }

    /// Runs one harvest using the current wall-clock time
    pub async fn run(&mut self) -> Result<RunReport, HarvestError> {
        self.run_at(Utc::now()).await
    }

    /// Runs one harvest as if it started at `now`
    ///
    /// The mode is decided once from the cursor store and never changes mid-run.
    pub async fn run_at(&mut self, now: DateTime<Utc>) -> Result<RunReport, HarvestError> {
        match self.load_cursor() {
            Some(cursor) => self.resume(cursor).await,
            None => {
                let cutoff = cutoff_before(now, self.cutoff_months);
                self.backfill(cutoff).await
            }
        }
    }

    /// Loads the cursor; an unreadable cursor counts as no cursor
    fn load_cursor(&self) -> Option<Cursor> {
        match self.cursors.load() {
            Ok(cursor) => cursor,
            Err(e) => {
                tracing::warn!("Could not load cursor, starting a backfill instead: {}", e);
                None
            }
        }
    }

    async fn resume(&mut self, cursor: Cursor) -> Result<RunReport, HarvestError> {
        let initial = cursor.resume_page();
        tracing::info!(
            "Resuming from page {} (last execution {})",
            initial,
            cursor.last_execution.to_rfc3339()
        );

        let mut report = RunReport::new(RunMode::Resuming);

        // last_page is re-read: items may have landed on it since the last run
        let first = self.fetch_page(initial, &report).await?;
        let total_pages = first.total_pages;
        self.process_page(initial, &first, &mut report)?;

        for page in initial + 1..=total_pages {
            self.throttle.pause().await;
            let fetched = self.fetch_page(page, &report).await?;
            self.process_page(page, &fetched, &mut report)?;
            self.save_cursor(&Cursor::now(page));
        }

        tracing::info!(
            "Reached last reported page {}: {} new records over {} pages",
            total_pages,
            report.records_appended,
            report.pages_fetched
        );
        Ok(report)
    }

    async fn backfill(&mut self, cutoff: DateTime<Utc>) -> Result<RunReport, HarvestError> {
        tracing::info!(
            "No cursor found, backfilling back to {}",
            cutoff.to_rfc3339()
        );

        let mut report = RunReport::new(RunMode::Backfilling);

        let discovery = self.fetch_page(0, &report).await?;
        report.pages_fetched += 1;
        let latest = discovery.current_page;
        tracing::info!("Latest page reported by source: {}", latest);

        // Forward tracking starts here even if the backfill never finishes
        self.save_cursor(&Cursor::now(latest));

        for page in (0..=latest).rev() {
            self.throttle.pause().await;
            let fetched = self.fetch_page(page, &report).await?;
            report.pages_fetched += 1;
            report.last_page = Some(page);
            tracing::info!(
                "Page {}: items={} ({})",
                page,
                fetched.items.len(),
                report.mode
            );

            for record in &fetched.items {
                if self
                    .store_if_unseen(record)
                    .map_err(|e| aborted(e, &report))?
                {
                    report.records_appended += 1;
                }

                match record.published() {
                    Err(e) => {
                        tracing::debug!("Skipping cutoff check for record {}: {}", record.id, e);
                    }
                    Ok(published) if published <= cutoff => {
                        tracing::info!(
                            "Reached cutoff at record {} ({}), stopping",
                            record.id,
                            record.published_at
                        );
                        report.stop = StopReason::CutoffReached {
                            record_id: record.id,
                        };
                        return Ok(report);
                    }
                    Ok(_) => {}
                }
            }
        }

        tracing::info!(
            "Backfill reached page 0: {} new records over {} pages",
            report.records_appended,
            report.pages_fetched
        );
        Ok(report)
    }

    async fn fetch_page(&self, page: u64, report: &RunReport) -> Result<Page, HarvestError> {
        self.fetcher
            .fetch(page)
            .await
            .map_err(|e| aborted(e, report))
    }

    /// Appends every unseen record of an ascending page
    fn process_page(
        &mut self,
        page: u64,
        fetched: &Page,
        report: &mut RunReport,
    ) -> Result<(), HarvestError> {
        let mut appended = 0;
        for record in &fetched.items {
            if self
                .store_if_unseen(record)
                .map_err(|e| aborted(e, report))?
            {
                appended += 1;
            }
        }

        report.pages_fetched += 1;
        report.records_appended += appended;
        report.last_page = Some(page);
        tracing::info!(
            "Page {}: items={}, new={} ({})",
            page,
            fetched.items.len(),
            appended,
            report.mode
        );
        Ok(())
    }

    /// Appends `record` unless its id is already stored
    ///
    /// The id enters the index only once the append succeeded.
    fn store_if_unseen(&mut self, record: &Record) -> Result<bool, HarvestError> {
        if self.index.contains(record.id) {
            return Ok(false);
        }
        self.records.append(record)?;
        self.index.insert(record.id);
        tracing::debug!("Appended record {} by {}", record.id, record.author);
        Ok(true)
    }

    /// Saves the cursor; a failure is logged and the run carries on
    fn save_cursor(&mut self, cursor: &Cursor) {
        match self.cursors.save(cursor) {
            Ok(()) => tracing::debug!("Cursor advanced to page {}", cursor.last_page),
            Err(e) => tracing::warn!(
                "Could not save cursor at page {}, continuing: {}",
                cursor.last_page,
                e
            ),
        }
    }
}

/// Start of the backfill window: `months` calendar months before `now`
pub fn cutoff_before(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn aborted(err: HarvestError, report: &RunReport) -> HarvestError {
    tracing::error!(
        "Aborting {} run after {} pages and {} new records: {}",
        report.mode,
        report.pages_fetched,
        report.records_appended,
        err
    );
    err
}

//! Analyzer: the downstream classification pass over harvested records
//!
//! Picks, for every author active in the last few days, the comment with the
//! most negative votes, extracts its first JPEG/PNG image, and asks an image
//! classifier whether to flag it. Flagged authors are added to the block list.

mod blocklist;
mod classifier;
mod image;
mod posts;

pub use blocklist::BlockList;
pub use classifier::{download_image, GeminiClassifier, ImageClassifier};
pub use image::{extract_image, ImageMime, ImageRef};
pub use posts::{filter_recent, parse_timestamp, top_by_negative_votes};

use crate::config::Config;
use crate::harvest::build_http_client;
use crate::model::Record;
use crate::storage::CsvRecordStore;
use crate::HarvestError;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;

/// One record the classifier flagged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlaggedPost {
    pub author: String,
    pub record_id: i64,
    pub image_url: String,
}

/// Outcome of a classification pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisReport {
    /// Records selected for classification (one per author)
    pub candidates: usize,

    /// Candidates without a JPEG/PNG image
    pub without_image: usize,

    /// Candidates whose image could not be downloaded
    pub download_failures: usize,

    pub clean: usize,
    pub flagged: Vec<FlaggedPost>,

    /// Authors added to the block list by this pass
    pub newly_blocked: Vec<String>,

    /// The classifier failed and the remaining candidates were not examined
    pub interrupted: bool,
}

/// Runs the classification pass over `records`
///
/// Only records published after `since` by authors not yet blocked are
/// considered. A classifier error stops the pass; a download error only skips
/// the record at hand.
pub async fn analyze_records<C>(
    records: &[Record],
    blocklist: &mut BlockList,
    classifier: &C,
    client: &Client,
    since: DateTime<Utc>,
) -> Result<AnalysisReport, HarvestError>
where
    C: ImageClassifier + ?Sized,
{
    let recent = filter_recent(records, blocklist, since);
    let candidates = top_by_negative_votes(&recent);
    tracing::info!(
        "{} recent records, {} candidates (one per author)",
        recent.len(),
        candidates.len()
    );

    let mut report = AnalysisReport {
        candidates: candidates.len(),
        ..AnalysisReport::default()
    };

    for record in candidates {
        let Some(image) = extract_image(&record.content) else {
            report.without_image += 1;
            continue;
        };

        let bytes = match download_image(client, &image.url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("{}", e);
                report.download_failures += 1;
                continue;
            }
        };

        let flagged = match classifier.classify(&bytes, image.mime).await {
            Ok(flagged) => flagged,
            Err(e) => {
                tracing::error!("Classifier failed on record {}: {}", record.id, e);
                report.interrupted = true;
                break;
            }
        };

        if !flagged {
            tracing::info!(
                "Author {}, record {}, image {} is clean",
                record.author,
                record.id,
                image.url
            );
            report.clean += 1;
            continue;
        }

        tracing::info!(
            "Author {}, record {}, image {} is flagged",
            record.author,
            record.id,
            image.url
        );
        match blocklist.block(&record.author) {
            Ok(true) => {
                tracing::info!("Author {} added to the block list", record.author);
                report.newly_blocked.push(record.author.clone());
            }
            Ok(false) => {}
            Err(e) => tracing::warn!("Could not block author {}: {}", record.author, e),
        }
        report.flagged.push(FlaggedPost {
            author: record.author.clone(),
            record_id: record.id,
            image_url: image.url,
        });
    }

    Ok(report)
}

/// Runs the classification pass configured in `config`
///
/// Reads the dataset back, loads the block list, and classifies with Gemini.
pub async fn run_analysis(config: &Config) -> Result<AnalysisReport, HarvestError> {
    let store = CsvRecordStore::new(&config.output.records_path, config.output.schema);
    let records = store.read_records()?;
    tracing::info!(
        "Read {} records from {}",
        records.len(),
        store.path().display()
    );

    let mut blocklist = BlockList::load(&config.analyzer.blocklist_path)?;
    tracing::info!("{} authors already blocked", blocklist.len());

    let classifier = GeminiClassifier::from_env(&config.analyzer)?;
    let client = build_http_client(&config.source)?;
    let since = Utc::now() - Duration::days(i64::from(config.analyzer.recent_days));

    let report = analyze_records(&records, &mut blocklist, &classifier, &client, since).await?;
    tracing::info!(
        "Analysis done: {} candidates, {} flagged, {} clean, {} newly blocked",
        report.candidates,
        report.flagged.len(),
        report.clean,
        report.newly_blocked.len()
    );
    Ok(report)
}

//! Comment-Harvest: a resumable harvester for paginated comment feeds
//!
//! This crate walks a remote, time-ordered comment API page by page and appends
//! every record it has not seen before to a local CSV dataset. A small JSON cursor
//! lets later runs resume forward instead of starting over, and a one-off backward
//! backfill bounded by a time cutoff seeds the dataset on the very first run.

pub mod analyze;
pub mod config;
pub mod harvest;
pub mod model;
pub mod output;
pub mod storage;

use thiserror::Error;

/// Main error type for Comment-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Request for page {page} failed: {source}")]
    Transport { page: u64, source: reqwest::Error },

    #[error("Page {page} returned HTTP {status}")]
    Status { page: u64, status: u16 },

    #[error("Page {page} could not be decoded: {source}")]
    Decode {
        page: u64,
        source: serde_json::Error,
    },

    #[error("Page {page} carried no data block")]
    MissingData { page: u64 },

    #[error("Unparseable timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        source: chrono::ParseError,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Image download from {url} failed: {message}")]
    ImageDownload { url: String, message: String },

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    /// Returns true for the errors a page fetch can produce
    ///
    /// Any of these aborts the current run.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Status { .. } | Self::Decode { .. } | Self::MissingData { .. }
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Comment-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use harvest::{run_harvest, Controller, RunMode, RunReport, StopReason};
pub use model::{Cursor, Page, Record, RecordSchema};
pub use storage::IdIndex;

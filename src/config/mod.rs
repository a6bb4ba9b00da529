//! Configuration module for Comment-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use comment_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Harvesting from: {}", config.source.endpoint);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{AnalyzerConfig, BackfillConfig, Config, OutputConfig, SourceConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};

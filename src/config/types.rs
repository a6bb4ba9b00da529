use crate::model::RecordSchema;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Comment-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub backfill: BackfillConfig,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
}

/// Remote comment API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Base endpoint; `order` and `page` query parameters are appended per request
    pub endpoint: String,

    /// Optional Referer header sent with every page request
    #[serde(default)]
    pub referer: Option<String>,

    /// User-Agent header sent with every page request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,

    /// Fixed pause between consecutive page requests (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SourceConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the append-only CSV dataset
    #[serde(rename = "records-path")]
    pub records_path: String,

    /// Path to the JSON resume cursor
    #[serde(rename = "cursor-path")]
    pub cursor_path: String,

    /// Column set written to the dataset
    #[serde(default)]
    pub schema: RecordSchema,
}

/// Initial backfill configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BackfillConfig {
    /// How far back (in calendar months) the first run walks
    #[serde(rename = "cutoff-months", default = "default_cutoff_months")]
    pub cutoff_months: u32,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            cutoff_months: default_cutoff_months(),
        }
    }
}

/// Image classification pass configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    /// File with one blocked author per line
    #[serde(rename = "blocklist-path", default = "default_blocklist_path")]
    pub blocklist_path: String,

    /// Only records newer than this many days are considered
    #[serde(rename = "recent-days", default = "default_recent_days")]
    pub recent_days: u32,

    /// Generative model used to classify images
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(rename = "api-key-env", default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(rename = "api-base", default = "default_api_base")]
    pub api_base: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            blocklist_path: default_blocklist_path(),
            recent_days: default_recent_days(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            api_base: default_api_base(),
        }
    }
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cutoff_months() -> u32 {
    1
}

fn default_blocklist_path() -> String {
    "blocked_users.txt".to_string()
}

fn default_recent_days() -> u32 {
    3
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

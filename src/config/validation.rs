use crate::config::types::{AnalyzerConfig, BackfillConfig, Config, OutputConfig, SourceConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_output_config(&config.output)?;
    validate_backfill_config(&config.backfill)?;
    validate_analyzer_config(&config.analyzer)?;
    Ok(())
}

/// Validates the remote source configuration
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let endpoint = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid endpoint: {}", e)))?;

    if endpoint.scheme() != "https" && endpoint.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "endpoint must use http or https, got '{}'",
            endpoint.scheme()
        )));
    }

    // order/page are appended per request
    if endpoint.query().is_some() {
        return Err(ConfigError::Validation(format!(
            "endpoint must not carry a query string, got '{}'",
            config.endpoint
        )));
    }

    if let Some(referer) = &config.referer {
        Url::parse(referer)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid referer: {}", e)))?;
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.records_path.is_empty() {
        return Err(ConfigError::Validation(
            "records_path cannot be empty".to_string(),
        ));
    }

    if config.cursor_path.is_empty() {
        return Err(ConfigError::Validation(
            "cursor_path cannot be empty".to_string(),
        ));
    }

    if config.records_path == config.cursor_path {
        return Err(ConfigError::Validation(
            "records_path and cursor_path must differ".to_string(),
        ));
    }

    Ok(())
}

fn validate_backfill_config(config: &BackfillConfig) -> Result<(), ConfigError> {
    if config.cutoff_months < 1 {
        return Err(ConfigError::Validation(format!(
            "cutoff_months must be >= 1, got {}",
            config.cutoff_months
        )));
    }
    Ok(())
}

fn validate_analyzer_config(config: &AnalyzerConfig) -> Result<(), ConfigError> {
    if config.blocklist_path.is_empty() {
        return Err(ConfigError::Validation(
            "blocklist_path cannot be empty".to_string(),
        ));
    }

    if config.recent_days < 1 {
        return Err(ConfigError::Validation(format!(
            "recent_days must be >= 1, got {}",
            config.recent_days
        )));
    }

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation("model cannot be empty".to_string()));
    }

    if config.api_key_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "api_key_env cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.api_base)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api_base: {}", e)))?;

    Ok(())
}

//! Image classification collaborator
//!
//! The classifier is an external oracle: it receives image bytes plus a MIME type
//! and answers whether the image should be flagged. `GeminiClassifier` asks the
//! Gemini `generateContent` REST endpoint a yes/no question.

use crate::analyze::ImageMime;
use crate::config::AnalyzerConfig;
use crate::{ConfigError, HarvestError};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Decides whether an image should be flagged
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    async fn classify(&self, image: &[u8], mime: ImageMime) -> Result<bool, HarvestError>;
}

const PROMPT: &str = "Answer with only 'yes' or 'no'. Is the image a screenshot from a social \
media platform? Does text in the image incite gender conflict? Does the image contain \
content that may be unsettling (for example snakes or spiders)?";

/// Classifier backed by Gemini's `generateContent` API
pub struct GeminiClassifier {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClassifier {
    /// Builds a classifier reading the API key from `config.api_key_env`
    pub fn from_env(config: &AnalyzerConfig) -> Result<Self, HarvestError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "environment variable {} is not set",
                    config.api_key_env
                ))
            })?;
        Self::new(config, api_key)
    }

    pub fn new(config: &AnalyzerConfig, api_key: impl Into<String>) -> Result<Self, HarvestError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()?;
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.api_base.trim_end_matches('/'),
            config.model
        );
        Ok(Self {
            http,
            endpoint,
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Inline { inline_data: InlineData<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Deserialize)]
struct TextPart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of every candidate part
    fn text(&self) -> String {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect()
    }
}

#[async_trait]
impl ImageClassifier for GeminiClassifier {
    async fn classify(&self, image: &[u8], mime: ImageMime) -> Result<bool, HarvestError> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Inline {
                        inline_data: InlineData {
                            mime_type: mime.as_str(),
                            data: STANDARD.encode(image),
                        },
                    },
                    Part::Text { text: PROMPT },
                ],
            }],
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HarvestError::Classifier(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| HarvestError::Classifier(format!("undecodable response: {}", e)))?;
        let answer = parsed.text();
        tracing::debug!("Classifier answered '{}'", answer.trim());

        Ok(answer.to_lowercase().contains("yes"))
    }
}

/// Downloads an image referenced by a comment
pub async fn download_image(client: &Client, url: &str) -> Result<Vec<u8>, HarvestError> {
    let failed = |message: String| HarvestError::ImageDownload {
        url: url.to_string(),
        message,
    };

    let response = client
        .get(url)
        .header(ACCEPT, "image/avif,image/webp,image/apng,image/*,*/*;q=0.8")
        .send()
        .await
        .map_err(|e| failed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(failed(format!("HTTP {}", status.as_u16())));
    }

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
    Ok(bytes.to_vec())
}

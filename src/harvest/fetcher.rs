//! HTTP page fetcher
//!
//! This module handles every request the harvester makes to the comment API:
//! - Building an HTTP client with the headers the source expects
//! - Building the per-page URL (`order=desc&page=<n>`)
//! - Classifying failures as transport, status or decode errors
//!
//! There is no retry logic here. A failed page aborts the run and the next run
//! resumes from the saved cursor.

use crate::config::SourceConfig;
use crate::model::Page;
use crate::{ConfigError, HarvestError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Source of decoded API pages
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches and decodes one page
    ///
    /// # Returns
    ///
    /// * `Ok(Page)` - The decoded page
    /// * `Err(HarvestError)` - `Transport`, `Status`, `Decode` or `MissingData`
    async fn fetch(&self, page: u64) -> Result<Page, HarvestError>;
}

/// Builds an HTTP client carrying the headers the comment API expects
///
/// gzip response bodies are decompressed transparently. Any other
/// `Content-Encoding` is handed to the decoder untouched.
///
/// # Example
///
/// ```no_run
/// use comment_harvest::config::SourceConfig;
/// use comment_harvest::harvest::build_http_client;
///
/// let config = SourceConfig {
///     endpoint: "https://jandan.net/api/comment/post/26402".to_string(),
///     referer: Some("https://jandan.net/pic".to_string()),
///     user_agent: "Mozilla/5.0".to_string(),
///     accept_language: "en-US,en;q=0.9".to_string(),
///     request_delay_ms: 1000,
///     timeout_secs: 30,
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &SourceConfig) -> Result<Client, HarvestError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(ACCEPT_LANGUAGE, header_value(&config.accept_language)?);
    if let Some(referer) = &config.referer {
        headers.insert(REFERER, header_value(referer)?);
    }

    let client = Client::builder()
        .user_agent(header_value(&config.user_agent)?)
        .default_headers(headers)
        .timeout(config.timeout())
        .connect_timeout(config.timeout().min(Duration::from_secs(10)))
        .gzip(true)
        .build()?;
    Ok(client)
}

fn header_value(value: &str) -> Result<HeaderValue, HarvestError> {
    HeaderValue::from_str(value).map_err(|_| {
        ConfigError::Validation(format!("'{}' is not a valid header value", value)).into()
    })
}

/// Fetches pages from the live comment API
pub struct HttpPageFetcher {
    client: Client,
    endpoint: Url,
}

impl HttpPageFetcher {
    pub fn new(config: &SourceConfig) -> Result<Self, HarvestError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid endpoint: {}", e)))?;
        let client = build_http_client(config)?;
        Ok(Self::with_client(client, endpoint))
    }

    pub fn with_client(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    /// URL of one page of the descending feed
    pub fn page_url(&self, page: u64) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("order", "desc")
            .append_pair("page", &page.to_string());
        url
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, page: u64) -> Result<Page, HarvestError> {
        let url = self.page_url(page);
        tracing::debug!("Fetching page {}: {}", page, url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| HarvestError::Transport { page, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Status {
                page,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| HarvestError::Transport { page, source })?;

        Page::from_body(page, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use wiremock::matchers::{header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config(endpoint: &str) -> SourceConfig {
        SourceConfig {
            endpoint: endpoint.to_string(),
            referer: Some("https://jandan.net/pic".to_string()),
            user_agent: "TestHarvester/1.0".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            request_delay_ms: 0,
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_build_http_client() {
        let config = create_test_config("https://jandan.net/api/comment/post/26402");
        assert!(build_http_client(&config).is_ok());
    }

    #[test]
    fn test_invalid_header_value_is_config_error() {
        let mut config = create_test_config("https://jandan.net/api/comment/post/26402");
        config.user_agent = "bad\nagent".to_string();
        assert!(matches!(
            build_http_client(&config),
            Err(HarvestError::Config(ConfigError::Validation(_)))
        ));
    }

    #[test]
    fn test_page_url() {
        let config = create_test_config("https://jandan.net/api/comment/post/26402");
        let fetcher = HttpPageFetcher::new(&config).unwrap();
        assert_eq!(
            fetcher.page_url(12).as_str(),
            "https://jandan.net/api/comment/post/26402?order=desc&page=12"
        );
    }

    #[tokio::test]
    async fn test_fetch_sends_source_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/comment/post/1"))
            .and(query_param("order", "desc"))
            .and(query_param("page", "3"))
            .and(header("referer", "https://jandan.net/pic"))
            .and(header("user-agent", "TestHarvester/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"code":0,"msg":"ok","data":{"total":1,"total_pages":3,"current_page":3,
                    "list":[{"id":1,"author":"a","date_gmt":"2025-12-11T10:14:36+08:00","content":"x"}]}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let config = create_test_config(&format!("{}/api/comment/post/1", server.uri()));
        let fetcher = HttpPageFetcher::new(&config).unwrap();
        let page = fetcher.fetch(3).await.unwrap();

        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_decompresses_gzip_body() {
        let body = r#"{"code":0,"msg":"ok","data":{"total":2,"total_pages":4,"current_page":4,
            "list":[{"id":7,"author":"a","date_gmt":"2025-12-11T10:14:36+08:00","content":"<p>x</p>"},
                    {"id":8,"author":"b","date_gmt":"2025-12-11T10:15:00+08:00","content":"y"}]}}"#;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(body.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_exists("accept-encoding"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-encoding", "gzip")
                    .insert_header("content-type", "application/json")
                    .set_body_bytes(compressed),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = create_test_config(&format!("{}/api", server.uri()));
        let fetcher = HttpPageFetcher::new(&config).unwrap();
        let page = fetcher.fetch(0).await.unwrap();

        assert_eq!(page.total_pages, 4);
        let ids: Vec<i64> = page.items.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![7, 8]);
        assert_eq!(page.items[0].content, "<p>x</p>");
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let config = create_test_config(&format!("{}/api", server.uri()));
        let fetcher = HttpPageFetcher::new(&config).unwrap();

        assert!(matches!(
            fetcher.fetch(0).await,
            Err(HarvestError::Status {
                page: 0,
                status: 503
            })
        ));
    }

    #[tokio::test]
    async fn test_fetch_undecodable_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>captcha</html>"))
            .mount(&server)
            .await;

        let config = create_test_config(&format!("{}/api", server.uri()));
        let fetcher = HttpPageFetcher::new(&config).unwrap();

        let err = fetcher.fetch(1).await.unwrap_err();
        assert!(matches!(err, HarvestError::Decode { page: 1, .. }));
        assert!(err.is_fetch_error());
    }

    #[tokio::test]
    async fn test_fetch_transport_error() {
        // Nothing listens on the discard port
        let config = create_test_config("http://127.0.0.1:9/api");
        let fetcher = HttpPageFetcher::new(&config).unwrap();

        assert!(matches!(
            fetcher.fetch(0).await,
            Err(HarvestError::Transport { page: 0, .. })
        ));
    }
}

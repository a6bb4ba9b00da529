/// Decoded API pages
use crate::model::Record;
use crate::HarvestError;
use serde::Deserialize;

/// Top-level envelope returned by the comment API
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub code: i64,

    #[serde(default)]
    pub msg: String,

    #[serde(default)]
    pub data: Option<Page>,
}

/// One fetched batch of records
///
/// Page 0 with `order=desc` holds the most recent items; higher page numbers move
/// forward in time. A page is never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub total: u64,

    #[serde(default)]
    pub total_pages: u64,

    /// The source's notion of the latest page index
    #[serde(default)]
    pub current_page: u64,

    #[serde(rename = "list", default)]
    pub items: Vec<Record>,
}

impl Page {
    /// Decodes a response body for the given page index in a single pass
    pub fn from_body(page: u64, body: &[u8]) -> Result<Self, HarvestError> {
        let response: ApiResponse =
            serde_json::from_slice(body).map_err(|source| HarvestError::Decode { page, source })?;

        if response.code != 0 {
            tracing::debug!(
                "Page {} reported code {} ({})",
                page,
                response.code,
                response.msg
            );
        }

        response.data.ok_or(HarvestError::MissingData { page })
    }
}

/// Harvested record definitions and the dataset column layouts
use crate::HarvestError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

/// One harvested comment
///
/// `id` is assigned by the remote source and is the only deduplication key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Record {
    pub id: i64,

    #[serde(default)]
    pub author: String,

    /// Publication timestamp in the source's native format
    #[serde(rename = "date_gmt", default)]
    pub published_at: String,

    #[serde(default)]
    pub vote_negative: Option<i64>,

    #[serde(default)]
    pub vote_positive: Option<i64>,

    /// Raw HTML body as delivered by the source
    #[serde(default)]
    pub content: String,
}

impl Record {
    /// Parses `published_at` as an RFC 3339 timestamp
    ///
    /// The source emits values such as `2025-12-11T10:14:36+08:00`.
    pub fn published(&self) -> Result<DateTime<Utc>, HarvestError> {
        DateTime::parse_from_rfc3339(&self.published_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|source| HarvestError::Timestamp {
                value: self.published_at.clone(),
                source,
            })
    }
}

/// Column layout of the CSV dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSchema {
    /// `id,author,date_gmt,content`
    Minimal,

    /// `id,author,date_gmt,vote_negative,vote_positive,content`
    #[default]
    Full,
}

impl RecordSchema {
    /// Header row written to an empty dataset
    pub fn header(&self) -> &'static [&'static str] {
        match self {
            Self::Minimal => &["id", "author", "date_gmt", "content"],
            Self::Full => &[
                "id",
                "author",
                "date_gmt",
                "vote_negative",
                "vote_positive",
                "content",
            ],
        }
    }

    pub fn column_count(&self) -> usize {
        self.header().len()
    }

    /// Encodes a record as one dataset row
    ///
    /// Missing vote counters are written as `0` in the full layout.
    pub fn to_row(&self, record: &Record) -> Vec<String> {
        let mut row = vec![
            record.id.to_string(),
            record.author.clone(),
            record.published_at.clone(),
        ];
        if *self == Self::Full {
            row.push(record.vote_negative.unwrap_or(0).to_string());
            row.push(record.vote_positive.unwrap_or(0).to_string());
        }
        row.push(encode_content(&record.content));
        row
    }

    /// Decodes a dataset row back into a record
    ///
    /// Returns `None` for rows that are too short or carry a non-numeric id.
    /// Unparseable vote counters read as `0`.
    pub fn from_row<'a, I>(&self, fields: I) -> Option<Record>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let fields: Vec<&str> = fields.into_iter().collect();
        if fields.len() < self.column_count() {
            return None;
        }

        let id = fields[0].trim().parse().ok()?;
        let (vote_negative, vote_positive, content) = match self {
            Self::Minimal => (None, None, fields[3]),
            Self::Full => (
                Some(fields[3].trim().parse().unwrap_or(0)),
                Some(fields[4].trim().parse().unwrap_or(0)),
                fields[5],
            ),
        };

        Some(Record {
            id,
            author: fields[1].to_string(),
            published_at: fields[2].to_string(),
            vote_negative,
            vote_positive,
            content: decode_content(content),
        })
    }
}

impl fmt::Display for RecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minimal => write!(f, "minimal"),
            Self::Full => write!(f, "full"),
        }
    }
}

/// Encodes content for storage: newlines become a literal `\n`, then HTML is escaped
pub fn encode_content(content: &str) -> String {
    let flattened = content.replace('\n', "\\n");
    html_escape::encode_quoted_attribute(&flattened).into_owned()
}

/// Reverses [`encode_content`]
///
/// The round trip is lossy for content that already holds a literal backslash
/// followed by `n`: it comes back as a real newline.
pub fn decode_content(stored: &str) -> String {
    html_escape::decode_html_entities(stored).replace("\\n", "\n")
}

//! Candidate selection for the classification pass

use crate::analyze::BlockList;
use crate::model::Record;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashMap;

/// Parses a dataset timestamp
///
/// Accepts `YYYY-MM-DD HH:MM:SS` (taken as UTC), RFC 3339, and a bare
/// `YYYY-MM-DD` date (midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Keeps records published strictly after `since` by authors not on the block list
///
/// Records with an unparseable timestamp are dropped.
pub fn filter_recent<'a>(
    records: &'a [Record],
    blocklist: &BlockList,
    since: DateTime<Utc>,
) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|record| {
            if blocklist.contains(&record.author) {
                tracing::debug!("Skipping blocked author {}", record.author);
                return false;
            }
            parse_timestamp(&record.published_at).is_some_and(|t| t > since)
        })
        .collect()
}

/// Picks each author's record with the most negative votes
///
/// Ties keep the record seen first. Authors appear in order of their first record.
/// Missing vote counters count as 0.
pub fn top_by_negative_votes<'a>(records: &[&'a Record]) -> Vec<&'a Record> {
    let mut order: Vec<&str> = Vec::new();
    let mut best: HashMap<&str, &'a Record> = HashMap::new();

    for &record in records {
        let author = record.author.as_str();
        let replace = match best.get(author) {
            None => {
                order.push(author);
                true
            }
            Some(current) => negative_votes(record) > negative_votes(current),
        };
        if replace {
            best.insert(author, record);
        }
    }

    order
        .into_iter()
        .filter_map(|author| best.get(author).copied())
        .collect()
}

fn negative_votes(record: &Record) -> i64 {
    record.vote_negative.unwrap_or(0)
}

/// Resume cursor persisted between runs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the next ascending run picks up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Time of the last successful save
    pub last_execution: DateTime<Utc>,

    /// Last page index processed
    pub last_page: i64,
}

impl Cursor {
    /// Creates a cursor for `page` stamped with the current time
    pub fn now(page: u64) -> Self {
        Self::at(Utc::now(), page)
    }

    pub fn at(last_execution: DateTime<Utc>, page: u64) -> Self {
        Self {
            last_execution,
            last_page: i64::try_from(page).unwrap_or(i64::MAX),
        }
    }

    /// Page the next run starts from
    ///
    /// This is `last_page` itself, never `last_page + 1`: the page may have grown
    /// since it was last read. Negative values clamp to 0.
    pub fn resume_page(&self) -> u64 {
        u64::try_from(self.last_page).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_page_is_last_page() {
        let cursor = Cursor::now(5);
        assert_eq!(cursor.resume_page(), 5);
    }

    #[test]
    fn test_resume_page_clamps_negative() {
        let cursor = Cursor {
            last_execution: Utc::now(),
            last_page: -3,
        };
        assert_eq!(cursor.resume_page(), 0);
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{"last_execution": "2025-12-11T10:14:36.5+08:00", "last_page": 812}"#;
        let cursor: Cursor = serde_json::from_str(json).unwrap();
        assert_eq!(cursor.last_page, 812);
        assert_eq!(
            cursor.last_execution.to_rfc3339(),
            "2025-12-11T02:14:36.500+00:00"
        );

        let value = serde_json::to_value(cursor).unwrap();
        assert!(value.get("last_execution").unwrap().is_string());
        assert_eq!(value.get("last_page").unwrap().as_i64(), Some(812));
    }
}

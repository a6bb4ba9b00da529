//! Integration tests for the harvester
//!
//! These tests use wiremock to stand up the comment API (and the classifier
//! endpoint) and run the full harvest cycle against file-backed stores.

use chrono::{Duration, SecondsFormat, Utc};
use comment_harvest::analyze::{analyze_records, BlockList, GeminiClassifier};
use comment_harvest::config::{AnalyzerConfig, BackfillConfig, Config, OutputConfig, SourceConfig};
use comment_harvest::storage::{
    CsvRecordStore, CursorStore, JsonCursorStore, RecordStore, StorageError,
};
use comment_harvest::{run_harvest, Cursor, HarvestError, Record, RecordSchema, RunMode, StopReason};
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FEED_PATH: &str = "/api/comment/post/26402";

/// Creates a test configuration pointing at the mock server
fn create_test_config(server_uri: &str, dir: &Path) -> Config {
    Config {
        source: SourceConfig {
            endpoint: format!("{}{}", server_uri, FEED_PATH),
            referer: Some("https://jandan.net/pic".to_string()),
            user_agent: "TestHarvester/1.0".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            request_delay_ms: 0,
            timeout_secs: 5,
        },
        output: OutputConfig {
            records_path: dir.join("data/user_activity.csv").display().to_string(),
            cursor_path: dir.join("data/history.json").display().to_string(),
            schema: RecordSchema::Full,
        },
        backfill: BackfillConfig { cutoff_months: 1 },
        analyzer: AnalyzerConfig {
            blocklist_path: dir.join("blocked_users.txt").display().to_string(),
            api_base: server_uri.to_string(),
            ..AnalyzerConfig::default()
        },
    }
}

/// Timestamp `days` days before now, in the source's RFC 3339 form
fn days_ago(days: i64) -> String {
    (Utc::now() - Duration::days(days)).to_rfc3339_opts(SecondsFormat::Secs, false)
}

fn item(id: i64, author: &str, date_gmt: &str, content: &str) -> Value {
    json!({
        "id": id,
        "author": author,
        "date_gmt": date_gmt,
        "vote_negative": id % 5,
        "vote_positive": 10,
        "content": content,
    })
}

fn page_body(current_page: u64, total_pages: u64, items: Vec<Value>) -> Value {
    json!({
        "code": 0,
        "msg": "success",
        "data": {
            "total": 100,
            "total_pages": total_pages,
            "current_page": current_page,
            "list": items,
        }
    })
}

async fn mount_page(server: &MockServer, page: u64, body: Value) {
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .and(query_param("order", "desc"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn stored_ids(config: &Config) -> Vec<i64> {
    CsvRecordStore::new(&config.output.records_path, config.output.schema)
        .read_records()
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect()
}

fn saved_cursor(config: &Config) -> Option<Cursor> {
    JsonCursorStore::new(&config.output.cursor_path)
        .load()
        .unwrap()
}

#[tokio::test]
async fn test_first_run_backfills_until_cutoff() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());

    // Discovery only: the walk stops at the cutoff before reaching page 0 again
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(
            2,
            2,
            vec![item(9, "zed", &days_ago(0), "<p>newest</p>")],
        )))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(
        &mock_server,
        2,
        page_body(
            2,
            2,
            vec![
                item(1, "alice", &days_ago(1), "<p>one</p>"),
                item(2, "bob", &days_ago(2), "<p>two</p>"),
            ],
        ),
    )
    .await;
    mount_page(
        &mock_server,
        1,
        page_body(
            2,
            2,
            vec![
                item(3, "alice", &days_ago(10), "<p>three</p>"),
                item(4, "carol", &days_ago(60), "<p>old</p>"),
                item(5, "dave", &days_ago(3), "<p>never read</p>"),
            ],
        ),
    )
    .await;

    let report = run_harvest(&config).await.unwrap();

    assert_eq!(report.mode, RunMode::Backfilling);
    assert_eq!(report.stop, StopReason::CutoffReached { record_id: 4 });
    assert_eq!(report.records_appended, 4);
    assert_eq!(report.last_page, Some(1));
    assert_eq!(stored_ids(&config), vec![1, 2, 3, 4]);

    // Seeded from discovery so later runs resume forward from the newest page
    assert_eq!(saved_cursor(&config).map(|c| c.last_page), Some(2));
}

#[tokio::test]
async fn test_second_run_resumes_without_duplicates() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());

    mount_page(&mock_server, 0, page_body(1, 1, vec![])).await;
    mount_page(
        &mock_server,
        1,
        page_body(
            1,
            1,
            vec![
                item(1, "alice", &days_ago(1), "<p>one</p>"),
                item(2, "bob", &days_ago(2), "<p>two</p>"),
            ],
        ),
    )
    .await;

    let first = run_harvest(&config).await.unwrap();
    assert_eq!(first.mode, RunMode::Backfilling);
    assert_eq!(first.stop, StopReason::Exhausted);
    assert_eq!(first.records_appended, 2);
    let cursor = saved_cursor(&config).unwrap();
    assert_eq!(cursor.last_page, 1);

    let second = run_harvest(&config).await.unwrap();
    assert_eq!(second.mode, RunMode::Resuming);
    assert_eq!(second.records_appended, 0);
    assert_eq!(second.pages_fetched, 1);
    assert_eq!(stored_ids(&config), vec![1, 2]);

    // Nothing past the re-read page, so the cursor is left alone
    assert_eq!(saved_cursor(&config), Some(cursor));
}

#[tokio::test]
async fn test_resume_walks_forward_from_saved_cursor() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());

    let mut records = CsvRecordStore::new(&config.output.records_path, config.output.schema);
    let existing = Record {
        id: 10,
        author: "alice".to_string(),
        published_at: days_ago(5),
        vote_negative: Some(0),
        vote_positive: Some(1),
        content: "<p>already here</p>".to_string(),
    };
    records.append(&existing).unwrap();
    drop(records);
    JsonCursorStore::new(&config.output.cursor_path)
        .save(&Cursor::now(1))
        .unwrap();

    mount_page(
        &mock_server,
        1,
        page_body(
            3,
            3,
            vec![
                item(10, "alice", &days_ago(5), "<p>already here</p>"),
                item(11, "bob", &days_ago(4), "<p>late arrival</p>"),
            ],
        ),
    )
    .await;
    mount_page(
        &mock_server,
        2,
        page_body(3, 3, vec![item(12, "carol", &days_ago(3), "<p>twelve</p>")]),
    )
    .await;
    mount_page(
        &mock_server,
        3,
        page_body(3, 3, vec![item(13, "dave", &days_ago(2), "<p>a\nb</p>")]),
    )
    .await;

    let report = run_harvest(&config).await.unwrap();

    assert_eq!(report.mode, RunMode::Resuming);
    assert_eq!(report.pages_fetched, 3);
    assert_eq!(report.records_appended, 3);
    assert_eq!(report.last_page, Some(3));
    assert_eq!(stored_ids(&config), vec![10, 11, 12, 13]);
    assert_eq!(saved_cursor(&config).map(|c| c.last_page), Some(3));

    let stored = CsvRecordStore::new(&config.output.records_path, config.output.schema)
        .read_records()
        .unwrap();
    assert_eq!(stored[3].content, "<p>a\nb</p>");
}

#[tokio::test]
async fn test_fetch_error_aborts_and_keeps_cursor() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());

    JsonCursorStore::new(&config.output.cursor_path)
        .save(&Cursor::now(1))
        .unwrap();

    mount_page(
        &mock_server,
        1,
        page_body(2, 2, vec![item(20, "alice", &days_ago(1), "<p>x</p>")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;

    let err = run_harvest(&config).await.unwrap_err();
    assert!(matches!(
        err,
        HarvestError::Status {
            page: 2,
            status: 502
        }
    ));
    assert!(err.is_fetch_error());

    // Records seen before the failure are kept, the cursor does not move
    assert_eq!(stored_ids(&config), vec![20]);
    assert_eq!(saved_cursor(&config).map(|c| c.last_page), Some(1));
}

#[tokio::test]
async fn test_dataset_of_other_schema_stops_run_before_fetching() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());

    let records_path = Path::new(&config.output.records_path);
    std::fs::create_dir_all(records_path.parent().unwrap()).unwrap();
    let minimal = "id,author,date_gmt,content\n1,alice,2025-12-01T00:00:00Z,x\n";
    std::fs::write(records_path, minimal).unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(0, 0, vec![])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = run_harvest(&config).await.unwrap_err();
    assert!(matches!(
        err,
        HarvestError::Storage(StorageError::SchemaMismatch {
            expected: 6,
            found: 4
        })
    ));
    assert_eq!(std::fs::read_to_string(records_path).unwrap(), minimal);
    assert_eq!(saved_cursor(&config), None);
}

#[tokio::test]
async fn test_harvested_images_feed_the_analyzer() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    let image_url = format!("{}/large/spider.jpg", mock_server.uri());

    mount_page(&mock_server, 0, page_body(1, 1, vec![])).await;
    mount_page(
        &mock_server,
        1,
        page_body(
            1,
            1,
            vec![
                item(
                    31,
                    "mallory",
                    &days_ago(1),
                    &format!("<p>look</p>\n<img src=\"{}\" />", image_url),
                ),
                item(32, "alice", &days_ago(1), "<p>words only</p>"),
            ],
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/large/spider.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xd8, 0xff]))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "Yes"}]}}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    run_harvest(&config).await.unwrap();

    let records = CsvRecordStore::new(&config.output.records_path, config.output.schema)
        .read_records()
        .unwrap();
    let mut blocklist = BlockList::load(&config.analyzer.blocklist_path).unwrap();
    let classifier = GeminiClassifier::new(&config.analyzer, "test-key").unwrap();
    let since = Utc::now() - Duration::days(i64::from(config.analyzer.recent_days));

    let report = analyze_records(
        &records,
        &mut blocklist,
        &classifier,
        &reqwest::Client::new(),
        since,
    )
    .await
    .unwrap();

    assert_eq!(report.candidates, 2);
    assert_eq!(report.without_image, 1);
    assert_eq!(report.flagged.len(), 1);
    assert_eq!(report.flagged[0].image_url, image_url);
    assert_eq!(report.newly_blocked, vec!["mallory".to_string()]);
    assert_eq!(
        std::fs::read_to_string(&config.analyzer.blocklist_path).unwrap(),
        "mallory\n"
    );
}

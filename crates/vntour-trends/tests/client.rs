//! Integration tests for `TrendsClient` and the group fetcher using wiremock HTTP mocks.

use std::time::Duration;

use chrono::NaiveDate;
use vntour_trends::raw::{group_path, read_failed_groups, read_group_csv, FAILED_GROUPS_FILE};
use vntour_trends::{
    build_groups, fetch_groups, FetchOptions, Timeframe, TrendsClient, TrendsError,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> TrendsClient {
    TrendsClient::with_base_url(30, "vntour-test/0.1", "vi", 420, "VN", base_url)
        .expect("client construction should not fail")
}

fn guarded(body: &serde_json::Value) -> String {
    format!(")]}}'\n{body}")
}

fn explore_body(token: &str) -> serde_json::Value {
    serde_json::json!({
        "widgets": [
            { "id": "GEO_MAP", "token": "geo-token", "request": {} },
            {
                "id": "TIMESERIES",
                "token": token,
                "request": { "time": "2024-01-01 2024-01-31", "resolution": "WEEK" }
            }
        ]
    })
}

fn multiline_body(rows: &[(&str, &[u32])]) -> serde_json::Value {
    let timeline: Vec<serde_json::Value> = rows
        .iter()
        .map(|(time, values)| serde_json::json!({ "time": time, "value": values, "isPartial": false }))
        .collect();
    serde_json::json!({ "default": { "timelineData": timeline } })
}

async fn mount_explore(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/explore"))
        .and(query_param("hl", "vi"))
        .and(query_param("tz", "420"))
        .respond_with(ResponseTemplate::new(200).set_body_string(guarded(&explore_body(token))))
        .mount(server)
        .await;
}

fn temp_dir() -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("vntour-fetch-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn keywords(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

#[tokio::test]
async fn interest_over_time_follows_explore_token() {
    let server = MockServer::start().await;
    mount_explore(&server, "ts-token").await;

    Mock::given(method("GET"))
        .and(path("/widgetdata/multiline"))
        .and(query_param("token", "ts-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(guarded(&multiline_body(&[
            ("1704067200", &[50, 25]),
            ("1704672000", &[40, 30]),
        ]))))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let points = client
        .interest_over_time(&keywords(&["Rau má", "Sa Pa"]), &Timeframe::default())
        .await
        .expect("should parse timeline");

    assert_eq!(points.len(), 2);
    assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_eq!(points[0].values, vec![50, 25]);
    assert_eq!(points[1].date, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
}

#[tokio::test]
async fn explore_429_is_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/explore"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .interest_over_time(&keywords(&["Rau má"]), &Timeframe::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TrendsError::RateLimited), "got {err:?}");
}

#[tokio::test]
async fn missing_timeseries_widget_is_reported() {
    let server = MockServer::start().await;
    let body = serde_json::json!({ "widgets": [{ "id": "RELATED_QUERIES", "token": "x" }] });
    Mock::given(method("POST"))
        .and(path("/explore"))
        .respond_with(ResponseTemplate::new(200).set_body_string(guarded(&body)))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .interest_over_time(&keywords(&["Rau má"]), &Timeframe::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TrendsError::MissingWidget(_)), "got {err:?}");
}

#[tokio::test]
async fn empty_timeline_is_an_empty_response() {
    let server = MockServer::start().await;
    mount_explore(&server, "ts-token").await;
    Mock::given(method("GET"))
        .and(path("/widgetdata/multiline"))
        .respond_with(ResponseTemplate::new(200).set_body_string(guarded(&multiline_body(&[]))))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .interest_over_time(&keywords(&["Rau má"]), &Timeframe::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TrendsError::EmptyResponse(_)), "got {err:?}");
}

#[tokio::test]
async fn server_error_surfaces_status_without_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/explore"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .interest_over_time(&keywords(&["Rau má"]), &Timeframe::default())
        .await
        .unwrap_err();
    match err {
        TrendsError::UnexpectedStatus { status, url } => {
            assert_eq!(status, 500);
            assert!(!url.contains("req="), "query must be redacted: {url}");
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

fn fetch_options(raw_dir: std::path::PathBuf, max_retries: u32) -> FetchOptions {
    FetchOptions {
        raw_dir,
        timeframe: Timeframe::default(),
        group_delay: Duration::ZERO,
        retry_delay: Duration::ZERO,
        max_retries,
        resume: true,
    }
}

#[tokio::test]
async fn fetch_writes_group_files_and_records_failures() {
    let server = MockServer::start().await;
    mount_explore(&server, "ts-token").await;
    Mock::given(method("GET"))
        .and(path("/widgetdata/multiline"))
        .respond_with(ResponseTemplate::new(200).set_body_string(guarded(&multiline_body(&[(
            "1704067200",
            &[50, 25, 10, 5, 1],
        )]))))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/widgetdata/multiline"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let destinations = keywords(&["Hạ Long", "Phú Quốc", "Đà Lạt", "Sa Pa", "Hội An"]);
    let groups = build_groups(&destinations, Some("Rau má"), 4);
    assert_eq!(groups.len(), 2);

    let dir = temp_dir();
    let client = test_client(&server.uri());
    let summary = fetch_groups(&client, &groups, &fetch_options(dir.clone(), 1))
        .await
        .expect("fetch run should complete");

    assert_eq!(summary.selected, 2);
    assert_eq!(summary.fetched, vec![1]);
    assert_eq!(summary.failed, vec![2]);
    assert_eq!(read_failed_groups(&dir), vec![2]);

    let rows = read_group_csv(&group_path(&dir, 1)).unwrap();
    let pairs: Vec<(&str, u32)> = rows.iter().map(|r| (r.keyword.as_str(), r.interest)).collect();
    assert_eq!(
        pairs,
        vec![("Rau má", 50), ("Hạ Long", 25), ("Phú Quốc", 10), ("Đà Lạt", 5), ("Sa Pa", 1)]
    );
    assert!(!group_path(&dir, 2).exists());
}

#[tokio::test]
async fn resume_skips_groups_with_existing_files() {
    let server = MockServer::start().await;
    mount_explore(&server, "ts-token").await;
    Mock::given(method("GET"))
        .and(path("/widgetdata/multiline"))
        .respond_with(ResponseTemplate::new(200).set_body_string(guarded(&multiline_body(&[(
            "1704067200",
            &[50, 25],
        )]))))
        .expect(1)
        .mount(&server)
        .await;

    let groups = build_groups(&keywords(&["Sa Pa", "Hội An"]), Some("Rau má"), 1);
    let dir = temp_dir();
    std::fs::write(group_path(&dir, 1), "date,keyword,interest,group\n").unwrap();

    let client = test_client(&server.uri());
    let summary = fetch_groups(&client, &groups, &fetch_options(dir.clone(), 0))
        .await
        .expect("fetch run should complete");

    assert_eq!(summary.resumed, vec![1]);
    assert_eq!(summary.fetched, vec![2]);
    assert!(summary.failed.is_empty());
}

#[tokio::test]
async fn rate_limit_is_retried_before_recording_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/explore"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let groups = build_groups(&keywords(&["Sa Pa"]), Some("Rau má"), 4);
    let dir = temp_dir();
    let client = test_client(&server.uri());
    let summary = fetch_groups(&client, &groups, &fetch_options(dir.clone(), 2))
        .await
        .expect("fetch run should complete");

    assert_eq!(summary.failed, vec![1]);
    assert_eq!(read_failed_groups(&dir), vec![1]);
}

#[tokio::test]
async fn successful_retry_clears_group_from_failed_list() {
    let server = MockServer::start().await;
    mount_explore(&server, "ts-token").await;
    Mock::given(method("GET"))
        .and(path("/widgetdata/multiline"))
        .respond_with(ResponseTemplate::new(200).set_body_string(guarded(&multiline_body(&[(
            "1704067200",
            &[50, 25],
        )]))))
        .expect(1)
        .mount(&server)
        .await;

    let groups = build_groups(&keywords(&["Sa Pa", "Hội An", "Huế"]), Some("Rau má"), 1);
    let dir = temp_dir();
    std::fs::write(group_path(&dir, 1), "date,keyword,interest,group\n").unwrap();
    std::fs::write(dir.join(FAILED_GROUPS_FILE), "1\n2\n3\n2\n").unwrap();

    let client = test_client(&server.uri());
    let summary = fetch_groups(&client, &groups[..2], &fetch_options(dir.clone(), 0))
        .await
        .expect("fetch run should complete");

    assert_eq!(summary.resumed, vec![1]);
    assert_eq!(summary.fetched, vec![2]);
    assert_eq!(summary.cleared, vec![1, 2]);
    // Group 3 was outside the selection and stays recorded.
    assert_eq!(read_failed_groups(&dir), vec![3]);
}

#[tokio::test]
async fn failed_list_is_removed_when_everything_succeeds() {
    let server = MockServer::start().await;
    mount_explore(&server, "ts-token").await;
    Mock::given(method("GET"))
        .and(path("/widgetdata/multiline"))
        .respond_with(ResponseTemplate::new(200).set_body_string(guarded(&multiline_body(&[(
            "1704067200",
            &[50, 25],
        )]))))
        .mount(&server)
        .await;

    let groups = build_groups(&keywords(&["Sa Pa"]), Some("Rau má"), 4);
    let dir = temp_dir();
    std::fs::write(dir.join(FAILED_GROUPS_FILE), "1\n").unwrap();

    let client = test_client(&server.uri());
    let summary = fetch_groups(&client, &groups, &fetch_options(dir.clone(), 0))
        .await
        .expect("fetch run should complete");

    assert_eq!(summary.cleared, vec![1]);
    assert!(!dir.join(FAILED_GROUPS_FILE).exists());
}

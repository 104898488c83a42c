//! Integration tests for `YoutubeClient` and the collectors using wiremock HTTP mocks.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use vntour_core::{ProvinceMatcher, ProvinceRecord, UNMATCHED};
use vntour_youtube::{
    fetch_hashtag, fetch_provinces, write_rows, HashtagOptions, ProvinceOptions, SearchQuery,
    YoutubeClient, YoutubeError,
};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> YoutubeClient {
    YoutubeClient::with_base_url("test-key", 30, "vntour-test/0.1", base_url)
        .expect("client construction should not fail")
        .with_retry(0, 0)
}

fn search_body(ids: &[&str], next: Option<&str>) -> serde_json::Value {
    let items: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| serde_json::json!({ "id": { "kind": "youtube#video", "videoId": id } }))
        .collect();
    match next {
        Some(token) => serde_json::json!({ "items": items, "nextPageToken": token }),
        None => serde_json::json!({ "items": items }),
    }
}

fn video_json(id: &str, title: &str, description: &str, views: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "snippet": {
            "title": title,
            "description": description,
            "channelTitle": "Kênh Du Lịch",
            "publishedAt": "2025-06-01T08:00:00Z"
        },
        "statistics": { "viewCount": views, "likeCount": "3", "commentCount": "1" }
    })
}

fn quota_body() -> serde_json::Value {
    serde_json::json!({
        "error": {
            "code": 403,
            "message": "The request cannot be completed because you have exceeded your quota.",
            "errors": [{ "reason": "quotaExceeded", "domain": "youtube.quota" }]
        }
    })
}

#[tokio::test]
async fn search_pages_until_max_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "#dalat"))
        .and(query_param("key", "test-key"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["a", "b"], Some("p2"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("pageToken", "p2"))
        .and(query_param("maxResults", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["c"], Some("p3"))))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let ids = client
        .search_video_ids(&SearchQuery::new("#dalat", 3), Duration::ZERO)
        .await
        .expect("search should succeed");
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn quota_exceeded_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(403).set_body_json(quota_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .search_video_ids(&SearchQuery::new("#dalat", 10), Duration::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, YoutubeError::QuotaExceeded(_)), "got {err:?}");
}

#[tokio::test]
async fn unexpected_status_never_leaks_the_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": { "code": 400, "message": "Invalid value", "errors": [{ "reason": "invalid" }] }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .search_video_ids(&SearchQuery::new("#dalat", 10), Duration::ZERO)
        .await
        .unwrap_err();
    match err {
        YoutubeError::UnexpectedStatus { status, url, message } => {
            assert_eq!(status, 400);
            assert!(!url.contains("test-key"), "key must be redacted: {url}");
            assert_eq!(message, "Invalid value");
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn fetch_hashtag_annotates_provinces() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "#dulich"))
        .and(query_param("order", "date"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["v1", "v2"], None)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("id", "v1,v2"))
        .and(query_param("part", "snippet,statistics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                video_json("v1", "Cà phê sáng", "Một buổi sáng ở Sài Gòn", "1500"),
                video_json("v2", "Vlog", "ở nhà cuối tuần", "20")
            ]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let options = HashtagOptions {
        hashtag: "#dulich".to_owned(),
        max_results: 10,
        page_delay: Duration::ZERO,
    };
    let report = fetch_hashtag(&client, &ProvinceMatcher::builtin(), &options)
        .await
        .expect("hashtag run should succeed");

    assert_eq!(report.hashtag, "dulich");
    assert_eq!(report.videos.len(), 2);
    let details = report.detail_rows();
    assert_eq!(details[0].province.as_deref(), Some("Hồ Chí Minh"));
    assert_eq!(details[0].views, 1500);
    assert_eq!(details[1].province, None);

    let counts = report.count_rows();
    let labels: Vec<&str> = counts.iter().map(|c| c.province.as_str()).collect();
    assert!(labels.contains(&"Hồ Chí Minh"));
    assert!(labels.contains(&UNMATCHED));

    let dir = std::env::temp_dir().join(format!("vntour-yt-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let out = dir.join("details.csv");
    write_rows(&out, &details).unwrap();
    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.starts_with(
        "platform,hashtag,video_id,title,description,channel_title,published_at,views,likes,comments,province,region,url,collected_at_utc"
    ));
    assert!(written.contains("https://www.youtube.com/watch?v=v1"));
}

#[tokio::test]
async fn failed_province_counts_zero_and_run_continues() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Lâm Đồng"))
        .and(query_param("regionCode", "VN"))
        .and(query_param("relevanceLanguage", "vi"))
        .and(query_param("publishedAfter", "2025-06-03T00:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["x1", "x2"], None)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Huế"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                video_json("x1", "Săn mây Đà Lạt", "", "10"),
                video_json("x2", "Hồ Tuyền Lâm", "không rõ", "5")
            ]
        })))
        .mount(&server)
        .await;

    let matcher = ProvinceMatcher::new(vec![
        ProvinceRecord::new("1", "Lâm Đồng", "Miền Trung").with_aliases(&["Đà Lạt"]),
        ProvinceRecord::new("2", "Huế", "Miền Trung"),
    ]);
    let options = ProvinceOptions {
        max_results_per_province: 50,
        days: 7,
        page_delay: Duration::ZERO,
        province_delay: Duration::ZERO,
        with_details: true,
    };
    let now = Utc.with_ymd_and_hms(2025, 6, 10, 0, 0, 0).unwrap();
    let client = test_client(&server.uri());
    let report = fetch_provinces(&client, &matcher, &options, now)
        .await
        .expect("window is in range");

    assert_eq!(report.counts.len(), 2);
    assert_eq!(report.counts[0].province, "Lâm Đồng");
    assert_eq!(report.counts[0].hashtag_query, "#lamdong");
    assert_eq!(report.counts[0].video_count, 2);
    assert_eq!(report.counts[1].province, "Huế");
    assert_eq!(report.counts[1].video_count, 0);
    assert_eq!(report.failed, vec!["Huế"]);

    assert_eq!(report.details.len(), 2);
    assert_eq!(report.details[0].detected_province, "Lâm Đồng");
    assert_eq!(report.details[1].detected_province, UNMATCHED);
}

//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: YAML config → HTTP transport → retry →
//! pagination → collected items

use base64::Engine;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracker_fetch::{
    CancelSignal, Continuation, CursorPaginator, Error, ErrorStrategy, FetchRequest, Fetcher,
    FetcherConfig, JsonPageParser, OffsetPaginator, SinglePage,
};
use wiremock::matchers::{body_partial_json, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher_for(server: &MockServer) -> Fetcher {
    let yaml = format!(
        r"
base_url: {}
rate_limit: null
credentials:
  type: basic
  username: admin@example.com
  password: api-token
retry:
  max_attempts: 3
  base_delay_ms: 10
  backoff: constant
",
        server.uri()
    );
    FetcherConfig::from_yaml_str(&yaml).unwrap().build().unwrap()
}

fn expected_basic_header() -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode("admin@example.com:api-token");
    format!("Basic {encoded}")
}

fn dashboards(range: std::ops::Range<u64>) -> Vec<Value> {
    range
        .map(|id| json!({"id": id.to_string(), "name": format!("Dashboard {id}")}))
        .collect()
}

// ============================================================================
// Offset Pagination
// ============================================================================

#[tokio::test]
async fn test_dashboard_search_walks_all_pages() {
    let mock_server = MockServer::start().await;

    for (start, end) in [(0, 100), (100, 200), (200, 250)] {
        Mock::given(method("GET"))
            .and(path("/rest/api/3/dashboard/search"))
            .and(query_param("startAt", start.to_string()))
            .and(query_param("maxResults", "100"))
            .and(header("Authorization", expected_basic_header().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "startAt": start,
                "maxResults": 100,
                "total": 250,
                "isLast": end == 250,
                "values": dashboards(start..end)
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let fetcher = fetcher_for(&mock_server);
    let request = FetchRequest::get("/rest/api/3/dashboard/search").page_size(100);
    let outcome = fetcher
        .collect(
            &request,
            &OffsetPaginator::default(),
            &JsonPageParser::<Value>::offset("values"),
        )
        .await
        .unwrap();

    assert_eq!(outcome.items.len(), 250);
    assert_eq!(outcome.items[0]["name"], "Dashboard 0");
    assert_eq!(outcome.items[249]["id"], "249");
    assert_eq!(outcome.stats.pages_fetched, 3);
    assert_eq!(outcome.next, Continuation::Done);
}

#[tokio::test]
async fn test_rate_limited_page_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/workflow/search"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/workflow/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "startAt": 0,
            "maxResults": 50,
            "total": 1,
            "isLast": true,
            "values": [{"id": {"name": "Software Simplified Workflow"}}]
        })))
        .mount(&mock_server)
        .await;

    let fetcher = fetcher_for(&mock_server);
    let outcome = fetcher
        .collect(
            &FetchRequest::get("/rest/api/3/workflow/search"),
            &OffsetPaginator::default(),
            &JsonPageParser::<Value>::offset("values"),
        )
        .await
        .unwrap();

    assert_eq!(outcome.items.len(), 1);
    assert_eq!(outcome.stats.attempts, 2);
    assert_eq!(outcome.stats.retries, 1);
}

#[tokio::test]
async fn test_persistent_server_error_exhausts_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/dashboard/search"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let fetcher = fetcher_for(&mock_server);
    let err = fetcher
        .collect(
            &FetchRequest::get("/rest/api/3/dashboard/search"),
            &OffsetPaginator::default(),
            &JsonPageParser::<Value>::offset("values"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RetryExhausted { attempts: 3, .. }));
    assert_eq!(err.status(), Some(503));
    assert_eq!(err.body(), Some("maintenance"));
}

// ============================================================================
// Cursor Pagination
// ============================================================================

#[tokio::test]
async fn test_automation_rules_follow_cursor_in_body() {
    let mock_server = MockServer::start().await;
    let endpoint = "/gateway/api/automation/public/jira/cloud-1/rest/v1/rule/summary";

    // Second page first: the generic mock below also matches it
    Mock::given(method("POST"))
        .and(path(endpoint))
        .and(body_partial_json(json!({"cursor": "eyJwYWdlIjoyfQ=="})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"uuid": "rule-3"}],
            "links": {}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(endpoint))
        .and(body_partial_json(json!({"limit": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"uuid": "rule-1"}, {"uuid": "rule-2"}],
            "links": {
                "next": format!("{endpoint}?cursor=eyJwYWdlIjoyfQ%3D%3D")
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = fetcher_for(&mock_server);
    let request = FetchRequest::post(endpoint, json!({})).page_size(2);
    let outcome = fetcher
        .collect(
            &request,
            &CursorPaginator::default().in_body(),
            &JsonPageParser::<Value>::cursor("data"),
        )
        .await
        .unwrap();

    let uuids: Vec<&str> = outcome
        .items
        .iter()
        .filter_map(|rule| rule["uuid"].as_str())
        .collect();
    assert_eq!(uuids, vec!["rule-1", "rule-2", "rule-3"]);
}

// ============================================================================
// Sub-fetch Scans
// ============================================================================

#[tokio::test]
async fn test_gadget_scan_skips_missing_dashboard() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/dashboard/10002/gadget"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errorMessages": ["The dashboard with id '10002' does not exist."]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/rest/api/3/dashboard/\d+/gadget$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "gadgets": [
                {"id": 1, "moduleKey": "com.atlassian.jira.gadgets:filter-results-gadget"},
                {"id": 2, "uri": "rest/gadgets/1.0/g/com.atlassian.jira.gadgets:pie-chart-gadget"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let fetcher = fetcher_for(&mock_server)
        .with_error_strategy(ErrorStrategy::Skip)
        .with_concurrency(2);
    let jobs = (10000..10005).map(|id| {
        (
            id,
            FetchRequest::get(format!("/rest/api/3/dashboard/{id}/gadget")),
        )
    });

    let report = fetcher
        .fetch_each(jobs, &SinglePage, &JsonPageParser::<Value>::new("gadgets"))
        .await
        .unwrap();

    assert_eq!(report.successes.len(), 4);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].key, 10002);
    assert_eq!(report.failures[0].error.status(), Some(404));
    assert_eq!(report.items().count(), 8);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_deadline_interrupts_retry_after_wait() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/dashboard/search"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = fetcher_for(&mock_server)
        .with_cancel(CancelSignal::never().with_timeout(Duration::from_millis(200)));
    let started = Instant::now();

    let err = fetcher
        .collect(
            &FetchRequest::get("/rest/api/3/dashboard/search"),
            &OffsetPaginator::default(),
            &JsonPageParser::<Value>::offset("values"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(10));
}

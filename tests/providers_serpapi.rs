// tests/providers_serpapi.rs
//
// SerpAPI client against a local mock server.

use std::sync::Arc;
use std::time::Duration;

use hr_news_digest::ingest::providers::serpapi::SerpApiProvider;
use hr_news_digest::ingest::types::{SearchProvider, SearchQuery};
use hr_news_digest::ingest::Fetcher;
use hr_news_digest::{AdvisoryKind, DigestError};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fixture() -> String {
    std::fs::read_to_string("tests/fixtures/serpapi_news.json").expect("fixture")
}

fn provider(server: &MockServer) -> SerpApiProvider {
    SerpApiProvider::new("test-key".into(), &server.uri(), Duration::from_secs(5))
        .expect("http client")
}

#[tokio::test]
async fn sends_news_query_and_parses_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "google"))
        .and(query_param("q", "HR trends"))
        .and(query_param("tbm", "nws"))
        .and(query_param("num", "5"))
        .and(query_param("hl", "en"))
        .and(query_param("gl", "us"))
        .and(query_param("api_key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(fixture(), "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let hits = provider(&server)
        .search(&SearchQuery::news("HR trends", 5))
        .await
        .expect("search ok");

    assert_eq!(hits.len(), 4);
    assert_eq!(
        hits[0].source.as_ref().and_then(|s| s.name()),
        Some("Forbes · Leadership")
    );
    assert_eq!(hits[1].source.as_ref().and_then(|s| s.name()), Some("HR Dive"));
    assert!(hits[2].link.is_none());
}

#[tokio::test]
async fn fetcher_normalizes_serpapi_hits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(fixture(), "application/json"))
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(Arc::new(provider(&server)));
    let report = fetcher.fetch(&["HR trends".to_string()], 15).await;

    assert!(report.advisories.is_empty());
    let recs = report.records;
    assert_eq!(recs.len(), 3, "hit without link is dropped");

    assert_eq!(recs[0].source, "Forbes  Leadership");
    assert_eq!(recs[0].date, "Today");
    assert_eq!(recs[1].source, "HR Dive");
    assert_eq!(recs[1].date, "Yesterday");
    assert_eq!(recs[1].snippet, "Survey finds {hybrid} preferences remain strong.");
    assert_eq!(recs[2].title, "Untitled");
    assert_eq!(recs[2].source, "SHRM  News");
    assert_eq!(recs[2].snippet, "");
    assert_eq!(recs[2].date, "Jan 5, 2024");
}

#[tokio::test]
async fn non_success_status_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
        .mount(&server)
        .await;

    let err = provider(&server)
        .search(&SearchQuery::news("x", 3))
        .await
        .unwrap_err();
    match err {
        DigestError::Api {
            status, message, ..
        } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid API key");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn error_field_without_results_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "error": "Your account has run out of searches." })),
        )
        .mount(&server)
        .await;

    let err = provider(&server)
        .search(&SearchQuery::news("x", 3))
        .await
        .unwrap_err();
    assert!(matches!(err, DigestError::Upstream { .. }));
    assert!(err.to_string().contains("run out of searches"));
}

#[tokio::test]
async fn missing_news_results_is_an_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "search_metadata": {} })))
        .mount(&server)
        .await;

    let hits = provider(&server)
        .search(&SearchQuery::news("x", 3))
        .await
        .expect("empty ok");
    assert!(hits.is_empty());
}

#[tokio::test]
async fn one_broken_keyword_does_not_stop_the_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("q", "broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("q", "HR trends"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(fixture(), "application/json"))
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(Arc::new(provider(&server)));
    let report = fetcher
        .fetch(&["broken".to_string(), "HR trends".to_string()], 15)
        .await;

    assert_eq!(report.records.len(), 3);
    assert_eq!(report.advisories.len(), 1);
    assert_eq!(report.advisories[0].kind, AdvisoryKind::Upstream);
    assert!(report.advisories[0].message.contains("'broken'"));
}

#[tokio::test]
async fn badly_typed_hit_is_skipped_and_the_rest_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "news_results": [
                { "link": "https://a/1", "title": "ok", "source": { "name": "Forbes" } },
                { "link": "https://a/2", "title": 42 },
                { "link": "https://a/3", "date": { "iso": "2024-01-05" } },
                { "link": "https://a/4", "source": { "name": 7 } },
                { "link": "https://a/5", "title": "also ok", "date": "2 hours ago" }
            ]
        })))
        .mount(&server)
        .await;

    let hits = provider(&server)
        .search(&SearchQuery::news("x", 10))
        .await
        .expect("bad hits are not fatal");
    let links: Vec<_> = hits.iter().filter_map(|h| h.link.as_deref()).collect();
    assert_eq!(links, vec!["https://a/1", "https://a/5"]);

    let report = Fetcher::new(Arc::new(provider(&server)))
        .fetch(&["x".to_string()], 10)
        .await;
    assert!(report.advisories.is_empty());
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.records[1].date, "Today");
}

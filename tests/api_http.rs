// tests/api_http.rs
//
// HTTP-level tests for the dashboard Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - POST /refresh (defaults, body-less requests, clamping, session replacement)
// - GET /news (default min_score, sentiment and source filters)
// - GET /insights
// - GET /status

use std::sync::Arc;

use serde_json::json;
use serde_json::Value as Json;
use shuttle_axum::axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt as _; // for `oneshot`

use hr_news_digest::ai_adapter::MockProvider;
use hr_news_digest::analyze::parser::ParserKind;
use hr_news_digest::api::{self, AppState};
use hr_news_digest::config::DashboardConfig;
use hr_news_digest::ingest::providers::fixture::FixtureProvider;
use hr_news_digest::{Enricher, Fetcher, Pipeline, RawHit};

const BODY_LIMIT: usize = 1024 * 1024;

fn hit(link: &str, source: &str) -> RawHit {
    serde_json::from_value(json!({
        "link": link,
        "title": format!("title {link}"),
        "source": { "name": source },
        "snippet": "snippet",
        "date": "2 hours ago",
    }))
    .expect("raw hit")
}

fn test_state(analyze: bool) -> AppState {
    let fixture = FixtureProvider::new()
        .with_hits("a", vec![hit("a1", "Forbes"), hit("a2", "Forbes"), hit("a3", "SHRM")])
        .with_hits("b", vec![hit("b1", "HR Dive"), hit("b2", "SHRM"), hit("b3", "SHRM")]);
    let pipeline = Pipeline::new(
        Fetcher::new(Arc::new(fixture)),
        Enricher::new(Arc::new(MockProvider::canned()), ParserKind::Permissive.build()),
    );
    let dashboard = DashboardConfig {
        keywords: "a,b".to_string(),
        analyze,
        ..DashboardConfig::default()
    };
    AppState::new(pipeline, dashboard)
}

async fn send(app: &Router, method: &str, uri: &str, payload: Option<Json>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match payload {
        Some(p) => builder
            .header("content-type", "application/json")
            .body(Body::from(p.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, bytes)
}

async fn send_json(app: &Router, method: &str, uri: &str, payload: Option<Json>) -> Json {
    let (status, bytes) = send(app, method, uri, payload).await;
    assert_eq!(status, StatusCode::OK, "{method} {uri} should be 200");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let app = api::router(test_state(true));
    let (status, bytes) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(bytes).expect("utf8").trim(), "OK");
}

#[tokio::test]
async fn status_before_any_refresh() {
    let app = api::router(test_state(true));
    let v = send_json(&app, "GET", "/status", None).await;
    assert_eq!(v["count"], 0);
    assert!(v["last_updated"].is_null());
    assert_eq!(v["last_updated_label"], "Never");
    assert_eq!(v["search_configured"], true);
    assert_eq!(v["model_configured"], true);

    let news = send_json(&app, "GET", "/news", None).await;
    assert_eq!(news, json!([]));
}

#[tokio::test]
async fn refresh_then_browse() {
    let app = api::router(test_state(true));

    let v = send_json(
        &app,
        "POST",
        "/refresh",
        Some(json!({ "keywords": "a,b", "max_results": 10 })),
    )
    .await;
    assert_eq!(v["count"], 6);
    assert_eq!(v["advisories"], json!([]));
    assert!(v["last_updated"].is_string());

    let news = send_json(&app, "GET", "/news", None).await;
    let rows = news.as_array().expect("array");
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0]["link"], "a1");
    assert_eq!(rows[0]["date"], "Today");
    assert_eq!(rows[0]["sentiment"], "neutral");
    assert_eq!(rows[0]["sentiment_label"], "😐 Neutral");
    assert_eq!(rows[0]["relevance_score"], 6);

    let none = send_json(&app, "GET", "/news?sentiment=positive", None).await;
    assert_eq!(none, json!([]));

    let strict = send_json(&app, "GET", "/news?min_score=7", None).await;
    assert_eq!(strict, json!([]));

    let shrm = send_json(&app, "GET", "/news?source=SHRM,HR%20Dive", None).await;
    let links: Vec<_> = shrm
        .as_array()
        .expect("array")
        .iter()
        .map(|r| r["link"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(links, vec!["a3", "b1", "b2", "b3"]);

    let ins = send_json(&app, "GET", "/insights", None).await;
    assert_eq!(ins["total"], 6);
    assert_eq!(ins["average_relevance"], 6.0);
    assert_eq!(ins["top_sources"][0]["value"], "SHRM");
    assert_eq!(ins["top_sources"][0]["count"], 3);
    assert_eq!(ins["top_themes"][0]["value"], "workforce");
    assert_eq!(ins["top_themes"][0]["count"], 6);

    let st = send_json(&app, "GET", "/status", None).await;
    assert_eq!(st["count"], 6);
    assert_ne!(st["last_updated_label"], "Never");
}

#[tokio::test]
async fn refresh_uses_dashboard_defaults_and_replaces_dataset() {
    let app = api::router(test_state(false));

    // Empty body: keywords "a,b", max_results 15, analyze from config (off).
    let v = send_json(&app, "POST", "/refresh", Some(json!({}))).await;
    assert_eq!(v["count"], 6);

    let news = send_json(&app, "GET", "/news?min_score=1", None).await;
    assert!(news[0].get("summary").is_some(), "rows always carry display columns");
    assert_eq!(news[0]["summary"], "");
    assert_eq!(news[0]["relevance_score"], 5);

    // Below the minimum: clamped up to 5, so keyword "a" alone yields its 3 hits.
    let v = send_json(
        &app,
        "POST",
        "/refresh",
        Some(json!({ "keywords": "a", "max_results": 1 })),
    )
    .await;
    assert_eq!(v["count"], 3);
}

#[tokio::test]
async fn refresh_rejects_non_json_body() {
    let app = api::router(test_state(true));
    let req = Request::builder()
        .method("POST")
        .uri("/refresh")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("keywords=a"))
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn refresh_without_body_uses_dashboard_defaults() {
    let app = api::router(test_state(true));

    // Body-less POST: keywords "a,b", max_results 15, analysis on.
    let v = send_json(&app, "POST", "/refresh", None).await;
    assert_eq!(v["count"], 6);
    assert_eq!(v["advisories"], json!([]));

    let news = send_json(&app, "GET", "/news", None).await;
    assert_eq!(news[0]["relevance_score"], 6);
}

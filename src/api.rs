// src/api.rs
//! JSON surface for the dashboard front-end.

use std::sync::{Arc, PoisonError, RwLock};

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::config::{DashboardConfig, DigestConfig};
use crate::dashboard::{DashboardRow, Filter, Insights};
use crate::error::Advisory;
use crate::pipeline::{Pipeline, RefreshRequest};
use crate::session::Session;

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
    session: Arc<RwLock<Session>>,
    dashboard: Arc<DashboardConfig>,
}

impl AppState {
    pub fn new(pipeline: Pipeline, dashboard: DashboardConfig) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            session: Arc::new(RwLock::new(Session::new())),
            dashboard: Arc::new(dashboard),
        }
    }

    pub fn from_config(cfg: &DigestConfig) -> Self {
        Self::new(Pipeline::from_config(cfg), cfg.dashboard.clone())
    }

    pub fn session(&self) -> Arc<RwLock<Session>> {
        Arc::clone(&self.session)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/refresh", post(refresh))
        .route("/news", get(news))
        .route("/insights", get(insights))
        .route("/status", get(status))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct RefreshParams {
    keywords: Option<String>,
    max_results: Option<usize>,
    analyze: Option<bool>,
}

#[derive(Serialize)]
struct RefreshResp {
    count: usize,
    last_updated: Option<DateTime<Utc>>,
    advisories: Vec<Advisory>,
}

async fn refresh(
    State(state): State<AppState>,
    params: Option<Json<RefreshParams>>,
) -> Json<RefreshResp> {
    // No body (and no content type) means "use the dashboard defaults".
    let params = params.map(|Json(p)| p).unwrap_or_default();
    let d = &state.dashboard;
    let req = RefreshRequest {
        keywords: params.keywords.unwrap_or_else(|| d.keywords.clone()),
        max_results: d.clamp_max_results(params.max_results.unwrap_or(d.max_results)),
        analyze: params.analyze.unwrap_or(d.analyze),
    };

    let outcome = state.pipeline.refresh(&req).await;

    let mut session = state.session.write().unwrap_or_else(PoisonError::into_inner);
    let advisories = session.apply(outcome, Utc::now());
    Json(RefreshResp {
        count: session.dataset.len(),
        last_updated: session.last_updated,
        advisories,
    })
}

#[derive(Debug, Default, Deserialize)]
struct NewsQuery {
    /// Comma-separated sentiment labels, e.g. "positive,neutral".
    sentiment: Option<String>,
    min_score: Option<i64>,
    /// Comma-separated source names.
    source: Option<String>,
}

fn split_list(raw: Option<String>) -> Option<Vec<String>> {
    raw.map(|s| {
        s.split(',')
            .map(|x| x.trim().to_string())
            .filter(|x| !x.is_empty())
            .collect()
    })
}

async fn news(State(state): State<AppState>, Query(q): Query<NewsQuery>) -> Json<Vec<DashboardRow>> {
    let filter = Filter {
        sentiments: split_list(q.sentiment),
        min_score: q.min_score.unwrap_or(state.dashboard.min_score),
        sources: split_list(q.source),
    };
    let rows = state
        .session
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .rows();
    Json(filter.apply(&rows).into_iter().cloned().collect())
}

async fn insights(State(state): State<AppState>) -> Json<Insights> {
    let rows = state
        .session
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .rows();
    Json(Insights::from_rows(&rows))
}

#[derive(Serialize)]
struct StatusResp {
    count: usize,
    last_updated: Option<DateTime<Utc>>,
    last_updated_label: String,
    search_configured: bool,
    model_configured: bool,
}

async fn status(State(state): State<AppState>) -> Json<StatusResp> {
    let session = state.session.read().unwrap_or_else(PoisonError::into_inner);
    Json(StatusResp {
        count: session.dataset.len(),
        last_updated: session.last_updated,
        last_updated_label: session.last_updated_label(),
        search_configured: state.pipeline.fetcher().is_configured(),
        model_configured: state.pipeline.enricher().is_configured(),
    })
}

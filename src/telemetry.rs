// src/telemetry.rs
use anyhow::{Context, Result};
use axum::{extract::State, routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Process-wide Prometheus recorder; every `counter!`/`gauge!`/`histogram!` in the
/// crate lands here once installed.
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        Ok(Self { handle })
    }

    /// `GET /metrics`, merged next to the dashboard routes in `main`.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(scrape))
            .with_state(self.handle.clone())
    }
}

async fn scrape(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

//! HR News Digest: binary entrypoint
//! Boots the Axum HTTP server on Shuttle, wiring config, pipeline and metrics.

use hr_news_digest::{api, config::DigestConfig, telemetry::Metrics};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs filtered by RUST_LOG. A subscriber installed by the runtime wins.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hr_news_digest=info,refresh=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev (SERPAPI_KEY, GEMINI_API_KEY, DIGEST_CONFIG_PATH).
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = DigestConfig::load_default()?;
    let metrics = Metrics::init()?;

    let state = api::AppState::from_config(&cfg);
    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}

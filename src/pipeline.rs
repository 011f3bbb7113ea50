// src/pipeline.rs
//! One refresh: split keywords, fetch, optionally enrich each record in order.

use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use serde::Deserialize;

use crate::analyze::{EnrichedRecord, Enricher};
use crate::config::DigestConfig;
use crate::error::{Advisory, AdvisoryKind};
use crate::ingest::{split_keywords, FetchReport, Fetcher};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("refresh_runs_total", "Completed refresh runs.");
        describe_gauge!("refresh_last_run_ts", "Unix ts of the last refresh.");
        describe_histogram!("refresh_duration_ms", "Refresh wall time in milliseconds.");
    });
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    /// Comma-separated keywords, e.g. "HR trends, talent acquisition".
    pub keywords: String,
    pub max_results: usize,
    /// Run the enricher; when false records are returned as fetched.
    pub analyze: bool,
}

#[derive(Debug, Default)]
pub struct RefreshOutcome {
    pub records: Vec<EnrichedRecord>,
    pub advisories: Vec<Advisory>,
}

pub struct Pipeline {
    fetcher: Fetcher,
    enricher: Enricher,
}

impl Pipeline {
    pub fn new(fetcher: Fetcher, enricher: Enricher) -> Self {
        Self { fetcher, enricher }
    }

    pub fn from_config(cfg: &DigestConfig) -> Self {
        Self::new(Fetcher::from_config(&cfg.search), Enricher::from_config(cfg))
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn enricher(&self) -> &Enricher {
        &self.enricher
    }

    pub async fn refresh(&self, req: &RefreshRequest) -> RefreshOutcome {
        ensure_metrics_described();
        let t0 = Instant::now();

        let keywords = split_keywords(&req.keywords);
        let FetchReport {
            records,
            mut advisories,
        } = self.fetcher.fetch(&keywords, req.max_results).await;

        if req.analyze {
            if let Some(reason) = self.enricher.unavailable_reason() {
                advisories.push(Advisory::new(AdvisoryKind::Configuration, reason));
            }
        }

        let records = if req.analyze && self.enricher.is_configured() {
            let total = records.len();
            let mut out = Vec::with_capacity(total);
            for (i, record) in records.into_iter().enumerate() {
                let outcome = self.enricher.enrich(record).await;
                advisories.extend(outcome.advisory);
                out.push(outcome.record);
                tracing::debug!(done = i + 1, total, "enrichment progress");
            }
            out
        } else {
            records.into_iter().map(EnrichedRecord::plain).collect()
        };

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("refresh_duration_ms").record(ms);
        counter!("refresh_runs_total").increment(1);
        gauge!("refresh_last_run_ts").set(chrono::Utc::now().timestamp() as f64);

        tracing::info!(
            target: "refresh",
            records = records.len(),
            enriched = records.iter().filter(|r| r.is_enriched()).count(),
            advisories = advisories.len(),
            elapsed_ms = ms as u64,
            "refresh finished"
        );

        RefreshOutcome {
            records,
            advisories,
        }
    }
}

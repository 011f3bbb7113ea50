// src/ingest/mod.rs
//! Fetcher: one search per keyword, global URL dedup, field normalization, total cap.

pub mod providers;
pub mod types;

use std::collections::HashSet;
use std::sync::Arc;

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::config::{SearchConfig, ENV_SEARCH_KEY};
use crate::error::{Advisory, AdvisoryKind};
use crate::ingest::providers::serpapi::SerpApiProvider;
use crate::ingest::types::{NewsRecord, RawHit, SearchProvider, SearchQuery};

/// Each keyword asks for at least this many hits.
pub const MIN_RESULTS_PER_KEYWORD: usize = 3;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("fetch_queries_total", "Search queries issued, one per keyword.");
        describe_counter!("fetch_errors_total", "Search queries that failed.");
        describe_counter!(
            "fetch_duplicates_total",
            "Hits dropped because their link was already seen."
        );
        describe_counter!("fetch_records_total", "Records returned after the cap.");
        describe_counter!(
            "fetch_malformed_hits_total",
            "Search hits skipped because a field had an unexpected type."
        );
    });
}

/// Split the comma-separated keyword field. Entries are kept raw (untrimmed, possibly
/// empty) because their count drives the per-keyword result size.
pub fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

/// Strip the `·`, `|` and `-` separators from a source name and trim the ends.
/// Inner whitespace is left as is ("Forbes · Leadership" -> "Forbes  Leadership").
pub fn clean_source(source: &str) -> String {
    source.replace(['·', '|', '-'], "").trim().to_string()
}

/// Bucket relative dates ("3 hours ago", "5 days ago"); anything else passes through.
pub fn normalize_date(date: &str) -> String {
    if !date.contains("ago") {
        return date.to_string();
    }
    if date.contains("hour") {
        return "Today".to_string();
    }
    if date.contains("day") {
        return if date.contains("1 day") {
            "Yesterday".to_string()
        } else {
            "This week".to_string()
        };
    }
    date.to_string()
}

/// Decode hits one by one; a hit with a badly typed field is skipped, not fatal.
pub fn decode_hits(items: Vec<serde_json::Value>, service: &'static str) -> Vec<RawHit> {
    ensure_metrics_described();
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RawHit>(item) {
            Ok(hit) => Some(hit),
            Err(e) => {
                counter!("fetch_malformed_hits_total").increment(1);
                tracing::debug!(error = %e, service, "skipping malformed hit");
                None
            }
        })
        .collect()
}

/// Size of each per-keyword request: `max(3, max_results / keyword_count)`.
pub fn per_keyword_count(max_results: usize, keyword_count: usize) -> usize {
    if keyword_count == 0 {
        return MIN_RESULTS_PER_KEYWORD;
    }
    MIN_RESULTS_PER_KEYWORD.max(max_results / keyword_count)
}

impl NewsRecord {
    /// Normalize a raw hit. Returns `None` when the hit has no usable link.
    pub fn from_hit(hit: RawHit) -> Option<Self> {
        let link = hit.link.filter(|l| !l.is_empty())?;
        let source = hit
            .source
            .as_ref()
            .and_then(|s| s.name())
            .unwrap_or("Unknown");
        Some(Self {
            title: hit.title.unwrap_or_else(|| "Untitled".to_string()),
            source: clean_source(source),
            link,
            snippet: hit.snippet.unwrap_or_default(),
            date: normalize_date(hit.date.as_deref().unwrap_or_default()),
        })
    }
}

/// Records from one fetch plus the warnings raised along the way.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub records: Vec<NewsRecord>,
    pub advisories: Vec<Advisory>,
}

pub struct Fetcher {
    provider: Option<Arc<dyn SearchProvider>>,
    language: String,
    region: String,
}

impl Fetcher {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self {
            provider: Some(provider),
            language: "en".to_string(),
            region: "us".to_string(),
        }
    }

    /// A fetcher without credentials: every fetch returns nothing plus a configuration advisory.
    pub fn unconfigured() -> Self {
        Self {
            provider: None,
            language: "en".to_string(),
            region: "us".to_string(),
        }
    }

    /// Build the SerpAPI-backed fetcher. A missing key or a broken HTTP client leaves
    /// the fetcher unconfigured and is logged once here.
    pub fn from_config(cfg: &SearchConfig) -> Self {
        let Some(key) = cfg.resolve_api_key() else {
            tracing::error!("{ENV_SEARCH_KEY} not found in environment variables");
            return Self::unconfigured();
        };
        match SerpApiProvider::from_config(key, cfg) {
            Ok(p) => Self::new(Arc::new(p)).with_locale(&cfg.language, &cfg.region),
            Err(e) => {
                tracing::error!(error = %e, "search provider unavailable");
                Self::unconfigured()
            }
        }
    }

    pub fn with_locale(mut self, language: &str, region: &str) -> Self {
        self.language = language.to_string();
        self.region = region.to_string();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Query each non-empty keyword in order and return at most `max_results` distinct
    /// records. A failing keyword only loses its own contribution.
    pub async fn fetch(&self, keywords: &[String], max_results: usize) -> FetchReport {
        ensure_metrics_described();

        let Some(provider) = self.provider.as_ref() else {
            return FetchReport {
                records: Vec::new(),
                advisories: vec![Advisory::new(
                    AdvisoryKind::Configuration,
                    format!("{ENV_SEARCH_KEY} not found in environment variables"),
                )],
            };
        };

        let num = per_keyword_count(max_results, keywords.len());
        let mut report = FetchReport::default();
        let mut seen: HashSet<String> = HashSet::new();

        for keyword in keywords {
            let keyword = keyword.trim();
            if keyword.is_empty() {
                continue;
            }

            let mut query = SearchQuery::news(keyword, num);
            query.language.clone_from(&self.language);
            query.region.clone_from(&self.region);

            counter!("fetch_queries_total").increment(1);
            let hits = match provider.search(&query).await {
                Ok(hits) => hits,
                Err(e) => {
                    tracing::warn!(error = %e, provider = provider.name(), keyword, "search error");
                    counter!("fetch_errors_total").increment(1);
                    report.advisories.push(Advisory::from_error(
                        &format!("Error fetching news for '{keyword}'"),
                        &e,
                    ));
                    continue;
                }
            };

            for hit in hits {
                let Some(record) = NewsRecord::from_hit(hit) else {
                    continue;
                };
                if !seen.insert(record.link.clone()) {
                    counter!("fetch_duplicates_total").increment(1);
                    continue;
                }
                report.records.push(record);
                // Only ends this keyword; the next one still contributes before truncation.
                if report.records.len() >= max_results {
                    break;
                }
            }
        }

        report.records.truncate(max_results);
        counter!("fetch_records_total").increment(report.records.len() as u64);
        tracing::debug!(
            records = report.records.len(),
            advisories = report.advisories.len(),
            "fetch finished"
        );
        report
    }
}

// src/analyze/mod.rs
//! Enricher: asks the model for summary, themes, sentiment and relevance of one record.
//!
//! `enrich` never fails. Whatever goes wrong (model call, missing JSON, bad JSON) the
//! record comes back unchanged, optionally with an advisory for the caller.

pub mod ai_adapter;
pub mod parser;

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::analyze::ai_adapter::{build_client_from_config, DynModelClient};
use crate::analyze::parser::{ParserKind, ResponseParser};
use crate::config::DigestConfig;
use crate::error::{Advisory, DigestError};
use crate::ingest::types::NewsRecord;

pub const DEFAULT_SENTIMENT: &str = "neutral";
pub const DEFAULT_RELEVANCE_SCORE: i64 = 5;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("enrich_calls_total", "Model calls issued, one per record.");
        describe_counter!(
            "enrich_failures_total",
            "Records left unenriched because of a model or parse error."
        );
        describe_counter!(
            "enrich_unparsed_total",
            "Model replies without any JSON object."
        );
    });
}

/// Model-derived fields merged onto a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub summary: String,
    pub key_themes: Vec<String>,
    /// Lowercased label, nominally positive | negative | neutral.
    pub sentiment: String,
    /// Nominally 1..=10.
    pub relevance_score: i64,
}

impl Default for Analysis {
    fn default() -> Self {
        Self {
            summary: String::new(),
            key_themes: Vec::new(),
            sentiment: DEFAULT_SENTIMENT.to_string(),
            relevance_score: DEFAULT_RELEVANCE_SCORE,
        }
    }
}

/// A record with or without enrichment. Serializes flat: the analysis fields only
/// appear when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: NewsRecord,
    #[serde(flatten)]
    pub analysis: Option<Analysis>,
}

impl EnrichedRecord {
    pub fn plain(record: NewsRecord) -> Self {
        Self {
            record,
            analysis: None,
        }
    }

    pub fn is_enriched(&self) -> bool {
        self.analysis.is_some()
    }
}

impl From<NewsRecord> for EnrichedRecord {
    fn from(record: NewsRecord) -> Self {
        Self::plain(record)
    }
}

pub fn render_prompt(title: &str, snippet: &str) -> String {
    format!(
        r#"Analyze the following HR news article and provide:
1. A concise 1-sentence summary
2. 3-5 key themes/topics (as a JSON list)
3. Sentiment analysis (positive/negative/neutral)
4. Relevance score to HR professionals (1-10 integer)

Article content:
Title: {title}
{snippet}

Respond in strict JSON format only:
{{
    "summary": "...",
    "key_themes": ["theme1", "theme2", ...],
    "sentiment": "...",
    "relevance_score": ...
}}"#
    )
}

#[derive(Debug)]
pub struct EnrichOutcome {
    pub record: EnrichedRecord,
    pub advisory: Option<Advisory>,
}

pub struct Enricher {
    model: Option<DynModelClient>,
    parser: Box<dyn ResponseParser>,
    unavailable: Option<String>,
}

impl Enricher {
    pub fn new(model: DynModelClient, parser: Box<dyn ResponseParser>) -> Self {
        Self {
            model: Some(model),
            parser,
            unavailable: None,
        }
    }

    /// Pass-through enricher; `reason` is what the caller gets told once per batch.
    pub fn unconfigured(reason: impl Into<String>) -> Self {
        Self {
            model: None,
            parser: ParserKind::default().build(),
            unavailable: Some(reason.into()),
        }
    }

    pub fn from_config(cfg: &DigestConfig) -> Self {
        match build_client_from_config(&cfg.model) {
            Ok(client) => {
                tracing::info!(
                    provider = client.provider_name(),
                    parser = ?cfg.parser.kind,
                    "model client ready"
                );
                Self::new(client, cfg.parser.kind.build())
            }
            Err(e) => {
                tracing::error!(error = %e, "model client unavailable; records pass through");
                Self::unconfigured(e.to_string())
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_some()
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        self.unavailable.as_deref()
    }

    /// Prompt, call, parse. `Ok(None)` when the reply holds no JSON object.
    pub async fn analyze(&self, record: &NewsRecord) -> Result<Option<Analysis>, DigestError> {
        let Some(model) = self.model.as_ref() else {
            return Err(DigestError::Configuration(
                self.unavailable
                    .clone()
                    .unwrap_or_else(|| "model client not configured".to_string()),
            ));
        };
        let prompt = render_prompt(&record.title, &record.snippet);
        let reply = model.generate(&prompt).await?;
        self.parser.parse(&reply)
    }

    pub async fn enrich(&self, record: NewsRecord) -> EnrichOutcome {
        ensure_metrics_described();

        if !self.is_configured() {
            return EnrichOutcome {
                record: EnrichedRecord::plain(record),
                advisory: None,
            };
        }

        counter!("enrich_calls_total").increment(1);
        match self.analyze(&record).await {
            Ok(Some(analysis)) => EnrichOutcome {
                record: EnrichedRecord {
                    record,
                    analysis: Some(analysis),
                },
                advisory: None,
            },
            Ok(None) => {
                counter!("enrich_unparsed_total").increment(1);
                tracing::debug!(link = %record.link, "model reply without JSON; record kept as is");
                EnrichOutcome {
                    record: EnrichedRecord::plain(record),
                    advisory: None,
                }
            }
            Err(e) => {
                counter!("enrich_failures_total").increment(1);
                tracing::warn!(error = %e, link = %record.link, "enrichment failed");
                EnrichOutcome {
                    record: EnrichedRecord::plain(record),
                    advisory: Some(Advisory::from_error("Error processing news item", &e)),
                }
            }
        }
    }
}

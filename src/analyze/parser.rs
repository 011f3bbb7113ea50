// src/analyze/parser.rs
//! Turning free-form model text into an [`Analysis`].
//!
//! Three strategies, picked by `[parser] kind` in the config:
//! * `permissive`: first `{` to last `}`, lenient field coercion, defaults for gaps.
//! * `strict`: the whole reply must be exactly the four-key object (a ```json fence is allowed).
//! * `strict_then_permissive`: strict, falling back to permissive on a schema error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::analyze::{Analysis, DEFAULT_RELEVANCE_SCORE, DEFAULT_SENTIMENT};
use crate::error::DigestError;

pub const SENTIMENTS: [&str; 3] = ["positive", "negative", "neutral"];

pub trait ResponseParser: Send + Sync {
    /// `Ok(None)` means the reply carries no JSON object at all.
    fn parse(&self, text: &str) -> Result<Option<Analysis>, DigestError>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserKind {
    #[default]
    Permissive,
    Strict,
    StrictThenPermissive,
}

impl ParserKind {
    pub fn build(self) -> Box<dyn ResponseParser> {
        match self {
            ParserKind::Permissive => Box::new(PermissiveParser),
            ParserKind::Strict => Box::new(StrictParser),
            ParserKind::StrictThenPermissive => Box::new(StrictThenPermissive),
        }
    }
}

/// Greedy brace match: everything from the first `{` to the last `}`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

// ------------------------------------------------------------
// Permissive
// ------------------------------------------------------------

pub struct PermissiveParser;

impl ResponseParser for PermissiveParser {
    fn parse(&self, text: &str) -> Result<Option<Analysis>, DigestError> {
        let Some(raw) = extract_json_object(text) else {
            return Ok(None);
        };
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| DigestError::parse(format!("invalid JSON in model response: {e}")))?;
        match value {
            Value::Object(map) => Ok(Some(lenient_analysis(&map))),
            _ => Err(DigestError::parse("model response is not a JSON object")),
        }
    }

    fn name(&self) -> &'static str {
        "permissive"
    }
}

fn lenient_analysis(map: &Map<String, Value>) -> Analysis {
    let summary = map
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let key_themes = map
        .get("key_themes")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let sentiment = map
        .get("sentiment")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SENTIMENT.to_string());

    let relevance_score = map
        .get("relevance_score")
        .and_then(coerce_score)
        .unwrap_or(DEFAULT_RELEVANCE_SCORE);

    Analysis {
        summary,
        key_themes,
        sentiment,
        relevance_score,
    }
}

fn coerce_score(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ------------------------------------------------------------
// Strict
// ------------------------------------------------------------

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StrictAnalysis {
    summary: String,
    key_themes: Vec<String>,
    sentiment: String,
    relevance_score: i64,
}

pub struct StrictParser;

impl ResponseParser for StrictParser {
    fn parse(&self, text: &str) -> Result<Option<Analysis>, DigestError> {
        if !text.contains('{') {
            return Ok(None);
        }
        let body = strip_code_fence(text.trim());
        let parsed: StrictAnalysis = serde_json::from_str(body)
            .map_err(|e| DigestError::parse(format!("response does not match schema: {e}")))?;

        let sentiment = parsed.sentiment.trim().to_lowercase();
        if !SENTIMENTS.contains(&sentiment.as_str()) {
            return Err(DigestError::parse(format!(
                "unexpected sentiment label '{}'",
                parsed.sentiment
            )));
        }
        if !(1..=10).contains(&parsed.relevance_score) {
            return Err(DigestError::parse(format!(
                "relevance_score {} outside 1..=10",
                parsed.relevance_score
            )));
        }

        Ok(Some(Analysis {
            summary: parsed.summary,
            key_themes: parsed.key_themes,
            sentiment,
            relevance_score: parsed.relevance_score,
        }))
    }

    fn name(&self) -> &'static str {
        "strict"
    }
}

pub struct StrictThenPermissive;

impl ResponseParser for StrictThenPermissive {
    fn parse(&self, text: &str) -> Result<Option<Analysis>, DigestError> {
        match StrictParser.parse(text) {
            Err(e) => {
                tracing::debug!(error = %e, "strict parse failed, retrying permissively");
                PermissiveParser.parse(text)
            }
            ok => ok,
        }
    }

    fn name(&self) -> &'static str {
        "strict_then_permissive"
    }
}

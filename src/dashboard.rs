// src/dashboard.rs
//! Display-side view of the dataset: rows with defaults applied, filters, aggregates.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::analyze::{Analysis, EnrichedRecord};

pub const TOP_THEMES: usize = 15;
pub const TOP_SOURCES: usize = 10;

/// One table row. Unenriched records get the analysis defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardRow {
    pub title: String,
    pub source: String,
    pub link: String,
    pub snippet: String,
    pub date: String,
    pub summary: String,
    pub key_themes: Vec<String>,
    pub sentiment: String,
    pub relevance_score: i64,
    pub sentiment_label: String,
}

impl From<&EnrichedRecord> for DashboardRow {
    fn from(r: &EnrichedRecord) -> Self {
        let analysis = r.analysis.clone().unwrap_or_default();
        let Analysis {
            summary,
            key_themes,
            sentiment,
            relevance_score,
        } = analysis;
        Self {
            title: r.record.title.clone(),
            source: r.record.source.clone(),
            link: r.record.link.clone(),
            snippet: r.record.snippet.clone(),
            date: r.record.date.clone(),
            summary,
            key_themes,
            sentiment_label: sentiment_label(&sentiment),
            sentiment,
            relevance_score,
        }
    }
}

pub fn sentiment_label(sentiment: &str) -> String {
    match sentiment {
        "positive" => "😊 Positive".to_string(),
        "negative" => "😞 Negative".to_string(),
        "neutral" => "😐 Neutral".to_string(),
        other => other.to_string(),
    }
}

/// News feed filter. `None` lists mean "everything".
#[derive(Debug, Clone, Deserialize)]
pub struct Filter {
    pub sentiments: Option<Vec<String>>,
    pub min_score: i64,
    pub sources: Option<Vec<String>>,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            sentiments: None,
            min_score: crate::analyze::DEFAULT_RELEVANCE_SCORE,
            sources: None,
        }
    }
}

impl Filter {
    pub fn matches(&self, row: &DashboardRow) -> bool {
        let sentiment_ok = self.sentiments.as_ref().map_or(true, |allowed| {
            allowed
                .iter()
                .any(|s| s.trim().eq_ignore_ascii_case(&row.sentiment))
        });
        let source_ok = self
            .sources
            .as_ref()
            .map_or(true, |allowed| allowed.iter().any(|s| s.trim() == row.source));
        sentiment_ok && source_ok && row.relevance_score >= self.min_score
    }

    pub fn apply<'a>(&self, rows: &'a [DashboardRow]) -> Vec<&'a DashboardRow> {
        rows.iter().filter(|r| self.matches(r)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Count {
    pub value: String,
    pub count: usize,
}

/// Count occurrences, most frequent first; ties keep first-seen order.
pub fn value_counts<'a>(items: impl IntoIterator<Item = &'a str>) -> Vec<Count> {
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut counts: Vec<Count> = Vec::new();
    for item in items {
        match index.get(item) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(item, counts.len());
                counts.push(Count {
                    value: item.to_string(),
                    count: 1,
                });
            }
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Aggregates over the whole dataset (filters do not apply).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub total: usize,
    pub sentiment_counts: Vec<Count>,
    pub average_relevance: Option<f64>,
    pub relevance_scores: Vec<i64>,
    pub top_themes: Vec<Count>,
    pub top_sources: Vec<Count>,
}

impl Insights {
    pub fn from_rows(rows: &[DashboardRow]) -> Self {
        let relevance_scores: Vec<i64> = rows.iter().map(|r| r.relevance_score).collect();
        // Summed as f64: permissive scores are unbounded.
        let average_relevance = (!rows.is_empty()).then(|| {
            relevance_scores.iter().map(|&s| s as f64).sum::<f64>() / rows.len() as f64
        });

        let mut top_themes = value_counts(
            rows.iter()
                .flat_map(|r| r.key_themes.iter().map(String::as_str)),
        );
        top_themes.truncate(TOP_THEMES);

        let mut top_sources = value_counts(rows.iter().map(|r| r.source.as_str()));
        top_sources.truncate(TOP_SOURCES);

        Self {
            total: rows.len(),
            sentiment_counts: value_counts(rows.iter().map(|r| r.sentiment_label.as_str())),
            average_relevance,
            relevance_scores,
            top_themes,
            top_sources,
        }
    }
}

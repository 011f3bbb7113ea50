// src/ingest/providers/fixture.rs
//! In-memory search provider: canned hits per keyword, for tests and offline runs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::DigestError;
use crate::ingest::decode_hits;
use crate::ingest::types::{RawHit, SearchProvider, SearchQuery};

#[derive(Default)]
pub struct FixtureProvider {
    results: HashMap<String, Result<Vec<RawHit>, String>>,
    queries: Mutex<Vec<SearchQuery>>,
}

impl FixtureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hits(mut self, keyword: &str, hits: Vec<RawHit>) -> Self {
        self.results.insert(keyword.to_string(), Ok(hits));
        self
    }

    pub fn with_failure(mut self, keyword: &str, message: &str) -> Self {
        self.results
            .insert(keyword.to_string(), Err(message.to_string()));
        self
    }

    /// Load hits from a SerpAPI-shaped JSON body (`{"news_results": [...]}`).
    pub fn with_json(self, keyword: &str, body: &str) -> Result<Self, DigestError> {
        #[derive(serde::Deserialize)]
        struct Body {
            #[serde(default)]
            news_results: Vec<serde_json::Value>,
        }
        let parsed: Body = serde_json::from_str(body)
            .map_err(|e| DigestError::upstream("fixture", format!("malformed fixture: {e}")))?;
        Ok(self.with_hits(keyword, decode_hits(parsed.news_results, "fixture")))
    }

    /// Queries received so far, in call order.
    pub fn queries(&self) -> Vec<SearchQuery> {
        self.queries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

#[async_trait]
impl SearchProvider for FixtureProvider {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawHit>, DigestError> {
        self.queries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(query.clone());

        match self.results.get(&query.query) {
            Some(Ok(hits)) => Ok(hits.iter().take(query.num).cloned().collect()),
            Some(Err(msg)) => Err(DigestError::upstream("fixture", msg)),
            None => Ok(Vec::new()),
        }
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

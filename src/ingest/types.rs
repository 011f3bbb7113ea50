// src/ingest/types.rs
use serde::{Deserialize, Serialize};

use crate::error::DigestError;

/// One hit as returned by the search collaborator. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawHit {
    pub link: Option<String>,
    pub title: Option<String>,
    pub source: Option<RawSource>,
    pub snippet: Option<String>,
    pub date: Option<String>,
}

/// News results carry either `{"name": ...}` or a bare string as source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RawSource {
    Named {
        #[serde(default)]
        name: Option<String>,
    },
    Plain(String),
}

impl RawSource {
    pub fn name(&self) -> Option<&str> {
        match self {
            RawSource::Named { name } => name.as_deref(),
            RawSource::Plain(s) => Some(s.as_str()),
        }
    }
}

/// Canonical record produced by the fetcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsRecord {
    pub title: String,
    pub source: String,
    pub link: String,
    pub snippet: String,
    pub date: String,
}

/// One search request. The fetcher always asks for English/US news.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub num: usize,
    pub language: String,
    pub region: String,
}

impl SearchQuery {
    pub fn news(query: &str, num: usize) -> Self {
        Self {
            query: query.to_string(),
            num,
            language: "en".to_string(),
            region: "us".to_string(),
        }
    }
}

#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawHit>, DigestError>;
    fn name(&self) -> &'static str;
}

// src/ingest/providers/serpapi.rs
//! SerpAPI Google News search (`tbm=nws`).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::error::DigestError;
use crate::ingest::decode_hits;
use crate::ingest::types::{RawHit, SearchProvider, SearchQuery};

const SERVICE: &str = "serpapi";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news_results: Vec<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct Params<'a> {
    engine: &'static str,
    q: &'a str,
    tbm: &'static str,
    num: usize,
    hl: &'a str,
    gl: &'a str,
    api_key: &'a str,
}

pub struct SerpApiProvider {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SerpApiProvider {
    pub fn new(api_key: String, base_url: &str, timeout: Duration) -> Result<Self, DigestError> {
        let http = reqwest::Client::builder()
            .user_agent("hr-news-digest/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .map_err(|e| DigestError::Configuration(format!("search http client: {e}")))?;
        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(api_key: String, cfg: &SearchConfig) -> Result<Self, DigestError> {
        Self::new(api_key, &cfg.base_url, Duration::from_secs(cfg.timeout_secs))
    }
}

#[async_trait]
impl SearchProvider for SerpApiProvider {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawHit>, DigestError> {
        let params = Params {
            engine: "google",
            q: &query.query,
            tbm: "nws",
            num: query.num,
            hl: &query.language,
            gl: &query.region,
            api_key: &self.api_key,
        };

        let resp = self
            .http
            .get(format!("{}/search.json", self.base_url))
            .query(&params)
            .send()
            .await
            .map_err(|e| DigestError::upstream(SERVICE, e))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(DigestError::Api {
                service: SERVICE,
                status: status.as_u16(),
                message,
            });
        }

        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| DigestError::upstream(SERVICE, format!("malformed response: {e}")))?;

        match body.error {
            Some(err) if body.news_results.is_empty() => Err(DigestError::upstream(SERVICE, err)),
            _ => Ok(decode_hits(body.news_results, SERVICE)),
        }
    }

    fn name(&self) -> &'static str {
        "serpapi"
    }
}

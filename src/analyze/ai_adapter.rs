//! AI adapter: model client abstraction + Gemini provider + deterministic mock.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ENV_MODEL_KEY};
use crate::error::DigestError;

pub const ENV_TEST_MODE: &str = "AI_TEST_MODE";

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

/// Trait object used by the enricher (and tests).
pub trait ModelClient: Send + Sync {
    /// Send one prompt and return the raw reply text.
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, DigestError>> + Send + 'a>>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynModelClient = Arc<dyn ModelClient>;

/// Factory: build a client according to config and environment variables.
///
/// * If `AI_TEST_MODE=mock`, returns a deterministic mock client.
/// * Else if `config.enabled==false` or the key is missing, returns a configuration error.
/// * Else builds the real provider.
pub fn build_client_from_config(config: &ModelConfig) -> Result<DynModelClient, DigestError> {
    if std::env::var(ENV_TEST_MODE)
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Ok(Arc::new(MockProvider::canned()));
    }

    if !config.enabled {
        return Err(DigestError::Configuration(
            "AI analysis is disabled in config".to_string(),
        ));
    }

    match config.provider.as_str() {
        "gemini" => {
            let key = config.resolve_api_key().ok_or_else(|| {
                DigestError::Configuration(format!(
                    "{ENV_MODEL_KEY} not found in environment variables"
                ))
            })?;
            Ok(Arc::new(GeminiProvider::from_config(key, config)?))
        }
        "mock" => Ok(Arc::new(MockProvider::canned())),
        other => Err(DigestError::Configuration(format!(
            "unsupported model provider: {other}"
        ))),
    }
}

// ------------------------------------------------------------
// Gemini
// ------------------------------------------------------------

/// Google Gemini `generateContent` API.
pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    json_mode: bool,
}

impl GeminiProvider {
    pub fn new(
        api_key: String,
        model: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, DigestError> {
        let http = reqwest::Client::builder()
            .user_agent("hr-news-digest/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .map_err(|e| DigestError::Configuration(format!("model http client: {e}")))?;
        Ok(Self {
            http,
            api_key,
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            json_mode: false,
        })
    }

    pub fn from_config(api_key: String, cfg: &ModelConfig) -> Result<Self, DigestError> {
        Ok(Self::new(
            api_key,
            &cfg.model,
            &cfg.base_url,
            Duration::from_secs(cfg.timeout_secs),
        )?
        .with_json_mode(cfg.json_mode))
    }

    /// Request `application/json` output instead of free text.
    pub fn with_json_mode(mut self, on: bool) -> Self {
        self.json_mode = on;
        self
    }
}

impl ModelClient for GeminiProvider {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, DigestError>> + Send + 'a>> {
        Box::pin(async move {
            #[derive(Serialize)]
            struct Part<'a> {
                text: &'a str,
            }
            #[derive(Serialize)]
            struct Content<'a> {
                parts: Vec<Part<'a>>,
            }
            #[derive(Serialize)]
            #[serde(rename_all = "camelCase")]
            struct GenerationConfig {
                response_mime_type: &'static str,
            }
            #[derive(Serialize)]
            #[serde(rename_all = "camelCase")]
            struct Req<'a> {
                contents: Vec<Content<'a>>,
                #[serde(skip_serializing_if = "Option::is_none")]
                generation_config: Option<GenerationConfig>,
            }
            #[derive(Deserialize)]
            struct Resp {
                #[serde(default)]
                candidates: Vec<Candidate>,
            }
            #[derive(Deserialize)]
            struct Candidate {
                content: Option<CandidateContent>,
            }
            #[derive(Deserialize)]
            struct CandidateContent {
                #[serde(default)]
                parts: Vec<RespPart>,
            }
            #[derive(Deserialize)]
            struct RespPart {
                text: Option<String>,
            }

            const SERVICE: &str = "gemini";

            let req = Req {
                contents: vec![Content {
                    parts: vec![Part { text: prompt }],
                }],
                generation_config: self.json_mode.then_some(GenerationConfig {
                    response_mime_type: "application/json",
                }),
            };

            let resp = self
                .http
                .post(format!(
                    "{}/v1beta/models/{}:generateContent",
                    self.base_url, self.model
                ))
                .header("x-goog-api-key", &self.api_key)
                .json(&req)
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

            let body: Resp = resp
                .json()
                .await
                .map_err(|e| DigestError::upstream(SERVICE, format!("malformed response: {e}")))?;

            let text: String = body
                .candidates
                .into_iter()
                .next()
                .and_then(|c| c.content)
                .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
                .unwrap_or_default();

            if text.trim().is_empty() {
                return Err(DigestError::upstream(SERVICE, "empty response"));
            }
            Ok(text)
        })
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

// ------------------------------------------------------------
// Mock
// ------------------------------------------------------------

/// Returns the same reply for every prompt; used for tests/local runs.
#[derive(Clone)]
pub struct MockProvider {
    pub fixed: String,
}

impl MockProvider {
    pub fn new(fixed: impl Into<String>) -> Self {
        Self {
            fixed: fixed.into(),
        }
    }

    pub fn canned() -> Self {
        Self::new(
            r#"{"summary": "Neutral summary (mock).", "key_themes": ["workforce", "hiring", "culture"], "sentiment": "neutral", "relevance_score": 6}"#,
        )
    }
}

impl ModelClient for MockProvider {
    fn generate<'a>(
        &'a self,
        _prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, DigestError>> + Send + 'a>> {
        let out = self.fixed.clone();
        Box::pin(async move { Ok(out) })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

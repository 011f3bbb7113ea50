// src/config.rs
//! Runtime configuration loaded from `config/digest.toml` (or `$DIGEST_CONFIG_PATH`).
//!
//! Credentials are never required at load time: `api_key = "ENV"` is resolved lazily
//! and a missing key only leaves the matching component unconfigured.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

use crate::analyze::parser::ParserKind;

pub const DEFAULT_CONFIG_PATH: &str = "config/digest.toml";
pub const ENV_CONFIG_PATH: &str = "DIGEST_CONFIG_PATH";
pub const ENV_SEARCH_KEY: &str = "SERPAPI_KEY";
pub const ENV_MODEL_KEY: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub search: SearchConfig,
    pub model: ModelConfig,
    pub parser: ParserConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// "ENV" (or empty) means: read from SERPAPI_KEY
    pub api_key: String,
    pub base_url: String,
    pub language: String,
    pub region: String,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: "ENV".to_string(),
            base_url: "https://serpapi.com".to_string(),
            language: "en".to_string(),
            region: "us".to_string(),
            timeout_secs: 15,
        }
    }
}

impl SearchConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret(&self.api_key, ENV_SEARCH_KEY)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub enabled: bool,
    /// "gemini" | "mock" (case-insensitive)
    pub provider: String,
    /// "ENV" (or empty) means: read from GEMINI_API_KEY
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Ask the model for `application/json` output.
    pub json_mode: bool,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "gemini".to_string(),
            api_key: "ENV".to_string(),
            model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            json_mode: false,
            timeout_secs: 30,
        }
    }
}

impl ModelConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret(&self.api_key, ENV_MODEL_KEY)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub kind: ParserKind,
}

/// Defaults for the refresh controls and the news filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub keywords: String,
    pub max_results: usize,
    pub min_results: usize,
    pub max_results_limit: usize,
    pub analyze: bool,
    pub min_score: i64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            keywords: "HR trends, talent acquisition, employee engagement".to_string(),
            max_results: 15,
            min_results: 5,
            max_results_limit: 50,
            analyze: true,
            min_score: 5,
        }
    }
}

impl DashboardConfig {
    pub fn clamp_max_results(&self, requested: usize) -> usize {
        requested.clamp(self.min_results, self.max_results_limit)
    }
}

impl DigestConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: DigestConfig = toml::from_str(s)?;
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&data).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Load config using env var + fallbacks:
    /// 1) $DIGEST_CONFIG_PATH (must exist)
    /// 2) config/digest.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            return Self::load_from_file(p);
        }
        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            return Self::load_from_file(default_path);
        }
        Ok(Self::default())
    }

    fn sanitize(&mut self) {
        self.model.provider = self.model.provider.trim().to_lowercase();

        let d = &mut self.dashboard;
        d.min_results = d.min_results.max(1);
        if d.min_results > d.max_results_limit {
            std::mem::swap(&mut d.min_results, &mut d.max_results_limit);
        }
        d.max_results = d.max_results.clamp(d.min_results, d.max_results_limit);
    }
}

fn resolve_secret(raw: &str, env_key: &str) -> Option<String> {
    let t = raw.trim();
    if t.is_empty() || t.eq_ignore_ascii_case("env") {
        env::var(env_key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    } else {
        Some(t.to_string())
    }
}

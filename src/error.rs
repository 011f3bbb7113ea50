// src/error.rs
//! Error taxonomy for the digest pipeline and the advisories handed to callers.
//!
//! Nothing in the fetch/enrich path is fatal: every `DigestError` is turned into an
//! [`Advisory`] that travels next to the (possibly partial) data.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DigestError {
    /// Missing credential or unusable configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network failure or malformed payload from a collaborator.
    #[error("{service} request failed: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    /// Collaborator answered with a non-success status.
    #[error("{service} API error (status {status}): {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// Model output without a usable JSON analysis.
    #[error("parse error: {0}")]
    Parse(String),
}

impl DigestError {
    pub fn upstream(service: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Upstream {
            service,
            message: err.to_string(),
        }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn kind(&self) -> AdvisoryKind {
        match self {
            Self::Configuration(_) => AdvisoryKind::Configuration,
            Self::Upstream { .. } | Self::Api { .. } => AdvisoryKind::Upstream,
            Self::Parse(_) => AdvisoryKind::Parse,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvisoryKind {
    Configuration,
    Upstream,
    Parse,
}

/// Non-fatal message surfaced to the user after a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advisory {
    pub kind: AdvisoryKind,
    pub message: String,
}

impl Advisory {
    pub fn new(kind: AdvisoryKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Wrap an error with a short context prefix, e.g. the keyword being searched.
    pub fn from_error(context: &str, err: &DigestError) -> Self {
        Self::new(err.kind(), format!("{context}: {err}"))
    }
}

// src/session.rs
//! Caller-owned dashboard state: the current dataset and when it was fetched.

use chrono::{DateTime, Utc};

use crate::analyze::EnrichedRecord;
use crate::dashboard::DashboardRow;
use crate::error::Advisory;
use crate::pipeline::{Pipeline, RefreshOutcome, RefreshRequest};

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub dataset: Vec<EnrichedRecord>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace (never merge) the dataset with a refresh result.
    pub fn apply(&mut self, outcome: RefreshOutcome, now: DateTime<Utc>) -> Vec<Advisory> {
        self.dataset = outcome.records;
        self.last_updated = Some(now);
        outcome.advisories
    }

    pub async fn refresh(&mut self, pipeline: &Pipeline, req: &RefreshRequest) -> Vec<Advisory> {
        let outcome = pipeline.refresh(req).await;
        self.apply(outcome, Utc::now())
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    pub fn rows(&self) -> Vec<DashboardRow> {
        self.dataset.iter().map(DashboardRow::from).collect()
    }

    pub fn last_updated_label(&self) -> String {
        self.last_updated
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "Never".to_string())
    }
}

// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod session;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use analyze::ai_adapter;
pub use crate::analyze::{Analysis, EnrichedRecord, Enricher};
pub use crate::api::router;
pub use crate::error::{Advisory, AdvisoryKind, DigestError};
pub use crate::ingest::types::{NewsRecord, RawHit};
pub use crate::ingest::Fetcher;
pub use crate::pipeline::{Pipeline, RefreshOutcome, RefreshRequest};
pub use crate::session::Session;

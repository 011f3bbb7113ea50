// src/ingest/providers/mod.rs
pub mod fixture;
pub mod serpapi;

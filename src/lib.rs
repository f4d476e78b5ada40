//! Lead Generation Dashboard Library
//!
//! Core of the lead-generation dashboard: filtering, sorting and paging of
//! lead lists, CSV export, a bounded search history and the search
//! orchestrator that feeds it, plus the HTTP handlers serving them.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core business logic.
//! - `integrations`: External service integrations.
//! - `adapter`: Mapping between search API payloads and domain types.
//! - `circuit_breaker`: Circuit breaker for search API calls.
//! - `config`: Configuration management.
//! - `csv_export`: CSV serialization and export file naming.
//! - `demo`: Built-in demo catalog and lead generator.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `history_store`: Bounded, most-recent-first search history.
//! - `lead_details`: Deterministic detail enrichment for a lead.
//! - `list_engine`: Filtering, sorting and pagination of lead lists.
//! - `models`: Core data models.
//! - `orchestrator`: Runs searches and records them in history.
//! - `search_client`: Search API client.
//! - `snapshot`: Checksummed serialization for caches and snapshots.

pub mod api;
pub mod core;
pub mod integrations;

// Re-export primary modules for shared use in tests and other binaries
pub mod adapter;
pub mod circuit_breaker;
pub mod config;
pub mod csv_export;
pub mod demo;
pub mod errors;
pub mod handlers;
pub mod history_store;
pub mod lead_details;
pub mod list_engine;
pub mod models;
pub mod orchestrator;
pub mod search_client;
pub mod snapshot;

//! Castline - casting-call ingestion pipeline.
//!
//! Ingests unstructured third-party content (web pages and group-chat
//! messages), classifies and extracts casting opportunities, deduplicates
//! them, and queues them for human moderation.
//!
//! Pipeline: source registry -> intake filter -> (queue) -> classification
//! & extraction -> dedup guard -> (queue) -> moderation.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;

//! Casting-Call Classification Library
//!
//! A small, provider-agnostic library that answers two questions about a
//! piece of raw text:
//!
//! 1. Is this a casting-opportunity announcement? (`classify`)
//! 2. If so, what are its structured fields? (`extract`)
//!
//! # Design Philosophy
//!
//! The two calls are deliberately separate: the classification prompt stays
//! cheap, the extraction prompt stays precise. Callers own the distinction
//! between *content outcomes* (not a casting call, malformed extraction:
//! returned as `Ok(false)` / `Ok(None)`) and *transient faults* (network,
//! timeout, rate limit: returned as `Err(ClassifierError::..)` so the
//! caller's retry machinery can kick in).
//!
//! # Usage
//!
//! ```rust,ignore
//! use classifier::{OpenAiClassifier, TextClassifier};
//!
//! let ai = OpenAiClassifier::from_env()?.with_model("gpt-4o-mini");
//! if ai.classify(text).await? {
//!     if let Some(fields) = ai.extract(text).await? {
//!         println!("{}", fields.title);
//!     }
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - The `TextClassifier` trait
//! - [`types`] - `CastingFields` and its validation
//! - [`openai`] - Reference OpenAI implementation
//! - [`testing`] - Mock implementations for tests

pub mod error;
pub mod openai;
pub mod prompts;
pub mod testing;
pub mod traits;
pub mod types;

pub use error::{ClassifierError, Result};
pub use openai::OpenAiClassifier;
pub use traits::TextClassifier;
pub use types::CastingFields;

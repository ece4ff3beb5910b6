//! The `TextClassifier` trait.
//!
//! Implementations wrap a specific language-understanding collaborator
//! (a hosted model API, a local model, a rules engine for testing) and
//! handle the specifics of prompting and response parsing. The pipeline's
//! correctness is independent of which implementation backs it.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::CastingFields;

/// Two-method capability over raw text.
///
/// Both methods return `Err` only for transient faults. A negative verdict
/// is `Ok(false)`; an extraction that does not satisfy the minimal shape
/// (well-formed object with a non-empty `title`) is `Ok(None)`.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Is this text a casting-opportunity announcement?
    async fn classify(&self, text: &str) -> Result<bool>;

    /// Extract structured fields from the text.
    ///
    /// Returns `Ok(None)` when the response cannot be parsed into the
    /// minimal shape, which is a content-quality outcome, not a failure.
    async fn extract(&self, text: &str) -> Result<Option<CastingFields>>;
}

//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the classifier
//! without making real AI or network calls.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::{ClassifierError, Result};
use crate::traits::TextClassifier;
use crate::types::CastingFields;

/// Record of a call made to the mock classifier.
#[derive(Debug, Clone)]
pub enum MockCall {
    Classify { text_len: usize },
    Extract { text_len: usize },
}

/// A mock `TextClassifier` for testing.
///
/// Defaults to a cheap keyword rule for `classify` and a first-line title
/// for `extract`; both can be overridden per input, and either call can be
/// made to fail with a transport error to exercise retry paths.
#[derive(Default)]
pub struct MockClassifier {
    /// Verdict overrides keyed by exact input text
    verdicts: Arc<RwLock<HashMap<String, bool>>>,

    /// Extraction overrides keyed by exact input text
    extractions: Arc<RwLock<HashMap<String, Option<CastingFields>>>>,

    /// Remaining classify calls that should fail with a transport error
    classify_failures: Arc<RwLock<u32>>,

    /// Remaining extract calls that should fail with a transport error
    extract_failures: Arc<RwLock<u32>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockCall>>>,
}

const KEYWORDS: &[&str] = &["casting", "actor", "actress", "audition", "film", "model"];

impl MockClassifier {
    /// Create a new mock with default keyword behavior.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a verdict for a specific input text.
    pub fn with_verdict(self, text: impl Into<String>, verdict: bool) -> Self {
        self.verdicts.write().unwrap().insert(text.into(), verdict);
        self
    }

    /// Force an extraction result for a specific input text.
    ///
    /// Pass `None` to simulate an unparseable extraction.
    pub fn with_extraction(
        self,
        text: impl Into<String>,
        fields: Option<CastingFields>,
    ) -> Self {
        self.extractions
            .write()
            .unwrap()
            .insert(text.into(), fields);
        self
    }

    /// Make the next `n` classify calls fail with a transport error.
    pub fn fail_classify(self, n: u32) -> Self {
        *self.classify_failures.write().unwrap() = n;
        self
    }

    /// Make the next `n` extract calls fail with a transport error.
    pub fn fail_extract(self, n: u32) -> Self {
        *self.extract_failures.write().unwrap() = n;
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.read().unwrap().clone()
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    fn take_failure(counter: &Arc<RwLock<u32>>) -> bool {
        let mut remaining = counter.write().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            true
        } else {
            false
        }
    }

    /// Default verdict: keyword match, case-insensitive.
    fn keyword_verdict(text: &str) -> bool {
        let lower = text.to_lowercase();
        KEYWORDS.iter().any(|k| lower.contains(k))
    }

    /// Default extraction: first line as title, rest as description.
    fn default_extraction(text: &str) -> Option<CastingFields> {
        let mut lines = text.trim().lines();
        let title = lines.next()?.trim();
        if title.is_empty() {
            return None;
        }

        let mut fields = CastingFields::new(title);
        let rest = lines.collect::<Vec<_>>().join("\n");
        if !rest.trim().is_empty() {
            fields.description = Some(rest.trim().to_string());
        }
        Some(fields)
    }
}

#[async_trait]
impl TextClassifier for MockClassifier {
    async fn classify(&self, text: &str) -> Result<bool> {
        self.calls.write().unwrap().push(MockCall::Classify {
            text_len: text.len(),
        });

        if Self::take_failure(&self.classify_failures) {
            return Err(ClassifierError::Transport(
                "mock classify transport failure".into(),
            ));
        }

        Ok(self
            .verdicts
            .read()
            .unwrap()
            .get(text)
            .copied()
            .unwrap_or_else(|| Self::keyword_verdict(text)))
    }

    async fn extract(&self, text: &str) -> Result<Option<CastingFields>> {
        self.calls.write().unwrap().push(MockCall::Extract {
            text_len: text.len(),
        });

        if Self::take_failure(&self.extract_failures) {
            return Err(ClassifierError::Transport(
                "mock extract transport failure".into(),
            ));
        }

        Ok(self
            .extractions
            .read()
            .unwrap()
            .get(text)
            .cloned()
            .unwrap_or_else(|| Self::default_extraction(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keyword_rule_matches_casting_language() {
        let mock = MockClassifier::new();
        assert!(mock.classify("Casting call for a short film").await.unwrap());
        assert!(mock.classify("We need an ACTOR for Friday").await.unwrap());
        assert!(!mock.classify("Lunch meeting at noon").await.unwrap());
    }

    #[tokio::test]
    async fn verdict_override_wins() {
        let mock = MockClassifier::new().with_verdict("Lunch meeting at noon", true);
        assert!(mock.classify("Lunch meeting at noon").await.unwrap());
    }

    #[tokio::test]
    async fn default_extraction_uses_first_line() {
        let mock = MockClassifier::new();
        let fields = mock
            .extract("Lead actress wanted\nPaid role, Jeddah")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fields.title, "Lead actress wanted");
        assert_eq!(fields.description.as_deref(), Some("Paid role, Jeddah"));
    }

    #[tokio::test]
    async fn transport_failures_are_consumed_in_order() {
        let mock = MockClassifier::new().fail_classify(1);

        let first = mock.classify("casting").await;
        assert!(matches!(first, Err(ClassifierError::Transport(_))));

        let second = mock.classify("casting").await;
        assert!(second.unwrap());
    }

    #[tokio::test]
    async fn calls_are_recorded() {
        let mock = MockClassifier::new();
        let _ = mock.classify("casting").await;
        let _ = mock.extract("casting").await;

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0], MockCall::Classify { .. }));
        assert!(matches!(calls[1], MockCall::Extract { .. }));
    }
}

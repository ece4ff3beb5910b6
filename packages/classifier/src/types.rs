//! Structured fields extracted from a casting-call announcement.

use serde::{Deserialize, Serialize};

/// The structured shape of a casting opportunity.
///
/// `title` is the only required field. Everything else is optional and
/// stored exactly as the model produced it; downstream consumers (e.g.
/// deadline parsing) apply their own lenient interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastingFields {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compensation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "contactInfo", alias = "contact_info")]
    pub contact_info: Option<String>,
}

impl CastingFields {
    /// Create fields with only a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            company: None,
            location: None,
            compensation: None,
            requirements: None,
            deadline: None,
            contact_info: None,
        }
    }

    /// Validate a raw JSON value into `CastingFields`.
    ///
    /// Returns `None` when the value is not an object or has a
    /// missing/empty `title`, the minimal shape a usable extraction must
    /// satisfy. An untyped blob never travels further down the pipeline.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }

        let fields: CastingFields = serde_json::from_value(value.clone()).ok()?;
        if fields.title.trim().is_empty() {
            return None;
        }

        Some(fields.trimmed())
    }

    /// Trim whitespace on every field, dropping optionals that become empty.
    fn trimmed(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            title: self.title.trim().to_string(),
            description: clean(self.description),
            company: clean(self.company),
            location: clean(self.location),
            compensation: clean(self.compensation),
            requirements: clean(self.requirements),
            deadline: clean(self.deadline),
            contact_info: clean(self.contact_info),
        }
    }
}

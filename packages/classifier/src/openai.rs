//! OpenAI implementation of the `TextClassifier` trait.
//!
//! A reference implementation against the chat-completions API.
//!
//! # Example
//!
//! ```rust,ignore
//! use classifier::OpenAiClassifier;
//!
//! let ai = OpenAiClassifier::new("sk-...").with_model("gpt-4o-mini");
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};
use crate::prompts;
use crate::traits::TextClassifier;
use crate::types::CastingFields;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// OpenAI-based classifier.
#[derive(Clone)]
pub struct OpenAiClassifier {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl OpenAiClassifier {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ClassifierError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set the chat model (default: gpt-4o-mini).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the per-call timeout in seconds (default: 30).
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Get the current model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// One chat-completions round trip, returning the raw assistant text.
    async fn chat(&self, system: &str, user: String, json_mode: bool) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.0,
            response_format: json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .timeout(Duration::from_secs(self.timeout_secs))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if response.status().as_u16() == 429 {
            return Err(ClassifierError::RateLimited);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Transport(
                format!("OpenAI returned {status}: {body}").into(),
            ));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Transport(Box::new(e)))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ClassifierError::Transport("no choices in OpenAI response".into()))
    }

    fn map_transport_error(&self, e: reqwest::Error) -> ClassifierError {
        if e.is_timeout() {
            ClassifierError::Timeout {
                seconds: self.timeout_secs,
            }
        } else {
            ClassifierError::Transport(Box::new(e))
        }
    }
}

#[async_trait]
impl TextClassifier for OpenAiClassifier {
    async fn classify(&self, text: &str) -> Result<bool> {
        let answer = self
            .chat(prompts::CLASSIFY_SYSTEM, prompts::classify_prompt(text), false)
            .await?;

        let verdict = parse_verdict(&answer);
        tracing::debug!(model = %self.model, verdict, "classification verdict");
        Ok(verdict)
    }

    async fn extract(&self, text: &str) -> Result<Option<CastingFields>> {
        let answer = self
            .chat(prompts::EXTRACT_SYSTEM, prompts::extract_prompt(text), true)
            .await?;

        let fields = parse_extraction(&answer);
        if fields.is_none() {
            tracing::debug!(model = %self.model, response_len = answer.len(), "extraction response did not satisfy minimal shape");
        }
        Ok(fields)
    }
}

/// Interpret the classification answer. Anything that does not start with
/// an affirmative is treated as negative.
fn parse_verdict(answer: &str) -> bool {
    answer.trim().to_lowercase().starts_with("yes")
}

/// Parse the extraction answer into `CastingFields`.
///
/// Tolerates markdown code fences around the JSON; anything that still
/// fails to parse, or parses without a usable title, yields `None`.
fn parse_extraction(answer: &str) -> Option<CastingFields> {
    let trimmed = answer.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    CastingFields::from_json(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_parsing() {
        assert!(parse_verdict("yes"));
        assert!(parse_verdict("Yes, this is a casting call."));
        assert!(parse_verdict("  YES  "));
        assert!(!parse_verdict("no"));
        assert!(!parse_verdict("It depends"));
        assert!(!parse_verdict(""));
    }

    #[test]
    fn extraction_parses_plain_json() {
        let fields =
            parse_extraction(r#"{"title": "Lead Role", "location": "Riyadh"}"#).unwrap();
        assert_eq!(fields.title, "Lead Role");
        assert_eq!(fields.location.as_deref(), Some("Riyadh"));
    }

    #[test]
    fn extraction_strips_code_fences() {
        let fenced = "```json\n{\"title\": \"Extras\"}\n```";
        let fields = parse_extraction(fenced).unwrap();
        assert_eq!(fields.title, "Extras");
    }

    #[test]
    fn extraction_rejects_garbage() {
        assert!(parse_extraction("not json at all").is_none());
        assert!(parse_extraction(r#"{"company": "no title here"}"#).is_none());
        assert!(parse_extraction(r#""just a string""#).is_none());
    }
}

//! Prompt templates for classification and extraction.
//!
//! Kept in one place so prompt changes are reviewable without touching
//! transport code.

/// System prompt for the classification call.
pub const CLASSIFY_SYSTEM: &str = "\
You are a screening assistant for a casting-opportunity aggregator. \
You read short messages and web page excerpts and decide whether they \
announce a casting opportunity: a role, audition, or paid appearance for \
actors, models, voice artists, or extras. Promotional chatter, acting \
classes, congratulations, and general discussion are NOT casting \
opportunities. Answer with exactly one word: yes or no.";

/// System prompt for the extraction call.
pub const EXTRACT_SYSTEM: &str = "\
You extract structured casting-call data from raw text. Respond with a \
single JSON object and nothing else. Required key: \"title\" (a short, \
specific name for the opportunity). Optional keys, include only when the \
text supports them: \"description\", \"company\", \"location\", \
\"compensation\", \"requirements\", \"deadline\", \"contactInfo\". \
Never invent information that is not in the text.";

/// Build the user message for the classification call.
pub fn classify_prompt(text: &str) -> String {
    format!("Is the following text a casting-opportunity announcement?\n\n---\n{text}\n---")
}

/// Build the user message for the extraction call.
pub fn extract_prompt(text: &str) -> String {
    format!("Extract the casting call from this text:\n\n---\n{text}\n---")
}

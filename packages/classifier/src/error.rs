//! Typed errors for the classifier library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Every variant except `Config` is a transient fault from the caller's
//! point of view: the same call may succeed if repeated. Content-quality
//! problems (a negative verdict, an unparseable extraction) are NOT errors
//! and never appear here.

use thiserror::Error;

/// Errors that can occur while talking to the language-understanding
/// collaborator.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// HTTP transport failed (connection refused, DNS, 5xx from provider)
    #[error("classifier transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The call exceeded its deadline
    #[error("classifier call timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Provider rejected the call with a rate limit
    #[error("classifier rate limited")]
    RateLimited,

    /// Configuration error (missing API key, bad base URL)
    #[error("config error: {0}")]
    Config(String),
}

impl ClassifierError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, ClassifierError::Config(_))
    }
}

/// Result type alias for classifier operations.
pub type Result<T> = std::result::Result<T, ClassifierError>;

//! Error types shared across examforge crates.
//!
//! `ProviderError` lives here so content flows can classify upstream model
//! failures without string matching, whichever provider produced them.

use thiserror::Error;

use crate::model::SectionKind;

/// Errors that can occur when interacting with a hosted model provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The model answered but produced nothing usable.
    #[error("model returned no usable output: {0}")]
    EmptyOutput(String),

    /// The provider does not offer this capability.
    #[error("{provider} does not support {capability}")]
    Unsupported {
        provider: String,
        capability: &'static str,
    },
}

/// Structural violations found while loading a test document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("expected exactly 4 sections, found {0}")]
    SectionCount(usize),

    #[error("duplicate section: {0}")]
    DuplicateSection(SectionKind),

    #[error("missing section: {0}")]
    MissingSection(SectionKind),
}

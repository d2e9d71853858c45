//! Error types for a single essay submission.
//!
//! `ProviderError` lives here rather than in `essaymark-providers` so the
//! evaluator and the HTTP layer can classify failures without depending on a
//! concrete provider.

use thiserror::Error;

/// Errors that can occur when calling the scoring agent.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The agent rejected the credentials.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The agent returned a non-success status.
    #[error("API error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },

    /// The request did not complete within the configured deadline.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The call succeeded but the response envelope was unusable.
    #[error("invalid response envelope: {0}")]
    InvalidEnvelope(String),
}

impl ProviderError {
    /// HTTP status reported by the agent, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body kept for diagnostics.
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            ProviderError::ApiError { body, .. } | ProviderError::AuthenticationFailed(body) => {
                Some(body)
            }
            _ => None,
        }
    }
}

/// Everything that can end a submission.
///
/// None of these are retried: a second agent call with the same essay is not
/// guaranteed to behave differently and is billed again.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// Required credentials or identifiers are missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The submitted text was rejected before any agent call.
    #[error("invalid submission: {0}")]
    Validation(String),

    /// The agent call itself failed.
    #[error("scoring service error: {0}")]
    Upstream(#[from] ProviderError),

    /// The agent answered, but its content is not a valid evaluation.
    #[error("malformed evaluation payload: {0}")]
    MalformedResponse(String),
}

impl EvaluationError {
    /// Short machine-readable kind, used in logs and API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            EvaluationError::Configuration(_) => "configuration",
            EvaluationError::Validation(_) => "validation",
            EvaluationError::Upstream(_) => "upstream",
            EvaluationError::MalformedResponse(_) => "malformed_response",
        }
    }

    /// Raw upstream body for diagnostics, if the agent sent one.
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            EvaluationError::Upstream(e) => e.raw_body(),
            _ => None,
        }
    }
}

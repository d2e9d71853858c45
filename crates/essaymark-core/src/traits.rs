//! Seams to the two external collaborators: the scoring agent and the
//! review store.
//!
//! Implemented by `essaymark-providers` and `essaymark-store` respectively.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProviderError;

// ---------------------------------------------------------------------------
// Scoring provider
// ---------------------------------------------------------------------------

/// A remote agent that scores essay text.
#[async_trait]
pub trait ScoringProvider: Send + Sync {
    /// Human-readable provider name (e.g. "agentspro").
    fn name(&self) -> &str;

    /// Send text to the agent and return its raw reply content.
    ///
    /// Exactly one upstream call per invocation; implementations must not
    /// retry.
    async fn score(&self, request: &ScoreRequest) -> Result<ScoreResponse, ProviderError>;
}

/// Text sent to the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRequest {
    /// Essay text, or a free-form chat prompt.
    pub input_text: String,
    /// Agent-side conversation id. Always `None` for essay scoring.
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ScoreRequest {
    pub fn new(input_text: impl Into<String>) -> Self {
        Self {
            input_text: input_text.into(),
            session_id: None,
        }
    }
}

/// The agent's reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResponse {
    /// Raw content of the first choice, usually a fenced JSON document.
    pub content: String,
    /// Wall-clock latency of the call in milliseconds.
    pub latency_ms: u64,
}

// ---------------------------------------------------------------------------
// Review store
// ---------------------------------------------------------------------------

/// Create-only persistence for finished evaluations.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Persist a review and return the stored record.
    async fn save(&self, review: &NewReview) -> anyhow::Result<ReviewRecord>;

    /// Most recent reviews for a user, newest first.
    async fn list_for_user(&self, user_id: &str, limit: usize) -> anyhow::Result<Vec<ReviewRecord>>;
}

/// A review about to be stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
    pub user_id: String,
    pub essay_text: String,
    /// The evaluation, serialized as an opaque JSON document.
    pub review_json: String,
}

/// A stored review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: Uuid,
    pub user_id: String,
    pub essay_text: String,
    pub review_json: String,
    pub created_at: DateTime<Utc>,
}

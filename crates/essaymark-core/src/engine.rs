//! Submission orchestrator.
//!
//! One submission is: validate the text, make exactly one agent call,
//! normalize and parse the reply, then hand the result to the review store
//! if one is configured. A failing store never turns a finished evaluation
//! into a failure.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::error::EvaluationError;
use crate::model::EvaluationResult;
use crate::normalize::parse_evaluation;
use crate::traits::{NewReview, ReviewRecord, ReviewStore, ScoreRequest, ScoringProvider};

/// Default upper bound on essay length, in whitespace-separated words.
pub const DEFAULT_MAX_WORDS: usize = 500;

/// Configuration for the evaluator.
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// Submissions longer than this are rejected before calling the agent.
    pub max_words: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            max_words: DEFAULT_MAX_WORDS,
        }
    }
}

/// An essay submitted for evaluation.
#[derive(Debug, Clone)]
pub struct Submission {
    pub text: String,
    /// Owner of the review; persistence is skipped without one.
    pub user_id: Option<String>,
}

impl Submission {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            user_id: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// A finished evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub result: EvaluationResult,
    /// Agent latency in milliseconds.
    pub latency_ms: u64,
    /// Total time for the submission in milliseconds.
    pub total_ms: u64,
    /// The stored review, when persistence was configured and succeeded.
    pub review: Option<ReviewRecord>,
}

/// Runs submissions against a scoring provider.
pub struct Evaluator {
    provider: Arc<dyn ScoringProvider>,
    store: Option<Arc<dyn ReviewStore>>,
    config: EvaluatorConfig,
}

impl Evaluator {
    pub fn new(provider: Arc<dyn ScoringProvider>, config: EvaluatorConfig) -> Self {
        Self {
            provider,
            store: None,
            config,
        }
    }

    /// Attach a review store.
    pub fn with_store(mut self, store: Arc<dyn ReviewStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn store(&self) -> Option<&Arc<dyn ReviewStore>> {
        self.store.as_ref()
    }

    /// Reject text that must not reach the agent.
    pub fn validate(&self, text: &str) -> Result<(), EvaluationError> {
        if text.trim().is_empty() {
            return Err(EvaluationError::Validation(
                "essay text is missing or empty".into(),
            ));
        }
        let words = text.split_whitespace().count();
        if words > self.config.max_words {
            return Err(EvaluationError::Validation(format!(
                "essay has {words} words, the limit is {}",
                self.config.max_words
            )));
        }
        Ok(())
    }

    /// Evaluate one essay.
    pub async fn evaluate(&self, submission: &Submission) -> Result<Evaluation, EvaluationError> {
        let start = Instant::now();
        self.validate(&submission.text)?;

        tracing::info!(
            provider = self.provider.name(),
            chars = submission.text.len(),
            "submitting essay for evaluation"
        );

        let response = self
            .provider
            .score(&ScoreRequest::new(submission.text.clone()))
            .await
            .inspect_err(|e| tracing::error!("scoring call failed: {e}"))?;

        let result = parse_evaluation(&response.content).inspect_err(|e| {
            tracing::error!(
                content_len = response.content.len(),
                "evaluation failed: {e}"
            )
        })?;

        tracing::info!(
            overall = result.overall_score,
            latency_ms = response.latency_ms,
            "evaluation parsed"
        );

        let review = match &submission.user_id {
            Some(user_id) => self.persist(user_id, &submission.text, &result).await,
            None => None,
        };

        Ok(Evaluation {
            result,
            latency_ms: response.latency_ms,
            total_ms: start.elapsed().as_millis() as u64,
            review,
        })
    }

    /// Forward a free-form prompt and return the agent's raw reply.
    pub async fn chat(&self, prompt: &str) -> Result<String, EvaluationError> {
        if prompt.trim().is_empty() {
            return Err(EvaluationError::Validation("prompt is empty".into()));
        }
        tracing::info!(chars = prompt.len(), "forwarding chat prompt");
        let response = self.provider.score(&ScoreRequest::new(prompt)).await?;
        Ok(response.content)
    }

    async fn persist(
        &self,
        user_id: &str,
        essay_text: &str,
        result: &EvaluationResult,
    ) -> Option<ReviewRecord> {
        let store = self.store.as_ref()?;

        let review_json = match serde_json::to_string(result) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("could not serialize review for {user_id}: {e}");
                return None;
            }
        };

        let review = NewReview {
            user_id: user_id.to_string(),
            essay_text: essay_text.to_string(),
            review_json,
        };

        match store.save(&review).await {
            Ok(record) => {
                tracing::info!(review_id = %record.id, user_id, "review saved");
                Some(record)
            }
            Err(e) => {
                tracing::warn!(user_id, "failed to save review: {e:#}");
                None
            }
        }
    }
}

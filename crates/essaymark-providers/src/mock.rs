//! Mock provider for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use essaymark_core::error::ProviderError;
use essaymark_core::traits::{ScoreRequest, ScoreResponse, ScoringProvider};

enum Reply {
    Content(String),
    Status { status: u16, body: String },
}

/// A scoring provider that answers without any network traffic.
pub struct MockProvider {
    reply: Reply,
    /// Simulated agent latency.
    delay: Option<Duration>,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last request received.
    last_request: Mutex<Option<ScoreRequest>>,
}

impl MockProvider {
    /// Always reply with `content`.
    pub fn with_fixed_response(content: &str) -> Self {
        Self {
            reply: Reply::Content(content.to_string()),
            delay: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Always fail with an HTTP error.
    pub fn with_error(status: u16, body: &str) -> Self {
        Self {
            reply: Reply::Status {
                status,
                body: body.to_string(),
            },
            delay: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Sleep for `delay` before replying.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get the number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this provider.
    pub fn last_request(&self) -> Option<ScoreRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ScoringProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn score(&self, request: &ScoreRequest) -> Result<ScoreResponse, ProviderError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.reply {
            Reply::Content(content) => Ok(ScoreResponse {
                content: content.clone(),
                latency_ms: self.delay.map(|d| d.as_millis() as u64).unwrap_or(1),
            }),
            Reply::Status { status, body } => Err(ProviderError::ApiError {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_response() {
        let provider = MockProvider::with_fixed_response("```json\n{}\n```");
        let response = provider.score(&ScoreRequest::new("essay")).await.unwrap();
        assert_eq!(response.content, "```json\n{}\n```");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.last_request().unwrap().input_text, "essay");
    }

    #[tokio::test]
    async fn error_response() {
        let provider = MockProvider::with_error(502, "bad gateway");
        let err = provider.score(&ScoreRequest::new("essay")).await.unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.raw_body(), Some("bad gateway"));
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_response() {
        let provider = MockProvider::with_fixed_response("late").with_delay(Duration::from_secs(5));
        let response = provider.score(&ScoreRequest::new("essay")).await.unwrap();
        assert_eq!(response.latency_ms, 5000);
    }
}

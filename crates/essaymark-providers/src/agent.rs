//! AgentsPro chat-completions client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use essaymark_core::error::ProviderError;
use essaymark_core::traits::{ScoreRequest, ScoreResponse, ScoringProvider};

const COMPLETIONS_PATH: &str = "/openapi/agent/chat/completions/v1";

/// Agent identity and the two secrets that make up the bearer token.
///
/// Note: Debug masks both secrets.
#[derive(Clone)]
pub struct AgentCredentials {
    pub agent_id: String,
    pub auth_key: String,
    pub auth_secret: String,
}

impl AgentCredentials {
    fn bearer(&self) -> String {
        format!("Bearer {}.{}", self.auth_key, self.auth_secret)
    }
}

impl std::fmt::Debug for AgentCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentCredentials")
            .field("agent_id", &self.agent_id)
            .field("auth_key", &"***")
            .field("auth_secret", &"***")
            .finish()
    }
}

/// Client for one configured agent.
pub struct AgentsProProvider {
    credentials: AgentCredentials,
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl AgentsProProvider {
    pub fn new(
        credentials: AgentCredentials,
        base_url: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            credentials,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_secs,
            client,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, COMPLETIONS_PATH)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AgentRequest<'a> {
    agent_id: &'a str,
    chat_id: Option<&'a str>,
    user_chat_input: &'a str,
}

#[derive(Deserialize)]
struct AgentResponse {
    #[serde(default)]
    choices: Vec<AgentChoice>,
}

#[derive(Deserialize)]
struct AgentChoice {
    content: String,
}

#[async_trait]
impl ScoringProvider for AgentsProProvider {
    fn name(&self) -> &str {
        "agentspro"
    }

    #[instrument(skip(self, request), fields(agent = %self.credentials.agent_id, chars = request.input_text.len()))]
    async fn score(&self, request: &ScoreRequest) -> Result<ScoreResponse, ProviderError> {
        let start = Instant::now();

        let body = AgentRequest {
            agent_id: &self.credentials.agent_id,
            chat_id: request.session_id.as_deref(),
            user_chat_input: &request.input_text,
        };

        let url = self.endpoint();
        tracing::debug!(%url, "sending agent request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.credentials.bearer())
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(self.timeout_secs)
                } else {
                    ProviderError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout_secs)
            } else {
                ProviderError::NetworkError(e.to_string())
            }
        })?;

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(text));
        }
        if !(200..300).contains(&status) {
            tracing::error!(status, body = %text, "agent returned an error");
            return Err(ProviderError::ApiError { status, body: text });
        }

        let envelope: AgentResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::InvalidEnvelope(format!("failed to parse response: {e}")))?;

        let content = envelope
            .choices
            .into_iter()
            .next()
            .map(|c| c.content)
            .ok_or_else(|| ProviderError::InvalidEnvelope("response has no choices".into()))?;

        let latency_ms = start.elapsed().as_millis() as u64;
        tracing::info!(latency_ms, content_len = content.len(), "agent replied");

        Ok(ScoreResponse {
            content,
            latency_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> AgentCredentials {
        AgentCredentials {
            agent_id: "agent-123".into(),
            auth_key: "key".into(),
            auth_secret: "secret".into(),
        }
    }

    #[tokio::test]
    async fn successful_call() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "choices": [{"content": "```json\n{\"a\":1}\n```", "role": "assistant"}]
        });

        Mock::given(method("POST"))
            .and(path(COMPLETIONS_PATH))
            .and(header("Authorization", "Bearer key.secret"))
            .and(body_json(serde_json::json!({
                "agentId": "agent-123",
                "chatId": null,
                "userChatInput": "I like apples."
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .expect(1)
            .mount(&server)
            .await;

        let provider = AgentsProProvider::new(credentials(), server.uri(), 5).unwrap();
        let response = provider
            .score(&ScoreRequest::new("I like apples."))
            .await
            .unwrap();
        assert_eq!(response.content, "```json\n{\"a\":1}\n```");
    }

    #[tokio::test]
    async fn error_status_keeps_raw_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(COMPLETIONS_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .expect(1)
            .mount(&server)
            .await;

        let provider = AgentsProProvider::new(credentials(), server.uri(), 5).unwrap();
        let err = provider.score(&ScoreRequest::new("text")).await.unwrap_err();
        match err {
            ProviderError::ApiError { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "internal error");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unauthorized() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let provider = AgentsProProvider::new(credentials(), server.uri(), 5).unwrap();
        let err = provider.score(&ScoreRequest::new("text")).await.unwrap_err();
        assert!(matches!(err, ProviderError::AuthenticationFailed(ref b) if b == "bad token"));
    }

    #[tokio::test]
    async fn empty_choices() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let provider = AgentsProProvider::new(credentials(), server.uri(), 5).unwrap();
        let err = provider.score(&ScoreRequest::new("text")).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidEnvelope(_)));
    }

    #[tokio::test]
    async fn non_json_envelope() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let provider = AgentsProProvider::new(credentials(), server.uri(), 5).unwrap();
        let err = provider.score(&ScoreRequest::new("text")).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidEnvelope(_)));
    }

    #[tokio::test]
    async fn slow_agent_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"choices": [{"content": "late"}]}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let provider = AgentsProProvider::new(credentials(), server.uri(), 1).unwrap();
        let err = provider.score(&ScoreRequest::new("text")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(1)), "got: {err}");
    }

    #[test]
    fn debug_masks_secrets() {
        let debug = format!("{:?}", credentials());
        assert!(debug.contains("agent-123"));
        assert!(!debug.contains("secret\""));
        assert!(!debug.contains("\"key\""));
    }

    #[test]
    fn trailing_slash_in_base_url() {
        let provider = AgentsProProvider::new(credentials(), "https://uat.agentspro.cn/", 5).unwrap();
        assert_eq!(
            provider.endpoint(),
            "https://uat.agentspro.cn/openapi/agent/chat/completions/v1"
        );
    }
}

//! API routes.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use essaymark_core::engine::{Evaluation, Submission};
use essaymark_core::error::EvaluationError;
use essaymark_core::model::EvaluationResult;
use essaymark_core::view::ViewState;
use essaymark_report::render_page;
pub use essaymark_report::SESSION_HEADER;

use crate::error::ApiError;
use crate::state::AppState;

type AppStateArc = Arc<AppState>;

const CHAT_CHUNK_CHARS: usize = 5;
const EMPTY_PROMPT_REPLY: &str = "请输入有效的问题";
const NO_ANSWER_REPLY: &str = "抱歉，无法获取回答。";

// ============================================================================
// Page
// ============================================================================

pub fn page_routes() -> Router<AppStateArc> {
    Router::new().route("/", get(index))
}

async fn index() -> Html<String> {
    Html(render_page(ViewState::new("")))
}

// ============================================================================
// Evaluation
// ============================================================================

pub fn evaluation_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/api/essay_evaluation", post(evaluate_json))
        .route("/api/essay_evaluation/view", post(evaluate_view))
}

/// Body of an evaluation request. `text` stays untyped so a non-string is
/// reported as a validation failure rather than an extractor rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    #[serde(default)]
    pub text: serde_json::Value,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl EvaluationRequest {
    fn submission(&self) -> Result<Submission, EvaluationError> {
        let text = self.text.as_str().ok_or_else(|| {
            EvaluationError::Validation("Invalid or missing essay text".into())
        })?;
        let submission = Submission::new(text);
        Ok(match self.user() {
            Some(user) => submission.with_user(user),
            None => submission,
        })
    }

    fn user(&self) -> Option<&str> {
        self.user_id.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

/// Session header if present, else the submitting user.
fn session_key(headers: &HeaderMap, request: &EvaluationRequest) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| request.user())
        .map(str::to_string)
}

fn rejected(rejection: JsonRejection) -> ApiError {
    EvaluationError::Validation(format!("Invalid request body: {}", rejection.body_text())).into()
}

async fn submit(
    state: &AppState,
    headers: &HeaderMap,
    request: &EvaluationRequest,
) -> Result<Evaluation, ApiError> {
    let submission = request.submission()?;
    state.evaluator.validate(&submission.text)?;

    let _guard = match session_key(headers, request) {
        Some(key) => match state.in_flight.try_acquire(&key) {
            Some(guard) => Some(guard),
            None => {
                warn!(session = %key, "rejecting duplicate submission");
                return Err(ApiError::Busy);
            }
        },
        None => None,
    };

    let evaluation = state.evaluator.evaluate(&submission).await?;
    info!(
        overall = evaluation.result.overall_score,
        total_ms = evaluation.total_ms,
        "evaluation complete"
    );
    Ok(evaluation)
}

async fn evaluate_json(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
    payload: Result<Json<EvaluationRequest>, JsonRejection>,
) -> Result<Json<EvaluationResult>, ApiError> {
    let Json(request) = payload.map_err(rejected)?;
    let evaluation = submit(&state, &headers, &request).await?;
    Ok(Json(evaluation.result))
}

async fn evaluate_view(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
    payload: Result<Json<EvaluationRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let err = rejected(rejection);
            let view = ViewState::new("").with_error(err.user_message());
            return (err.status(), Html(render_page(view))).into_response();
        }
    };

    let view = ViewState::new(request.text.as_str().unwrap_or_default()).loading();
    match submit(&state, &headers, &request).await {
        Ok(evaluation) => Html(render_page(view.with_result(evaluation.result))).into_response(),
        Err(err) => {
            let status = err.status();
            let view = view.with_error(err.user_message());
            (status, Html(render_page(view))).into_response()
        }
    }
}

// ============================================================================
// Chat
// ============================================================================

pub fn chat_routes() -> Router<AppStateArc> {
    Router::new().route("/chat", post(chat))
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: String,
}

async fn chat(
    State(state): State<AppStateArc>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let prompt = payload.map(|Json(r)| r.prompt).unwrap_or_default();
    if prompt.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "text": EMPTY_PROMPT_REPLY })),
        )
            .into_response();
    }

    let reply = match state.evaluator.chat(&prompt).await {
        Ok(reply) if !reply.trim().is_empty() => reply,
        Ok(_) => NO_ANSWER_REPLY.to_string(),
        Err(e) => {
            warn!("chat relay failed: {e}");
            NO_ANSWER_REPLY.to_string()
        }
    };
    info!(chars = reply.chars().count(), "streaming chat reply");

    Sse::new(chat_events(&reply)).into_response()
}

/// Split on character boundaries, never inside a code point.
fn chunk_reply(reply: &str) -> Vec<String> {
    let chars: Vec<char> = reply.chars().collect();
    chars
        .chunks(CHAT_CHUNK_CHARS)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// One event per chunk, each carrying the chunk as a JSON string.
fn chat_events(reply: &str) -> impl Stream<Item = Result<Event, axum::Error>> {
    let events: Vec<_> = chunk_reply(reply)
        .into_iter()
        .map(|chunk| Event::default().json_data(chunk))
        .collect();
    stream::iter(events)
}

// ============================================================================
// Health
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/health", get(health_check))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
    pub provider: String,
    pub uptime_seconds: u64,
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend: "running",
        provider: state.evaluator.provider_name().to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

//! Mapping of submission failures onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use essaymark_core::error::EvaluationError;

/// Why a request did not produce an evaluation.
#[derive(Debug)]
pub enum ApiError {
    /// The evaluator rejected or failed the submission.
    Evaluation(EvaluationError),
    /// Another submission for the same session is still running.
    Busy,
}

impl From<EvaluationError> for ApiError {
    fn from(e: EvaluationError) -> Self {
        ApiError::Evaluation(e)
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Busy => StatusCode::CONFLICT,
            ApiError::Evaluation(e) => match e {
                EvaluationError::Validation(_) => StatusCode::BAD_REQUEST,
                EvaluationError::Upstream(_) | EvaluationError::MalformedResponse(_) => {
                    StatusCode::BAD_GATEWAY
                }
                EvaluationError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Message safe to show to the person who submitted the essay.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Busy => "A submission for this session is already in progress".into(),
            ApiError::Evaluation(e) => match e {
                EvaluationError::Validation(msg) => msg.clone(),
                EvaluationError::Upstream(_) => "API Error".into(),
                EvaluationError::MalformedResponse(_) => "Evaluation failed".into(),
                EvaluationError::Configuration(_) => "Service is not configured".into(),
            },
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::Busy => ErrorBody {
                error: self.user_message(),
                kind: Some("busy"),
                raw: None,
            },
            ApiError::Evaluation(e) => ErrorBody {
                error: self.user_message(),
                kind: Some(e.kind()),
                raw: e.raw_body().map(str::to_string),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

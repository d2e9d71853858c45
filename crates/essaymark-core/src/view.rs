//! Presentation state for one evaluator page.
//!
//! The page owns a `ViewState` value and hands it to the renderer by value.
//! Transitions consume the old state and return the next one.

use serde::{Deserialize, Serialize};

use crate::annotate::{annotate_essay, LevelTally, Segment};
use crate::model::EvaluationResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Editing; nothing submitted yet.
    Idle,
    /// A submission is in flight; the submit control is disabled.
    Loading,
    /// A result is available.
    Ready,
    /// The last submission failed.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub essay_text: String,
    pub phase: Phase,
    #[serde(default)]
    pub result: Option<EvaluationResult>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ViewState {
    pub fn new(essay_text: impl Into<String>) -> Self {
        Self {
            essay_text: essay_text.into(),
            phase: Phase::Idle,
            result: None,
            error: None,
        }
    }

    /// Enter the loading phase. A previous result is kept until replaced.
    pub fn loading(self) -> Self {
        Self {
            phase: Phase::Loading,
            error: None,
            ..self
        }
    }

    pub fn with_result(self, result: EvaluationResult) -> Self {
        Self {
            phase: Phase::Ready,
            result: Some(result),
            error: None,
            ..self
        }
    }

    /// Record a failure. The previous result is dropped so stale colors are
    /// never shown for new text.
    pub fn with_error(self, message: impl Into<String>) -> Self {
        Self {
            phase: Phase::Failed,
            result: None,
            error: Some(message.into()),
            ..self
        }
    }

    /// Whether the submit control should be enabled.
    pub fn can_submit(&self) -> bool {
        self.phase != Phase::Loading && !self.essay_text.trim().is_empty()
    }

    /// Annotated essay, available once a result is ready.
    pub fn segments(&self) -> Vec<Segment> {
        match (&self.phase, &self.result) {
            (Phase::Ready, Some(result)) => annotate_essay(&self.essay_text, result),
            _ => Vec::new(),
        }
    }

    pub fn tally(&self) -> LevelTally {
        LevelTally::from_segments(&self.segments())
    }
}

//! essaymark-core: evaluation model, response normalizer, and CEFR
//! vocabulary annotator.
//!
//! This crate holds the data model, the two seams to external collaborators,
//! and the submission orchestrator that the rest of essaymark builds on.

pub mod annotate;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalize;
pub mod traits;
pub mod view;

pub use error::{EvaluationError, ProviderError};
pub use model::{CefrLevel, EvaluationResult};

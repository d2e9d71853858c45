//! essaymark-providers: scoring agent integration.
//!
//! Implements the `ScoringProvider` trait for the AgentsPro chat-completions
//! API and loads the workspace configuration.

pub mod agent;
pub mod config;
pub mod mock;

pub use config::{create_provider, load_config, EssaymarkConfig};
pub use essaymark_core::error::ProviderError;

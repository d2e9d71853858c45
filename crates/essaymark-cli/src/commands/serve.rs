//! The `essaymark serve` command.

use std::path::PathBuf;

use anyhow::Result;

use essaymark_providers::config::load_config_from;
use essaymark_server::AppState;

pub async fn execute(config: Option<PathBuf>, bind: Option<String>) -> Result<()> {
    let config = load_config_from(config.as_deref())?;
    let evaluator = super::build_evaluator(&config)?;
    let bind = bind.unwrap_or(config.server.bind);

    tracing::info!(
        provider = evaluator.provider_name(),
        max_words = config.server.max_words,
        persistence = config.store.path.is_some(),
        "starting essaymark server"
    );
    essaymark_server::run(AppState::new(evaluator), &bind).await
}

//! The `essaymark evaluate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use essaymark_core::engine::Submission;
use essaymark_core::view::ViewState;
use essaymark_providers::config::load_config_from;
use essaymark_report::write_html_report;

pub async fn execute(
    essay: PathBuf,
    user: Option<String>,
    html: Option<PathBuf>,
    json: bool,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config.as_deref())?;
    let evaluator = super::build_evaluator(&config)?;
    let text = super::read_text(&essay)?;

    let submission = match user {
        Some(user) => Submission::new(text.clone()).with_user(user),
        None => Submission::new(text.clone()),
    };

    eprintln!("Evaluating {} with {}...", essay.display(), evaluator.provider_name());
    let evaluation = evaluator
        .evaluate(&submission)
        .await
        .context("evaluation failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&evaluation.result)?);
    } else {
        super::print_summary(&text, &evaluation.result);
        eprintln!("Agent latency: {}ms", evaluation.latency_ms);
    }

    if let Some(review) = &evaluation.review {
        eprintln!("Saved review {}", review.id);
    }

    if let Some(path) = html {
        write_html_report(ViewState::new(text).with_result(evaluation.result), &path)?;
        eprintln!("Wrote {}", path.display());
    }

    Ok(())
}

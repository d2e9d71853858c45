//! The `essaymark render` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use essaymark_core::normalize::parse_evaluation;
use essaymark_core::view::ViewState;
use essaymark_report::write_html_report;

pub fn execute(result: PathBuf, essay: PathBuf, output: PathBuf) -> Result<()> {
    let content = super::read_text(&result)?;
    let evaluation = parse_evaluation(&content)
        .with_context(|| format!("{} is not a valid evaluation", result.display()))?;
    let text = super::read_text(&essay)?;

    super::print_summary(&text, &evaluation);
    write_html_report(ViewState::new(text).with_result(evaluation), &output)?;
    println!("Wrote {}", output.display());
    Ok(())
}

//! Subcommand implementations.

pub mod evaluate;
pub mod history;
pub mod init;
pub mod render;
pub mod serve;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use essaymark_core::annotate::{annotate_essay, LevelTally};
use essaymark_core::engine::{Evaluator, EvaluatorConfig};
use essaymark_core::model::{CefrLevel, EvaluationResult};
use essaymark_core::traits::ScoringProvider;
use essaymark_providers::config::StoreConfig;
use essaymark_providers::{create_provider, EssaymarkConfig};
use essaymark_store::SqliteReviewStore;

/// Build the evaluator described by `config`, with persistence if configured.
pub(crate) fn build_evaluator(config: &EssaymarkConfig) -> Result<Evaluator> {
    let provider: Arc<dyn ScoringProvider> = Arc::from(create_provider(&config.agent)?);
    let evaluator = Evaluator::new(
        provider,
        EvaluatorConfig {
            max_words: config.server.max_words,
        },
    );

    Ok(match open_store(&config.store)? {
        Some(store) => evaluator.with_store(Arc::new(store)),
        None => evaluator,
    })
}

pub(crate) fn open_store(config: &StoreConfig) -> Result<Option<SqliteReviewStore>> {
    config
        .path
        .as_deref()
        .map(SqliteReviewStore::open)
        .transpose()
}

pub(crate) fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Print the score summary and the vocabulary tally for one essay.
pub(crate) fn print_summary(essay: &str, result: &EvaluationResult) {
    let mut table = Table::new();
    table.set_header(vec!["Dimension", "Score", "Commentary"]);
    table.add_row(vec![
        Cell::new("总体评分"),
        Cell::new(result.overall_score),
        Cell::new(""),
    ]);
    for (label, dimension) in result.dimensions() {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(dimension.score),
            Cell::new(&dimension.commentary),
        ]);
    }
    println!("{table}");

    let tally = LevelTally::from_segments(&annotate_essay(essay, result));
    let mut levels = Table::new();
    let mut header: Vec<String> = CefrLevel::ALL.iter().map(|l| l.to_string()).collect();
    header.push("other".into());
    levels.set_header(header);
    let mut row: Vec<Cell> = CefrLevel::ALL
        .iter()
        .map(|l| Cell::new(tally.count(*l)))
        .collect();
    row.push(Cell::new(tally.other));
    levels.add_row(row);
    println!("{levels}");
}

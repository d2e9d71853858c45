//! The `essaymark history` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use essaymark_core::traits::ReviewStore;
use essaymark_providers::config::load_config_from;

pub async fn execute(user: String, limit: usize, config: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config.as_deref())?;
    let Some(store) = super::open_store(&config.store)? else {
        anyhow::bail!("no review store configured; set [store] path in essaymark.toml");
    };

    let reviews = store.list_for_user(&user, limit).await?;
    if reviews.is_empty() {
        println!("No reviews for {user}");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Id", "Created", "Overall", "Words"]);
    for review in &reviews {
        let overall = serde_json::from_str::<serde_json::Value>(&review.review_json)
            .ok()
            .and_then(|doc| doc.get("总体评分").and_then(|v| v.as_f64()))
            .map(|score| score.to_string())
            .unwrap_or_else(|| "-".into());
        table.add_row(vec![
            Cell::new(review.id),
            Cell::new(review.created_at.format("%Y-%m-%d %H:%M:%S UTC")),
            Cell::new(overall),
            Cell::new(review.essay_text.split_whitespace().count()),
        ]);
    }
    println!("{table}");
    println!("{} review(s) for {user}", reviews.len());
    Ok(())
}

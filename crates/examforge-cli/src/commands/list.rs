//! The `examforge list` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use crate::config::load_config_from;

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let tests = config.storage()?.get_all().await?;

    if tests.is_empty() {
        println!("No saved tests. Run `examforge save --test <file>` to add one.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Questions", "Score", "Parts", "Updated"]);
    for test in &tests {
        table.add_row(vec![
            Cell::new(test.id.as_deref().unwrap_or("-")),
            Cell::new(&test.title),
            Cell::new(test.stats.total_questions),
            Cell::new(test.stats.total_score),
            Cell::new(test.stats.total_parts),
            Cell::new(
                test.updated_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".into()),
            ),
        ]);
    }

    println!("{table}");
    println!("{} test(s)", tests.len());
    Ok(())
}

//! The `examforge save` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use examforge_core::editor::{Edit, TreeEditor};

use crate::config::load_config_from;

pub async fn execute(
    test_path: PathBuf,
    id: Option<String>,
    edits_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let mut test = examforge_core::parser::parse_test(&test_path)?;

    if let Some(path) = edits_path {
        let edits = load_edits(&path)?;
        test = TreeEditor::new().apply_all(&test, &edits);
        println!("Applied {} edit(s) from {}", edits.len(), path.display());
    }

    let storage = config.storage()?;
    let id = storage
        .save(&test, id.as_deref())
        .await
        .with_context(|| format!("failed to save {}", test_path.display()))?;

    test.refresh_stats();
    println!(
        "Saved test {id} ({} questions, score {})",
        test.stats.total_questions, test.stats.total_score
    );

    Ok(())
}

fn load_edits(path: &Path) -> Result<Vec<Edit>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read edits file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse edits file: {}", path.display()))
}

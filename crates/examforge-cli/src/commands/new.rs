//! The `examforge new` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use examforge_core::model::Test;

pub fn execute(
    title: String,
    curriculum: Option<String>,
    unit: Option<String>,
    output: PathBuf,
) -> Result<()> {
    if output.exists() {
        anyhow::bail!("{} already exists", output.display());
    }

    let mut test = Test::draft(title);
    test.curriculum_id = curriculum;
    test.knowledge_unit_id = unit;

    std::fs::write(&output, serde_json::to_string_pretty(&test)?)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Created {}", output.display());
    Ok(())
}

//! The `examforge validate` command.

use std::path::PathBuf;

use anyhow::Result;

use examforge_core::validate::{populated_sections, validate_test};

pub fn execute(test_path: PathBuf, stored: bool) -> Result<()> {
    let test = examforge_core::parser::parse_test(&test_path)?;

    println!(
        "Test: {} ({} parts, {} questions, score {})",
        test.title, test.stats.total_parts, test.stats.total_questions, test.stats.total_score
    );

    let sections: Vec<String> = populated_sections(&test)
        .into_iter()
        .map(|kind| kind.to_string())
        .collect();
    if !sections.is_empty() {
        println!("Sections: {}", sections.join(", "));
    }

    let warnings = validate_test(&test, stored);
    for w in &warnings {
        println!("  WARNING: {w}");
    }

    if warnings.is_empty() {
        println!("Test is valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}

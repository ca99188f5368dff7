//! The `examforge show` command.

use std::path::PathBuf;

use anyhow::Result;

use examforge_core::model::Test;
use examforge_core::statistics::layout_part;
use examforge_core::validate::validate_test;

use crate::config::load_config_from;

pub async fn execute(id: String, format: String, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let test = config.storage()?.require(&id).await?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&test)?),
        "text" => print_summary(&test),
        other => anyhow::bail!("unknown format: {other} (expected text or json)"),
    }

    Ok(())
}

fn print_summary(test: &Test) {
    println!("{}", test.title);
    println!("  id: {}", test.id.as_deref().unwrap_or("-"));
    if let (Some(curriculum), Some(unit)) = (&test.curriculum_id, &test.knowledge_unit_id) {
        println!("  knowledge: {curriculum}/{unit}");
    }
    if let Some(minutes) = test.time_limit {
        println!("  time limit: {minutes} min");
    }
    if let Some(updated) = test.updated_at {
        println!("  updated: {}", updated.to_rfc3339());
    }
    println!(
        "  {} questions, score {}, {} parts",
        test.stats.total_questions, test.stats.total_score, test.stats.total_parts
    );

    let mut next_number = 1;
    for section in test.sections.iter().filter(|s| !s.parts.is_empty()) {
        println!("\n{}", section.title);
        for part in &section.parts {
            println!("  [{}] {}", part.id, part.title);
            let (layout, next) = layout_part(part, next_number);
            next_number = next;
            for (label, question) in layout {
                let label = label.to_string();
                println!(
                    "    {label:<6} {} ({})",
                    question.text,
                    question.body.question_type()
                );
            }
        }
    }

    let warnings = validate_test(test, true);
    if !warnings.is_empty() {
        println!();
        for w in &warnings {
            println!("WARNING: {w}");
        }
    }
}

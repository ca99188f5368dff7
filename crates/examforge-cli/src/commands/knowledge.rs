//! The `examforge knowledge` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use examforge_core::knowledge::KnowledgeBase;

use crate::config::load_config_from;

pub fn execute(
    curriculum: Option<String>,
    unit: Option<String>,
    cumulative: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let kb = config.knowledge_base()?;

    match (curriculum, unit) {
        (None, _) => list_curricula(&kb),
        (Some(curriculum), None) => list_units(&kb, &curriculum)?,
        (Some(curriculum), Some(unit)) if cumulative => {
            let knowledge = kb.cumulative_knowledge(&curriculum, &unit);
            if knowledge.is_empty() {
                anyhow::bail!("no knowledge for {curriculum}/{unit}");
            }
            println!("Cumulative knowledge up to {curriculum}/{unit}");
            print_list("Vocabulary", &knowledge.vocabulary);
            print_list("Sentence patterns", &knowledge.sentence_patterns);
        }
        (Some(curriculum), Some(unit)) => {
            let knowledge = kb
                .current_unit_knowledge(&curriculum, &unit)
                .with_context(|| format!("unknown unit {curriculum}/{unit}"))?;
            println!("{}", knowledge.title);
            print_list("Vocabulary", &knowledge.vocabulary);
            print_list("Sentence patterns", &knowledge.sentence_patterns);
            for lesson in &knowledge.sub_content {
                println!("\n{}", lesson.title);
                print_list("  Vocabulary", &lesson.vocabulary);
                print_list("  Sentence patterns", &lesson.sentence_patterns);
            }
        }
    }

    Ok(())
}

fn list_curricula(kb: &KnowledgeBase) {
    if kb.curricula().is_empty() {
        println!("No curricula loaded.");
        return;
    }
    for curriculum in kb.curricula() {
        println!("{} ({}, {} units)", curriculum.id, curriculum.name, curriculum.units.len());
    }
}

fn list_units(kb: &KnowledgeBase, curriculum_id: &str) -> Result<()> {
    let curriculum = kb
        .curriculum(curriculum_id)
        .with_context(|| format!("unknown curriculum: {curriculum_id}"))?;

    let mut table = Table::new();
    table.set_header(vec!["Unit", "Title", "Vocabulary", "Patterns"]);
    for unit in &curriculum.units {
        table.add_row(vec![
            Cell::new(&unit.id),
            Cell::new(&unit.title),
            Cell::new(unit.vocabulary.len()),
            Cell::new(unit.sentence_patterns.len()),
        ]);
    }
    println!("{}", curriculum.name);
    println!("{table}");
    Ok(())
}

fn print_list(heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("{heading}:");
    for item in items {
        println!("  - {item}");
    }
}

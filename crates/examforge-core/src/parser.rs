//! File loaders for curricula (TOML) and test documents (JSON).

use std::path::Path;

use anyhow::{Context, Result};

use crate::knowledge::{Curriculum, KnowledgeBase};
use crate::model::Test;

/// Parse a single curriculum TOML file.
pub fn parse_curriculum(path: &Path) -> Result<Curriculum> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read curriculum file: {}", path.display()))?;

    parse_curriculum_str(&content, &path.display().to_string())
}

/// Parse a curriculum from a TOML string. `source` names it in errors.
pub fn parse_curriculum_str(content: &str, source: &str) -> Result<Curriculum> {
    let curriculum: Curriculum =
        toml::from_str(content).with_context(|| format!("failed to parse TOML: {source}"))?;

    let mut seen = std::collections::HashSet::new();
    for unit in &curriculum.units {
        if !seen.insert(unit.id.as_str()) {
            anyhow::bail!("duplicate unit id '{}' in curriculum {}", unit.id, curriculum.id);
        }
    }

    Ok(curriculum)
}

/// Recursively load all `.toml` curriculum files from a directory.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_curriculum_directory(dir: &Path) -> Result<Vec<Curriculum>> {
    let mut curricula = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            curricula.extend(load_curriculum_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_curriculum(&path) {
                Ok(curriculum) => curricula.push(curriculum),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    curricula.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(curricula)
}

/// Load a knowledge base from a curriculum file or a directory of them.
pub fn load_knowledge_base(path: &Path) -> Result<KnowledgeBase> {
    let curricula = if path.is_dir() {
        load_curriculum_directory(path)?
    } else {
        vec![parse_curriculum(path)?]
    };
    Ok(KnowledgeBase::new(curricula))
}

/// Load a test document from a JSON file.
pub fn parse_test(path: &Path) -> Result<Test> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read test file: {}", path.display()))?;

    parse_test_str(&content, &path.display().to_string())
}

/// Parse a test document from a JSON string. `source` names it in errors.
pub fn parse_test_str(content: &str, source: &str) -> Result<Test> {
    serde_json::from_str(content).with_context(|| format!("failed to parse test document: {source}"))
}

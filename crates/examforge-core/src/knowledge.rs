//! Curriculum knowledge base.
//!
//! Read-only reference data: curriculum → ordered units → vocabulary and
//! sentence patterns. Loaded once and passed to whatever needs lookups.

use std::collections::HashSet;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::flows::{PassageKnowledge, QuestionKnowledge};
use crate::parser::parse_curriculum_str;

const BUILTIN_CURRICULUM: &str = include_str!("../data/i-learn-smart-start-5.toml");

/// A named, ordered list of knowledge units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curriculum {
    pub id: String,
    pub name: String,
    /// Order is significant: cumulative knowledge is always a prefix.
    #[serde(default)]
    pub units: Vec<KnowledgeUnit>,
}

/// One unit of a curriculum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeUnit {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub vocabulary: Vec<String>,
    #[serde(default)]
    pub sentence_patterns: Vec<String>,
    /// Optional lesson-level breakdown of the unit.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_content: Vec<SubContent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubContent {
    pub title: String,
    #[serde(default)]
    pub vocabulary: Vec<String>,
    #[serde(default)]
    pub sentence_patterns: Vec<String>,
}

/// Vocabulary and sentence patterns with duplicates removed, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Knowledge {
    pub vocabulary: Vec<String>,
    pub sentence_patterns: Vec<String>,
}

impl Knowledge {
    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty() && self.sentence_patterns.is_empty()
    }
}

/// The set of known curricula.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeBase {
    curricula: Vec<Curriculum>,
}

impl KnowledgeBase {
    pub fn new(curricula: Vec<Curriculum>) -> Self {
        Self { curricula }
    }

    /// The curriculum shipped with the crate.
    pub fn builtin() -> Result<Self> {
        let curriculum = parse_curriculum_str(BUILTIN_CURRICULUM, "builtin")?;
        Ok(Self::new(vec![curriculum]))
    }

    pub fn curricula(&self) -> &[Curriculum] {
        &self.curricula
    }

    pub fn curriculum(&self, curriculum_id: &str) -> Option<&Curriculum> {
        self.curricula.iter().find(|c| c.id == curriculum_id)
    }

    /// Union of the named unit's knowledge and that of every unit before it.
    ///
    /// Unknown curriculum or unit ids yield empty knowledge.
    pub fn cumulative_knowledge(&self, curriculum_id: &str, unit_id: &str) -> Knowledge {
        let Some(curriculum) = self.curriculum(curriculum_id) else {
            return Knowledge::default();
        };
        let Some(index) = curriculum.units.iter().position(|u| u.id == unit_id) else {
            return Knowledge::default();
        };
        let units = &curriculum.units[..=index];
        Knowledge {
            vocabulary: dedup(units.iter().flat_map(|u| &u.vocabulary)),
            sentence_patterns: dedup(units.iter().flat_map(|u| &u.sentence_patterns)),
        }
    }

    /// Direct lookup of a single unit.
    pub fn current_unit_knowledge(&self, curriculum_id: &str, unit_id: &str) -> Option<&KnowledgeUnit> {
        self.curriculum(curriculum_id)?
            .units
            .iter()
            .find(|u| u.id == unit_id)
    }

    /// Constraints for passage generation: cumulative plus current-unit lists.
    pub fn passage_knowledge(&self, curriculum_id: &str, unit_id: &str) -> Option<PassageKnowledge> {
        let unit = self.current_unit_knowledge(curriculum_id, unit_id)?;
        let cumulative = self.cumulative_knowledge(curriculum_id, unit_id);
        Some(PassageKnowledge {
            unit_title: unit.title.clone(),
            vocabulary: cumulative.vocabulary,
            sentence_patterns: cumulative.sentence_patterns,
            current_unit_vocabulary: unit.vocabulary.clone(),
            current_unit_sentence_patterns: unit.sentence_patterns.clone(),
        })
    }

    /// Constraints for question generation: current-unit lists only.
    pub fn question_knowledge(&self, curriculum_id: &str, unit_id: &str) -> Option<QuestionKnowledge> {
        let unit = self.current_unit_knowledge(curriculum_id, unit_id)?;
        Some(QuestionKnowledge {
            unit_title: unit.title.clone(),
            current_unit_vocabulary: unit.vocabulary.clone(),
            current_unit_sentence_patterns: unit.sentence_patterns.clone(),
        })
    }
}

fn dedup<'a>(items: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .filter(|item| seen.insert(item.as_str()))
        .cloned()
        .collect()
}

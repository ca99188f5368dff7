//! The `examforge generate-questions` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use examforge_core::editor::{Edit, TreeEditor};
use examforge_core::flows::{GeneratedQuestionType, QuestionCounts, QuestionsRequest};
use examforge_core::model::{ItemId, SectionKind};

use crate::config::load_config_from;

pub struct Args {
    pub passage_file: PathBuf,
    pub question_type: String,
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
    pub curriculum: Option<String>,
    pub unit: Option<String>,
    pub test: Option<PathBuf>,
    pub part: Option<ItemId>,
    pub provider: Option<String>,
    pub config: Option<PathBuf>,
}

pub async fn execute(args: Args) -> Result<()> {
    let question_type: GeneratedQuestionType =
        args.question_type.parse().map_err(anyhow::Error::msg)?;
    let passage = std::fs::read_to_string(&args.passage_file).with_context(|| {
        format!("failed to read passage file: {}", args.passage_file.display())
    })?;
    let config = load_config_from(args.config.as_deref())?;

    let knowledge = match (&args.curriculum, &args.unit) {
        (Some(curriculum), Some(unit)) => Some(
            config
                .knowledge_base()?
                .question_knowledge(curriculum, unit)
                .with_context(|| format!("unknown unit {curriculum}/{unit}"))?,
        ),
        _ => None,
    };

    let flows = config.flows(args.provider.as_deref())?;
    let response = flows
        .generate_questions(&QuestionsRequest {
            passage,
            question_type,
            question_counts: QuestionCounts {
                easy: args.easy,
                medium: args.medium,
                hard: args.hard,
            },
            knowledge,
        })
        .await?;

    let (Some(test_path), Some(part_id)) = (args.test, args.part) else {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    };

    let test = examforge_core::parser::parse_test(&test_path)?;
    let reading = test.sections.get(SectionKind::Reading);
    let before = reading
        .parts
        .iter()
        .find(|p| p.id == part_id)
        .with_context(|| format!("no reading part {part_id} in {}", test_path.display()))?
        .questions
        .len();

    let updated = TreeEditor::new().apply(
        &test,
        &Edit::AddGeneratedQuestions {
            section: SectionKind::Reading,
            part_id,
            questions: response.questions,
        },
    );
    let added = updated
        .sections
        .get(SectionKind::Reading)
        .parts
        .iter()
        .find(|p| p.id == part_id)
        .map_or(0, |p| p.questions.len() - before);

    std::fs::write(&test_path, serde_json::to_string_pretty(&updated)?)
        .with_context(|| format!("failed to write {}", test_path.display()))?;
    println!(
        "Added {added} question(s) to reading part {part_id} in {}",
        test_path.display()
    );
    Ok(())
}

use anyhow::Result;
use tracing::instrument;

use examforge_core::flows::{GeneratedQuestion, GeneratedQuestionType, QuestionsRequest, QuestionsResponse};

use super::{prompt_list, ContentFlows};

const QUESTIONS_CONTEXT: &str = "\
You write English reading comprehension questions for Vietnamese primary school \
students (CEFR A1/A2) following the \"Tiếng Anh 5 i-Learn Smart Start\" curriculum.

Rules:
1. Read the passage carefully first.
2. Questions and especially their answers must rely on the current unit's vocabulary and \
sentence patterns, not on earlier units, even if those words appear in the passage.
3. Difficulty levels:
   - easy: answered by finding a sentence or phrase in the text.
   - medium: needs a simple inference or the main idea of one or two sentences.
   - hard: needs the main idea of the whole passage, a larger inference, or the writer's purpose.";

fn format_instructions(question_type: GeneratedQuestionType) -> &'static str {
    match question_type {
        GeneratedQuestionType::Mcq => {
            "Each question has exactly 3 options with exactly one correct option:\n\
             {\"type\": \"mcq\", \"question\": \"...\", \"options\": [{\"text\": \"...\", \"isCorrect\": true}, ...], \"difficulty\": \"easy|medium|hard\"}"
        }
        GeneratedQuestionType::Fib => {
            "Each question is a sentence from the passage with one key word of the current unit replaced by \"___\":\n\
             {\"type\": \"fib\", \"question\": \"...\", \"answer\": \"...\", \"difficulty\": \"easy|medium|hard\"}"
        }
        GeneratedQuestionType::TrueFalse => {
            "Each question is a statement about the passage whose truth depends on the current unit:\n\
             {\"type\": \"true-false\", \"statement\": \"...\", \"isTrue\": true, \"difficulty\": \"easy|medium|hard\"}"
        }
    }
}

impl ContentFlows {
    /// Generate comprehension questions about a passage.
    ///
    /// Returns an empty list without calling the model when no questions are
    /// requested. Items with an unknown `type` are kept as
    /// [`GeneratedQuestion::Unrecognized`] and dropped when added to a part.
    #[instrument(skip(self, request), fields(question_type = %request.question_type, total = request.question_counts.total()))]
    pub async fn generate_questions(&self, request: &QuestionsRequest) -> Result<QuestionsResponse> {
        let counts = request.question_counts;
        let total = counts.total();
        if total == 0 {
            return Ok(QuestionsResponse {
                questions: Vec::new(),
            });
        }

        let knowledge = request
            .knowledge
            .as_ref()
            .map(|k| {
                format!(
                    "Knowledge base constraints:\n\
                     - Curriculum unit: {}\n\
                     - Target vocabulary: {}\n\
                     - Target sentence patterns: {}\n\n",
                    k.unit_title,
                    prompt_list(&k.current_unit_vocabulary, ", "),
                    prompt_list(&k.current_unit_sentence_patterns, "; "),
                )
            })
            .unwrap_or_default();

        let prompt = format!(
            "{QUESTIONS_CONTEXT}\n\n\
             Passage:\n---\n{passage}\n---\n\n\
             {knowledge}\
             Generate {total} questions of type '{question_type}':\n\
             - easy: {easy}\n\
             - medium: {medium}\n\
             - hard: {hard}\n\n\
             {format}\n\n\
             Reply with a JSON object of the form {{\"questions\": [...]}}.",
            passage = request.passage.trim(),
            question_type = request.question_type,
            easy = counts.easy,
            medium = counts.medium,
            hard = counts.hard,
            format = format_instructions(request.question_type),
        );

        let response: QuestionsResponse = self.complete_json(prompt, "questions").await?;
        let unrecognized = response
            .questions
            .iter()
            .filter(|q| matches!(q, GeneratedQuestion::Unrecognized))
            .count();
        if unrecognized > 0 || response.questions.len() as u64 != total {
            tracing::debug!(
                requested = total,
                received = response.questions.len(),
                unrecognized,
                "question count differs from request"
            );
        }
        Ok(response)
    }
}

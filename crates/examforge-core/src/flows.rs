//! Request/response contracts of the AI content flows.
//!
//! These are the shapes the builder constructs and parses; the flows
//! themselves live in `examforge-providers`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::AssetRef;

// ---------------------------------------------------------------------------
// Passage generation
// ---------------------------------------------------------------------------

/// Desired passage length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassageLength {
    Short,
    Medium,
    Long,
}

impl PassageLength {
    /// Approximate word target.
    pub fn word_target(self) -> u32 {
        match self {
            PassageLength::Short => 100,
            PassageLength::Medium => 150,
            PassageLength::Long => 200,
        }
    }
}

impl FromStr for PassageLength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "short" => Ok(PassageLength::Short),
            "medium" => Ok(PassageLength::Medium),
            "long" => Ok(PassageLength::Long),
            other => Err(format!("unknown passage length: {other}")),
        }
    }
}

/// Curriculum constraints for passage generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassageKnowledge {
    pub unit_title: String,
    /// Vocabulary of this unit and every preceding unit.
    pub vocabulary: Vec<String>,
    /// Sentence patterns of this unit and every preceding unit.
    pub sentence_patterns: Vec<String>,
    pub current_unit_vocabulary: Vec<String>,
    pub current_unit_sentence_patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassageRequest {
    pub topic: String,
    pub length: PassageLength,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge: Option<PassageKnowledge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassageResponse {
    pub passage: String,
}

// ---------------------------------------------------------------------------
// Question generation
// ---------------------------------------------------------------------------

/// Question types the generator can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneratedQuestionType {
    #[serde(rename = "mcq")]
    Mcq,
    #[serde(rename = "fib")]
    Fib,
    #[serde(rename = "true-false")]
    TrueFalse,
}

impl fmt::Display for GeneratedQuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratedQuestionType::Mcq => write!(f, "mcq"),
            GeneratedQuestionType::Fib => write!(f, "fib"),
            GeneratedQuestionType::TrueFalse => write!(f, "true-false"),
        }
    }
}

impl FromStr for GeneratedQuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mcq" => Ok(GeneratedQuestionType::Mcq),
            "fib" => Ok(GeneratedQuestionType::Fib),
            "true-false" => Ok(GeneratedQuestionType::TrueFalse),
            other => Err(format!("unknown generated question type: {other}")),
        }
    }
}

/// How many questions to generate per difficulty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionCounts {
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
}

impl QuestionCounts {
    /// Sum of all difficulties, widened so large counts cannot overflow.
    pub fn total(&self) -> u64 {
        u64::from(self.easy) + u64::from(self.medium) + u64::from(self.hard)
    }
}

/// Curriculum constraints for question generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionKnowledge {
    pub unit_title: String,
    pub current_unit_vocabulary: Vec<String>,
    pub current_unit_sentence_patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionsRequest {
    pub passage: String,
    pub question_type: GeneratedQuestionType,
    pub question_counts: QuestionCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge: Option<QuestionKnowledge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedOption {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// A question as returned by the generator, tagged by `type`.
///
/// Any tag other than the three known ones parses as `Unrecognized` and is
/// dropped when the questions are added to a part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeneratedQuestion {
    #[serde(rename = "mcq")]
    Mcq {
        question: String,
        options: Vec<GeneratedOption>,
        #[serde(default)]
        difficulty: Option<Difficulty>,
    },
    #[serde(rename = "fib")]
    Fib {
        question: String,
        answer: String,
        #[serde(default)]
        difficulty: Option<Difficulty>,
    },
    #[serde(rename = "true-false")]
    TrueFalse {
        statement: String,
        #[serde(rename = "isTrue")]
        is_true: bool,
        #[serde(default)]
        difficulty: Option<Difficulty>,
    },
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionsResponse {
    pub questions: Vec<GeneratedQuestion>,
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryboardRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_image: Option<AssetRef>,
    pub frames: Vec<String>,
}

/// One image per frame, in frame order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryboardResponse {
    pub images: Vec<AssetRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleImageRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_image: Option<AssetRef>,
    pub frame_prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterImageRequest {
    pub character_prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResponse {
    pub image: AssetRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditImageRequest {
    /// Inline payload or fetchable URL.
    pub image: AssetRef,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditImageResponse {
    pub edited_image: AssetRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcretizeRequest {
    pub prompts: Vec<String>,
}

/// Same length and order as the request prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcretizeResponse {
    pub concretized_prompts: Vec<String>,
}

// ---------------------------------------------------------------------------
// Words and speech
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShuffleRequest {
    pub sentence: String,
}

/// Tokens joined by `" / "`, final punctuation stripped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShuffleResponse {
    pub shuffled_sentence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerConfig {
    /// Speaker name as used in the script, e.g. "Speaker1".
    pub name: String,
    /// Prebuilt voice name.
    pub voice: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextToSpeechRequest {
    pub script: String,
    #[serde(default)]
    pub speakers: Vec<SpeakerConfig>,
}

/// WAV audio (24 kHz, mono, 16-bit) as an inline payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextToSpeechResponse {
    pub audio: AssetRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechToTextRequest {
    pub audio: AssetRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechToTextResponse {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_generated_questions() {
        let json = r#"{"questions": [
            {"type": "mcq", "question": "Where?", "difficulty": "easy",
             "options": [{"text": "a", "isCorrect": true}, {"text": "b", "isCorrect": false},
                         {"text": "c", "isCorrect": false}]},
            {"type": "fib", "question": "I ___ to school.", "answer": "go", "difficulty": "medium"},
            {"type": "true-false", "statement": "Hoa likes math.", "isTrue": false, "difficulty": "hard"},
            {"type": "essay", "prompt": "Write"}
        ]}"#;
        let response: QuestionsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.questions.len(), 4);
        assert!(matches!(
            &response.questions[0],
            GeneratedQuestion::Mcq { options, .. } if options.len() == 3
        ));
        assert!(matches!(
            &response.questions[2],
            GeneratedQuestion::TrueFalse { is_true: false, difficulty: Some(Difficulty::Hard), .. }
        ));
        assert_eq!(response.questions[3], GeneratedQuestion::Unrecognized);
    }

    #[test]
    fn question_counts_total() {
        let counts = QuestionCounts {
            easy: 2,
            medium: 1,
            hard: 0,
        };
        assert_eq!(counts.total(), 3);

        let counts = QuestionCounts {
            easy: u32::MAX,
            medium: 1,
            hard: u32::MAX,
        };
        assert_eq!(counts.total(), 2 * u64::from(u32::MAX) + 1);
    }

    #[test]
    fn passage_length_targets() {
        assert_eq!("short".parse::<PassageLength>().unwrap().word_target(), 100);
        assert_eq!(PassageLength::Long.word_target(), 200);
        assert!("epic".parse::<PassageLength>().is_err());
    }

    #[test]
    fn knowledge_uses_camel_case() {
        let knowledge = QuestionKnowledge {
            unit_title: "Unit 1: SCHOOL".into(),
            current_unit_vocabulary: vec!["science".into()],
            current_unit_sentence_patterns: vec![],
        };
        let json = serde_json::to_value(&knowledge).unwrap();
        assert_eq!(json["unitTitle"], "Unit 1: SCHOOL");
        assert!(json.get("currentUnitVocabulary").is_some());
    }
}

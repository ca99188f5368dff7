//! Test document data model.
//!
//! A [`Test`] is a fixed set of four [`Section`]s, each holding an ordered
//! list of [`Part`]s, each holding an ordered list of [`Question`]s. The JSON
//! shape (camelCase keys, string question tags) is the persisted document
//! format, so every type here round-trips through `serde_json` unchanged.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DocumentError;
use crate::statistics::compute_stats;

/// Identifier of a part, question, option, sub-question, or image slot.
pub type ItemId = u64;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// The four fixed section identities of a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Listening,
    Reading,
    Writing,
    Speaking,
}

impl SectionKind {
    /// All section kinds in document order.
    pub const ALL: [SectionKind; 4] = [
        SectionKind::Listening,
        SectionKind::Reading,
        SectionKind::Writing,
        SectionKind::Speaking,
    ];

    /// Title given to the section of a freshly built test.
    pub fn default_title(self) -> &'static str {
        match self {
            SectionKind::Listening => "Listening",
            SectionKind::Reading => "Reading",
            SectionKind::Writing => "Writing",
            SectionKind::Speaking => "Speaking",
        }
    }

    /// Whether parts in this section carry a reading passage.
    pub fn has_passage(self) -> bool {
        self == SectionKind::Reading
    }

    /// Whether parts in this section carry an audio track.
    pub fn has_audio(self) -> bool {
        self == SectionKind::Listening
    }

    fn index(self) -> usize {
        match self {
            SectionKind::Listening => 0,
            SectionKind::Reading => 1,
            SectionKind::Writing => 2,
            SectionKind::Speaking => 3,
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKind::Listening => write!(f, "listening"),
            SectionKind::Reading => write!(f, "reading"),
            SectionKind::Writing => write!(f, "writing"),
            SectionKind::Speaking => write!(f, "speaking"),
        }
    }
}

impl FromStr for SectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "listening" => Ok(SectionKind::Listening),
            "reading" => Ok(SectionKind::Reading),
            "writing" => Ok(SectionKind::Writing),
            "speaking" => Ok(SectionKind::Speaking),
            other => Err(format!("unknown section: {other}")),
        }
    }
}

/// One of the four fixed sections of a test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Fixed section identity.
    pub id: SectionKind,
    /// Display title.
    pub title: String,
    /// Ordered parts.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Section {
    pub fn new(kind: SectionKind) -> Self {
        Self {
            id: kind,
            title: kind.default_title().to_string(),
            parts: Vec::new(),
        }
    }
}

/// The closed set of four sections, always held in document order.
///
/// Deserialization rejects any list that does not contain each section
/// kind exactly once; the sections are reordered into canonical order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Section>", into = "Vec<Section>")]
pub struct Sections([Section; 4]);

impl Sections {
    /// Four empty sections with their default titles.
    pub fn empty() -> Self {
        Self(SectionKind::ALL.map(Section::new))
    }

    pub fn get(&self, kind: SectionKind) -> &Section {
        &self.0[kind.index()]
    }

    pub fn get_mut(&mut self, kind: SectionKind) -> &mut Section {
        &mut self.0[kind.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Section> {
        self.0.iter_mut()
    }
}

impl Default for Sections {
    fn default() -> Self {
        Self::empty()
    }
}

impl TryFrom<Vec<Section>> for Sections {
    type Error = DocumentError;

    fn try_from(sections: Vec<Section>) -> Result<Self, Self::Error> {
        if sections.len() != 4 {
            return Err(DocumentError::SectionCount(sections.len()));
        }
        let mut slots: [Option<Section>; 4] = Default::default();
        for section in sections {
            let slot = &mut slots[section.id.index()];
            if slot.is_some() {
                return Err(DocumentError::DuplicateSection(section.id));
            }
            *slot = Some(section);
        }
        let mut ordered = Vec::with_capacity(4);
        for (kind, slot) in SectionKind::ALL.into_iter().zip(slots) {
            ordered.push(slot.ok_or(DocumentError::MissingSection(kind))?);
        }
        let array: [Section; 4] = ordered
            .try_into()
            .map_err(|v: Vec<Section>| DocumentError::SectionCount(v.len()))?;
        Ok(Self(array))
    }
}

impl From<Sections> for Vec<Section> {
    fn from(sections: Sections) -> Self {
        sections.0.into()
    }
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

/// Reference to a binary asset: either an inline `data:` payload (before
/// save) or a durable URL (after save).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Returns `true` if this is an inline `data:` payload.
    pub fn is_inline(&self) -> bool {
        self.0.starts_with("data:")
    }

    /// Split an inline `data:<media type>;base64,<payload>` reference into
    /// its media type and still-encoded payload.
    pub fn split_inline(&self) -> Option<(&str, &str)> {
        let rest = self.0.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let media_type = header.split(';').next().unwrap_or_default();
        Some((media_type, payload))
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Inline payloads can be megabytes long.
        if self.is_inline() {
            let header = self.0.split(',').next().unwrap_or("data:");
            write!(f, "{header},…")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<&str> for AssetRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AssetRef {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Where an asset lives inside the test tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetLocation {
    PartAudio {
        part_id: ItemId,
    },
    QuestionImage {
        part_id: ItemId,
        question_id: ItemId,
    },
    OptionImage {
        part_id: ItemId,
        question_id: ItemId,
        option_id: ItemId,
    },
    /// An image slot of a writing-fill-in-word question.
    SlotImage {
        part_id: ItemId,
        question_id: ItemId,
        image_id: ItemId,
    },
}

impl AssetLocation {
    /// Whether the asset is audio rather than an image.
    pub fn is_audio(&self) -> bool {
        matches!(self, AssetLocation::PartAudio { .. })
    }
}

/// A mutable asset field together with its position in the tree.
#[derive(Debug)]
pub struct AssetSlot<'a> {
    pub location: AssetLocation,
    pub value: &'a mut Option<AssetRef>,
}

// ---------------------------------------------------------------------------
// Parts and questions
// ---------------------------------------------------------------------------

/// A sub-division of a section: instructions, optional passage/audio, questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub id: ItemId,
    /// Title and instructions text.
    #[serde(default)]
    pub title: String,
    /// Reading passage; only meaningful in the reading section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passage: Option<String>,
    /// Audio track; only meaningful in the listening section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<AssetRef>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// The closed set of question types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "mcq")]
    MultipleChoiceText,
    #[serde(rename = "mcq-image")]
    MultipleChoiceImage,
    #[serde(rename = "fib")]
    FillInBlank,
    #[serde(rename = "true-false")]
    TrueFalse,
    #[serde(rename = "write-the-word")]
    WriteTheWord,
    #[serde(rename = "writing-fill-in-word")]
    WritingFillInWord,
    #[serde(rename = "writing-order-words")]
    WritingOrderWords,
    #[serde(rename = "writing-paragraph")]
    WritingParagraph,
    #[serde(rename = "speaking-qa")]
    SpeakingQa,
}

impl QuestionType {
    pub const ALL: [QuestionType; 9] = [
        QuestionType::MultipleChoiceText,
        QuestionType::MultipleChoiceImage,
        QuestionType::FillInBlank,
        QuestionType::TrueFalse,
        QuestionType::WriteTheWord,
        QuestionType::WritingFillInWord,
        QuestionType::WritingOrderWords,
        QuestionType::WritingParagraph,
        QuestionType::SpeakingQa,
    ];

    /// The persisted type tag.
    pub fn tag(self) -> &'static str {
        match self {
            QuestionType::MultipleChoiceText => "mcq",
            QuestionType::MultipleChoiceImage => "mcq-image",
            QuestionType::FillInBlank => "fib",
            QuestionType::TrueFalse => "true-false",
            QuestionType::WriteTheWord => "write-the-word",
            QuestionType::WritingFillInWord => "writing-fill-in-word",
            QuestionType::WritingOrderWords => "writing-order-words",
            QuestionType::WritingParagraph => "writing-paragraph",
            QuestionType::SpeakingQa => "speaking-qa",
        }
    }

    pub fn is_multiple_choice(self) -> bool {
        matches!(
            self,
            QuestionType::MultipleChoiceText | QuestionType::MultipleChoiceImage
        )
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuestionType::ALL
            .into_iter()
            .find(|t| t.tag() == s)
            .ok_or_else(|| format!("unknown question type: {s}"))
    }
}

/// A single question. The `text` field is the prompt, statement, or
/// sentence-before text depending on the type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: ItemId,
    #[serde(default)]
    pub text: String,
    /// Example questions are unscored and shown first, labelled "Ex.".
    #[serde(default)]
    pub is_example: bool,
    #[serde(flatten)]
    pub body: QuestionBody,
}

/// Type-dependent question payload, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QuestionBody {
    #[serde(rename = "mcq")]
    MultipleChoiceText(Choices),
    #[serde(rename = "mcq-image")]
    MultipleChoiceImage(Choices),
    #[serde(rename = "fib")]
    FillInBlank(BlankAnswer),
    #[serde(rename = "true-false")]
    TrueFalse(Verdict),
    #[serde(rename = "write-the-word")]
    WriteTheWord(EmbeddedAnswer),
    #[serde(rename = "writing-fill-in-word")]
    WritingFillInWord(PictureWords),
    #[serde(rename = "writing-order-words")]
    WritingOrderWords(WordOrder),
    #[serde(rename = "writing-paragraph")]
    WritingParagraph {},
    #[serde(rename = "speaking-qa")]
    SpeakingQa(SpokenAnswer),
}

impl QuestionBody {
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionBody::MultipleChoiceText(_) => QuestionType::MultipleChoiceText,
            QuestionBody::MultipleChoiceImage(_) => QuestionType::MultipleChoiceImage,
            QuestionBody::FillInBlank(_) => QuestionType::FillInBlank,
            QuestionBody::TrueFalse(_) => QuestionType::TrueFalse,
            QuestionBody::WriteTheWord(_) => QuestionType::WriteTheWord,
            QuestionBody::WritingFillInWord(_) => QuestionType::WritingFillInWord,
            QuestionBody::WritingOrderWords(_) => QuestionType::WritingOrderWords,
            QuestionBody::WritingParagraph {} => QuestionType::WritingParagraph,
            QuestionBody::SpeakingQa(_) => QuestionType::SpeakingQa,
        }
    }

    /// The option list of a multiple-choice question.
    pub fn choices(&self) -> Option<&Choices> {
        match self {
            QuestionBody::MultipleChoiceText(c) | QuestionBody::MultipleChoiceImage(c) => Some(c),
            _ => None,
        }
    }

    pub fn choices_mut(&mut self) -> Option<&mut Choices> {
        match self {
            QuestionBody::MultipleChoiceText(c) | QuestionBody::MultipleChoiceImage(c) => Some(c),
            _ => None,
        }
    }

    pub fn picture_words(&self) -> Option<&PictureWords> {
        match self {
            QuestionBody::WritingFillInWord(p) => Some(p),
            _ => None,
        }
    }

    pub fn picture_words_mut(&mut self) -> Option<&mut PictureWords> {
        match self {
            QuestionBody::WritingFillInWord(p) => Some(p),
            _ => None,
        }
    }
}

/// Multiple-choice payload (text or image variant).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choices {
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
}

impl Choices {
    /// Three empty options labelled A, B, C with ids 1, 2, 3.
    pub fn lettered() -> Self {
        Self {
            options: (0..3)
                .map(|i| ChoiceOption::new(i as ItemId + 1, option_label(i)))
                .collect(),
        }
    }

    pub fn correct_count(&self) -> usize {
        self.options.iter().filter(|o| o.is_correct).count()
    }

    pub fn correct(&self) -> Option<&ChoiceOption> {
        self.options.iter().find(|o| o.is_correct)
    }
}

/// Display label for the option at `index`: A, B, C, ...
pub fn option_label(index: usize) -> String {
    let letter = u8::try_from(index)
        .ok()
        .and_then(|i| b'A'.checked_add(i))
        .filter(u8::is_ascii_uppercase)
        .map(char::from);
    match letter {
        Some(c) => c.to_string(),
        None => format!("#{}", index + 1),
    }
}

/// An answer option of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
    pub id: ItemId,
    /// Display label (A/B/C/...).
    #[serde(rename = "text")]
    pub label: String,
    #[serde(default)]
    pub is_correct: bool,
    /// Answer text shown to students.
    #[serde(default)]
    pub description: String,
    /// Prompt used to generate the option image.
    #[serde(default)]
    pub image_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<AssetRef>,
}

impl ChoiceOption {
    pub fn new(id: ItemId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            is_correct: false,
            description: String::new(),
            image_prompt: String::new(),
            image_url: None,
        }
    }
}

/// Fill-in-blank payload; the question text contains the blank marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlankAnswer {
    #[serde(default)]
    pub answer: String,
}

/// True/false payload; the question text is the statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    #[serde(default)]
    pub is_true: bool,
}

/// Write-the-word payload: `text` + answer + `text_after`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedAnswer {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub text_after: String,
}

/// Writing-fill-in-word payload. `sub_questions` and `images` are parallel:
/// each sub-question shares its id with exactly one image slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PictureWords {
    #[serde(default)]
    pub sub_questions: Vec<SubQuestion>,
    #[serde(default)]
    pub images: Vec<ImageItem>,
}

impl PictureWords {
    /// One empty sub-question with its paired image slot.
    pub fn seeded(id: ItemId) -> Self {
        Self {
            sub_questions: vec![SubQuestion::new(id)],
            images: vec![ImageItem {
                id,
                image_url: None,
            }],
        }
    }

    /// Whether every sub-question has exactly one image slot with the same id,
    /// in the same order.
    pub fn is_paired(&self) -> bool {
        self.sub_questions.len() == self.images.len()
            && self
                .sub_questions
                .iter()
                .zip(&self.images)
                .all(|(sq, img)| sq.id == img.id)
    }
}

/// A sub-question of a writing-fill-in-word question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubQuestion {
    pub id: ItemId,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub answer: String,
}

impl SubQuestion {
    pub fn new(id: ItemId) -> Self {
        Self {
            id,
            text: String::new(),
            answer: String::new(),
        }
    }
}

/// Image slot paired with the sub-question of the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageItem {
    pub id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<AssetRef>,
}

/// Writing-order-words payload: the correct sentence and its scrambled form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordOrder {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub disordered_words: String,
}

/// Speaking question payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpokenAnswer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<AssetRef>,
    #[serde(default)]
    pub reference_answer: String,
}

// ---------------------------------------------------------------------------
// Test
// ---------------------------------------------------------------------------

/// Aggregate counts derived from the section tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_questions: u32,
    pub total_score: f64,
    pub total_parts: u32,
}

/// Time limit given to tests started in the builder, in minutes.
pub const DEFAULT_TIME_LIMIT: NonZeroU32 = match NonZeroU32::new(40) {
    Some(minutes) => minutes,
    None => panic!("zero time limit"),
};

/// A complete test document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Test {
    /// Assigned at first save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub sections: Sections,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curriculum_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_unit_id: Option<String>,
    /// Time limit in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<NonZeroU32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Test {
    /// An unsaved test with the four fixed sections and no parts.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            sections: Sections::empty(),
            stats: Stats::default(),
            curriculum_id: None,
            knowledge_unit_id: None,
            time_limit: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// A fresh builder draft: like [`Test::new`] with the default time limit.
    pub fn draft(title: impl Into<String>) -> Self {
        Self {
            time_limit: Some(DEFAULT_TIME_LIMIT),
            ..Self::new(title)
        }
    }

    /// All parts across sections, in document order, with their section.
    pub fn parts(&self) -> impl Iterator<Item = (SectionKind, &Part)> {
        self.sections
            .iter()
            .flat_map(|s| s.parts.iter().map(move |p| (s.id, p)))
    }

    /// Recompute `stats` from the section tree.
    pub fn refresh_stats(&mut self) {
        self.stats = compute_stats(&self.sections);
    }

    /// Every populated asset field with its tree location.
    pub fn assets(&self) -> Vec<(AssetLocation, &AssetRef)> {
        let mut assets = Vec::new();
        for (_, part) in self.parts() {
            let part_id = part.id;
            if let Some(audio) = &part.audio_url {
                assets.push((AssetLocation::PartAudio { part_id }, audio));
            }
            for question in &part.questions {
                let question_id = question.id;
                match &question.body {
                    QuestionBody::SpeakingQa(SpokenAnswer {
                        image_url: Some(image),
                        ..
                    }) => {
                        assets.push((
                            AssetLocation::QuestionImage {
                                part_id,
                                question_id,
                            },
                            image,
                        ));
                    }
                    QuestionBody::MultipleChoiceText(choices)
                    | QuestionBody::MultipleChoiceImage(choices) => {
                        for option in &choices.options {
                            if let Some(image) = &option.image_url {
                                assets.push((
                                    AssetLocation::OptionImage {
                                        part_id,
                                        question_id,
                                        option_id: option.id,
                                    },
                                    image,
                                ));
                            }
                        }
                    }
                    QuestionBody::WritingFillInWord(words) => {
                        for slot in &words.images {
                            if let Some(image) = &slot.image_url {
                                assets.push((
                                    AssetLocation::SlotImage {
                                        part_id,
                                        question_id,
                                        image_id: slot.id,
                                    },
                                    image,
                                ));
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        assets
    }

    /// Every asset field (populated or not) as a mutable slot.
    pub fn asset_slots_mut(&mut self) -> Vec<AssetSlot<'_>> {
        let mut slots = Vec::new();
        for section in self.sections.iter_mut() {
            for part in &mut section.parts {
                let part_id = part.id;
                slots.push(AssetSlot {
                    location: AssetLocation::PartAudio { part_id },
                    value: &mut part.audio_url,
                });
                for question in &mut part.questions {
                    let question_id = question.id;
                    match &mut question.body {
                        QuestionBody::SpeakingQa(spoken) => slots.push(AssetSlot {
                            location: AssetLocation::QuestionImage {
                                part_id,
                                question_id,
                            },
                            value: &mut spoken.image_url,
                        }),
                        QuestionBody::MultipleChoiceText(choices)
                        | QuestionBody::MultipleChoiceImage(choices) => {
                            for option in &mut choices.options {
                                slots.push(AssetSlot {
                                    location: AssetLocation::OptionImage {
                                        part_id,
                                        question_id,
                                        option_id: option.id,
                                    },
                                    value: &mut option.image_url,
                                });
                            }
                        }
                        QuestionBody::WritingFillInWord(words) => {
                            for slot in &mut words.images {
                                slots.push(AssetSlot {
                                    location: AssetLocation::SlotImage {
                                        part_id,
                                        question_id,
                                        image_id: slot.id,
                                    },
                                    value: &mut slot.image_url,
                                });
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tf(id: ItemId, text: &str, is_true: bool) -> Question {
        Question {
            id,
            text: text.into(),
            is_example: false,
            body: QuestionBody::TrueFalse(Verdict { is_true }),
        }
    }

    #[test]
    fn new_test_has_four_empty_sections() {
        let test = Test::new("Mid-term");
        let kinds: Vec<_> = test.sections.iter().map(|s| s.id).collect();
        assert_eq!(kinds, SectionKind::ALL.to_vec());
        assert!(test.sections.iter().all(|s| s.parts.is_empty()));
        assert!(test.id.is_none());
    }

    #[test]
    fn question_type_tags_roundtrip() {
        for t in QuestionType::ALL {
            assert_eq!(t.tag().parse::<QuestionType>().unwrap(), t);
        }
        assert!("essay".parse::<QuestionType>().is_err());
    }

    #[test]
    fn option_labels_are_letters() {
        assert_eq!(option_label(0), "A");
        assert_eq!(option_label(2), "C");
        assert_eq!(option_label(25), "Z");
        assert_eq!(option_label(26), "#27");
    }

    #[test]
    fn question_json_uses_original_tags() {
        let q = tf(7, "The sky is blue", true);
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["type"], "true-false");
        assert_eq!(json["isTrue"], true);
        assert_eq!(json["isExample"], false);
        assert_eq!(json["text"], "The sky is blue");
    }

    #[test]
    fn parses_stored_document_with_extra_fields() {
        // Stored documents carry empty `options`/`images` arrays on every question.
        let json = r#"{
            "title": "Unit 3 quiz",
            "sections": [
                {"id": "reading", "title": "Reading", "parts": [
                    {"id": 10, "title": "Part 1: ", "passage": "Hi, I'm Hoa.", "questions": [
                        {"id": 11, "type": "true-false", "text": "Hoa is ten.", "isTrue": true,
                         "options": [], "images": [], "subQuestions": [], "isExample": true},
                        {"id": 12, "type": "writing-paragraph", "text": "Write about your day.",
                         "options": []},
                        {"id": 13, "type": "mcq", "text": "Where is Hoa?", "options": [
                            {"id": 1, "text": "A", "isCorrect": true, "description": "school"},
                            {"id": 2, "text": "B", "isCorrect": false, "description": "home"}
                        ]}
                    ]}
                ]},
                {"id": "listening", "title": "Listening", "parts": []},
                {"id": "writing", "title": "Writing", "parts": []},
                {"id": "speaking", "title": "Speaking", "parts": []}
            ],
            "stats": {"totalQuestions": 2, "totalScore": 1.25, "totalParts": 1},
            "timeLimit": 40
        }"#;
        let test: Test = serde_json::from_str(json).unwrap();
        // Reordered into canonical order.
        assert_eq!(
            test.sections.iter().next().unwrap().id,
            SectionKind::Listening
        );
        let reading = test.sections.get(SectionKind::Reading);
        let questions = &reading.parts[0].questions;
        assert!(questions[0].is_example);
        assert_eq!(
            questions[1].body.question_type(),
            QuestionType::WritingParagraph
        );
        let choices = questions[2].body.choices().unwrap();
        assert_eq!(choices.options[0].label, "A");
        assert_eq!(choices.correct().unwrap().description, "school");
        assert_eq!(test.time_limit.map(NonZeroU32::get), Some(40));
    }

    #[test]
    fn rejects_missing_or_duplicate_sections() {
        let three = r#"{"title": "t", "sections": [
            {"id": "listening", "title": "L"},
            {"id": "reading", "title": "R"},
            {"id": "writing", "title": "W"}
        ]}"#;
        assert!(serde_json::from_str::<Test>(three).is_err());

        let duplicate = r#"{"title": "t", "sections": [
            {"id": "listening", "title": "L"},
            {"id": "listening", "title": "L"},
            {"id": "writing", "title": "W"},
            {"id": "speaking", "title": "S"}
        ]}"#;
        let err = serde_json::from_str::<Test>(duplicate).unwrap_err();
        assert!(err.to_string().contains("listening"));
    }

    #[test]
    fn draft_has_default_time_limit() {
        let draft = Test::draft("Unit 3 check");
        assert_eq!(draft.time_limit.map(NonZeroU32::get), Some(40));
        assert!(draft.id.is_none());
        assert_eq!(draft.sections, Sections::empty());
    }

    #[test]
    fn rejects_zero_time_limit() {
        let json = r#"{"title": "t", "timeLimit": 0}"#;
        assert!(serde_json::from_str::<Test>(json).is_err());
    }

    #[test]
    fn collects_assets_across_tree() {
        let mut test = Test::new("assets");
        test.sections
            .get_mut(SectionKind::Listening)
            .parts
            .push(Part {
                id: 1,
                title: String::new(),
                passage: None,
                audio_url: Some("data:audio/wav;base64,AAAA".into()),
                questions: vec![Question {
                    id: 2,
                    text: String::new(),
                    is_example: false,
                    body: QuestionBody::MultipleChoiceImage(Choices {
                        options: vec![ChoiceOption {
                            image_url: Some("https://cdn.example/a.png".into()),
                            ..ChoiceOption::new(3, "A")
                        }],
                    }),
                }],
            });

        let assets = test.assets();
        assert_eq!(assets.len(), 2);
        assert!(assets[0].0.is_audio());
        assert!(assets[0].1.is_inline());
        assert_eq!(
            assets[1].0,
            AssetLocation::OptionImage {
                part_id: 1,
                question_id: 2,
                option_id: 3
            }
        );

        // Slots include empty fields too.
        assert_eq!(test.asset_slots_mut().len(), 2);
    }

    #[test]
    fn inline_asset_display_is_truncated() {
        let asset = AssetRef::new("data:image/png;base64,iVBORw0KGgo");
        assert_eq!(asset.to_string(), "data:image/png;base64,…");
    }

    #[test]
    fn split_inline_payload() {
        let asset = AssetRef::new("data:audio/wav;base64,UklGRg==");
        assert_eq!(asset.split_inline(), Some(("audio/wav", "UklGRg==")));
        assert_eq!(AssetRef::new("https://cdn.example/a.png").split_inline(), None);
        assert_eq!(AssetRef::new("data:nocomma").split_inline(), None);
    }
}

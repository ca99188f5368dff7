//! Structural edits on the section → part → question tree.
//!
//! Every edit is applied to a copy of the input test and the copy is
//! returned; the input is never modified. Edits that target an id that
//! does not exist return the tree unchanged, stats included. Stats are
//! recomputed after every edit that changes the tree.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::flows::GeneratedQuestion;
use crate::ids::IdGenerator;
use crate::model::{
    option_label, AssetRef, BlankAnswer, ChoiceOption, Choices, EmbeddedAnswer, ImageItem, ItemId,
    Part, PictureWords, Question, QuestionBody, QuestionType, SectionKind, SpokenAnswer,
    SubQuestion, Test, Verdict, WordOrder,
};

/// Partial update of a part.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartPatch {
    #[serde(default)]
    pub title: Option<String>,
    /// Ignored outside the reading section.
    #[serde(default)]
    pub passage: Option<String>,
    /// Ignored outside the listening section.
    #[serde(default)]
    pub audio_url: Option<AssetRef>,
}

/// Partial update of a question. Fields that do not apply to the
/// question's type are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPatch {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub is_example: Option<bool>,
    /// fib, write-the-word, writing-order-words.
    #[serde(default)]
    pub answer: Option<String>,
    /// write-the-word.
    #[serde(default)]
    pub text_after: Option<String>,
    /// true-false.
    #[serde(default)]
    pub is_true: Option<bool>,
    /// writing-order-words.
    #[serde(default)]
    pub disordered_words: Option<String>,
    /// speaking-qa.
    #[serde(default)]
    pub image_url: Option<AssetRef>,
    /// speaking-qa.
    #[serde(default)]
    pub reference_answer: Option<String>,
}

/// Partial update of a multiple-choice option.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionPatch {
    #[serde(default)]
    pub is_correct: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_prompt: Option<String>,
    #[serde(default)]
    pub image_url: Option<AssetRef>,
}

/// Partial update of a writing-fill-in-word sub-question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubQuestionPatch {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
}

/// A single structural edit, addressed by id path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Edit {
    AddPart {
        section: SectionKind,
    },
    DeletePart {
        section: SectionKind,
        part_id: ItemId,
    },
    ChangePart {
        section: SectionKind,
        part_id: ItemId,
        patch: PartPatch,
    },
    RemovePartAudio {
        section: SectionKind,
        part_id: ItemId,
    },
    AddQuestion {
        section: SectionKind,
        part_id: ItemId,
        question_type: QuestionType,
    },
    AddGeneratedQuestions {
        section: SectionKind,
        part_id: ItemId,
        questions: Vec<GeneratedQuestion>,
    },
    DeleteQuestion {
        section: SectionKind,
        part_id: ItemId,
        question_id: ItemId,
    },
    ChangeQuestion {
        section: SectionKind,
        part_id: ItemId,
        question_id: ItemId,
        patch: QuestionPatch,
    },
    RemoveQuestionImage {
        section: SectionKind,
        part_id: ItemId,
        question_id: ItemId,
    },
    AddOption {
        section: SectionKind,
        part_id: ItemId,
        question_id: ItemId,
    },
    ChangeOption {
        section: SectionKind,
        part_id: ItemId,
        question_id: ItemId,
        option_id: ItemId,
        patch: OptionPatch,
    },
    DeleteOptionImage {
        section: SectionKind,
        part_id: ItemId,
        question_id: ItemId,
        option_id: ItemId,
    },
    /// Positional: prompt `i` goes to option `i`; empty entries keep the old prompt.
    SetOptionImagePrompts {
        section: SectionKind,
        part_id: ItemId,
        question_id: ItemId,
        prompts: Vec<String>,
    },
    /// Positional: image `i` goes to option `i`; missing entries keep the old image.
    ApplyOptionImages {
        section: SectionKind,
        part_id: ItemId,
        question_id: ItemId,
        images: Vec<AssetRef>,
    },
    AddSubQuestion {
        section: SectionKind,
        part_id: ItemId,
        question_id: ItemId,
    },
    DeleteSubQuestion {
        section: SectionKind,
        part_id: ItemId,
        question_id: ItemId,
        sub_question_id: ItemId,
    },
    ChangeSubQuestion {
        section: SectionKind,
        part_id: ItemId,
        question_id: ItemId,
        sub_question_id: ItemId,
        patch: SubQuestionPatch,
    },
    ChangeImage {
        section: SectionKind,
        part_id: ItemId,
        question_id: ItemId,
        image_id: ItemId,
        #[serde(default)]
        image_url: Option<AssetRef>,
    },
}

/// Applies [`Edit`]s, minting fresh ids for new items.
#[derive(Debug, Default)]
pub struct TreeEditor {
    ids: IdGenerator,
}

impl TreeEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific id source (deterministic ids in tests).
    pub fn with_ids(ids: IdGenerator) -> Self {
        Self { ids }
    }

    /// Apply one edit, returning the new tree.
    pub fn apply(&self, test: &Test, edit: &Edit) -> Test {
        let mut next = test.clone();
        if !self.apply_in_place(&mut next, edit) {
            debug!(?edit, "edit target not found, tree unchanged");
            return test.clone();
        }
        next.refresh_stats();
        next
    }

    /// Apply a sequence of edits in order.
    pub fn apply_all<'a>(&self, test: &Test, edits: impl IntoIterator<Item = &'a Edit>) -> Test {
        let mut next = test.clone();
        let mut changed = false;
        for edit in edits {
            if self.apply_in_place(&mut next, edit) {
                changed = true;
            } else {
                debug!(?edit, "edit target not found, tree unchanged");
            }
        }
        if changed {
            next.refresh_stats();
        }
        next
    }

    /// Build a fresh question of the given type with its default payload.
    pub fn new_question(&self, question_type: QuestionType, taken: &[ItemId]) -> Question {
        let id = self.ids.next_unused(taken);
        let body = match question_type {
            QuestionType::MultipleChoiceText => QuestionBody::MultipleChoiceText(Choices::lettered()),
            QuestionType::MultipleChoiceImage => {
                QuestionBody::MultipleChoiceImage(Choices::lettered())
            }
            QuestionType::FillInBlank => QuestionBody::FillInBlank(BlankAnswer::default()),
            QuestionType::TrueFalse => QuestionBody::TrueFalse(Verdict::default()),
            QuestionType::WriteTheWord => QuestionBody::WriteTheWord(EmbeddedAnswer::default()),
            QuestionType::WritingFillInWord => {
                QuestionBody::WritingFillInWord(PictureWords::seeded(self.ids.next_id()))
            }
            QuestionType::WritingOrderWords => QuestionBody::WritingOrderWords(WordOrder::default()),
            QuestionType::WritingParagraph => QuestionBody::WritingParagraph {},
            QuestionType::SpeakingQa => QuestionBody::SpeakingQa(SpokenAnswer::default()),
        };
        Question {
            id,
            text: String::new(),
            is_example: false,
            body,
        }
    }

    /// Map a generated question into the internal shape. Unrecognized
    /// variants yield `None`.
    pub fn from_generated(&self, generated: &GeneratedQuestion, taken: &[ItemId]) -> Option<Question> {
        let (text, body) = match generated {
            GeneratedQuestion::Mcq {
                question, options, ..
            } => {
                let mut seen_correct = false;
                let options = options
                    .iter()
                    .enumerate()
                    .map(|(i, opt)| {
                        // Keep at most one correct option.
                        let is_correct = opt.is_correct && !seen_correct;
                        seen_correct |= is_correct;
                        ChoiceOption {
                            is_correct,
                            description: opt.text.clone(),
                            ..ChoiceOption::new(i as ItemId + 1, option_label(i))
                        }
                    })
                    .collect();
                (
                    question.clone(),
                    QuestionBody::MultipleChoiceText(Choices { options }),
                )
            }
            GeneratedQuestion::Fib {
                question, answer, ..
            } => (
                question.clone(),
                QuestionBody::FillInBlank(BlankAnswer {
                    answer: answer.clone(),
                }),
            ),
            GeneratedQuestion::TrueFalse {
                statement, is_true, ..
            } => (
                statement.clone(),
                QuestionBody::TrueFalse(Verdict { is_true: *is_true }),
            ),
            GeneratedQuestion::Unrecognized => return None,
        };
        Some(Question {
            id: self.ids.next_unused(taken),
            text,
            is_example: false,
            body,
        })
    }

    fn apply_in_place(&self, test: &mut Test, edit: &Edit) -> bool {
        match edit {
            Edit::AddPart { section } => {
                let kind = *section;
                let section = test.sections.get_mut(kind);
                let taken: Vec<ItemId> = section.parts.iter().map(|p| p.id).collect();
                let part = Part {
                    id: self.ids.next_unused(&taken),
                    title: format!("Part {}: ", section.parts.len() + 1),
                    passage: kind.has_passage().then(String::new),
                    audio_url: None,
                    questions: Vec::new(),
                };
                section.parts.push(part);
                true
            }
            Edit::DeletePart { section, part_id } => {
                let parts = &mut test.sections.get_mut(*section).parts;
                let before = parts.len();
                parts.retain(|p| p.id != *part_id);
                parts.len() != before
            }
            Edit::ChangePart {
                section,
                part_id,
                patch,
            } => {
                let kind = *section;
                with_part(test, kind, *part_id, |part| {
                    if let Some(title) = &patch.title {
                        part.title = title.clone();
                    }
                    if let Some(passage) = &patch.passage {
                        if kind.has_passage() {
                            part.passage = Some(passage.clone());
                        }
                    }
                    if let Some(audio) = &patch.audio_url {
                        if kind.has_audio() {
                            part.audio_url = Some(audio.clone());
                        }
                    }
                })
            }
            Edit::RemovePartAudio { section, part_id } => {
                with_part(test, *section, *part_id, |part| part.audio_url = None)
            }
            Edit::AddQuestion {
                section,
                part_id,
                question_type,
            } => with_part(test, *section, *part_id, |part| {
                let taken = question_ids(part);
                let question = self.new_question(*question_type, &taken);
                part.questions.push(question);
            }),
            Edit::AddGeneratedQuestions {
                section,
                part_id,
                questions,
            } => with_part(test, *section, *part_id, |part| {
                for generated in questions {
                    let taken = question_ids(part);
                    match self.from_generated(generated, &taken) {
                        Some(question) => part.questions.push(question),
                        None => debug!("dropping unrecognized generated question"),
                    }
                }
            }),
            Edit::DeleteQuestion {
                section,
                part_id,
                question_id,
            } => {
                let mut removed = false;
                with_part(test, *section, *part_id, |part| {
                    let before = part.questions.len();
                    part.questions.retain(|q| q.id != *question_id);
                    removed = part.questions.len() != before;
                });
                removed
            }
            Edit::ChangeQuestion {
                section,
                part_id,
                question_id,
                patch,
            } => with_question(test, *section, *part_id, *question_id, |q| {
                patch_question(q, patch)
            }),
            Edit::RemoveQuestionImage {
                section,
                part_id,
                question_id,
            } => with_question(test, *section, *part_id, *question_id, |q| {
                if let QuestionBody::SpeakingQa(spoken) = &mut q.body {
                    spoken.image_url = None;
                }
            }),
            Edit::AddOption {
                section,
                part_id,
                question_id,
            } => with_choices(test, *section, *part_id, *question_id, |choices| {
                let taken: Vec<ItemId> = choices.options.iter().map(|o| o.id).collect();
                let option = ChoiceOption::new(
                    self.ids.next_unused(&taken),
                    option_label(choices.options.len()),
                );
                choices.options.push(option);
            }),
            Edit::ChangeOption {
                section,
                part_id,
                question_id,
                option_id,
                patch,
            } => {
                let mut found = false;
                with_choices(test, *section, *part_id, *question_id, |choices| {
                    if let Some(options) = change_option(&choices.options, *option_id, patch) {
                        choices.options = options;
                        found = true;
                    }
                });
                found
            }
            Edit::DeleteOptionImage {
                section,
                part_id,
                question_id,
                option_id,
            } => {
                let mut found = false;
                with_choices(test, *section, *part_id, *question_id, |choices| {
                    if let Some(option) = choices.options.iter_mut().find(|o| o.id == *option_id) {
                        option.image_url = None;
                        found = true;
                    }
                });
                found
            }
            Edit::SetOptionImagePrompts {
                section,
                part_id,
                question_id,
                prompts,
            } => with_choices(test, *section, *part_id, *question_id, |choices| {
                for (option, prompt) in choices.options.iter_mut().zip(prompts) {
                    if !prompt.is_empty() {
                        option.image_prompt = prompt.clone();
                    }
                }
            }),
            Edit::ApplyOptionImages {
                section,
                part_id,
                question_id,
                images,
            } => with_choices(test, *section, *part_id, *question_id, |choices| {
                for (option, image) in choices.options.iter_mut().zip(images) {
                    if !image.as_str().is_empty() {
                        option.image_url = Some(image.clone());
                    }
                }
            }),
            Edit::AddSubQuestion {
                section,
                part_id,
                question_id,
            } => with_picture_words(test, *section, *part_id, *question_id, |words| {
                let taken: Vec<ItemId> = words
                    .sub_questions
                    .iter()
                    .map(|sq| sq.id)
                    .chain(words.images.iter().map(|img| img.id))
                    .collect();
                let id = self.ids.next_unused(&taken);
                words.sub_questions.push(SubQuestion::new(id));
                words.images.push(ImageItem {
                    id,
                    image_url: None,
                });
            }),
            Edit::DeleteSubQuestion {
                section,
                part_id,
                question_id,
                sub_question_id,
            } => {
                let mut removed = false;
                with_picture_words(test, *section, *part_id, *question_id, |words| {
                    let before = words.sub_questions.len();
                    words.sub_questions.retain(|sq| sq.id != *sub_question_id);
                    words.images.retain(|img| img.id != *sub_question_id);
                    removed = words.sub_questions.len() != before;
                });
                removed
            }
            Edit::ChangeSubQuestion {
                section,
                part_id,
                question_id,
                sub_question_id,
                patch,
            } => {
                let mut found = false;
                with_picture_words(test, *section, *part_id, *question_id, |words| {
                    if let Some(sq) = words
                        .sub_questions
                        .iter_mut()
                        .find(|sq| sq.id == *sub_question_id)
                    {
                        if let Some(text) = &patch.text {
                            sq.text = text.clone();
                        }
                        if let Some(answer) = &patch.answer {
                            sq.answer = answer.clone();
                        }
                        found = true;
                    }
                });
                found
            }
            Edit::ChangeImage {
                section,
                part_id,
                question_id,
                image_id,
                image_url,
            } => {
                let mut found = false;
                with_picture_words(test, *section, *part_id, *question_id, |words| {
                    if let Some(slot) = words.images.iter_mut().find(|img| img.id == *image_id) {
                        slot.image_url = image_url.clone();
                        found = true;
                    }
                });
                found
            }
        }
    }
}

/// New option list after applying `patch` to `option_id`, or `None` if the
/// option does not exist. Marking an option correct clears every sibling in
/// the same pass.
fn change_option(
    options: &[ChoiceOption],
    option_id: ItemId,
    patch: &OptionPatch,
) -> Option<Vec<ChoiceOption>> {
    if !options.iter().any(|o| o.id == option_id) {
        return None;
    }
    let exclusive = patch.is_correct == Some(true);
    let updated = options
        .iter()
        .map(|option| {
            let mut option = option.clone();
            if option.id == option_id {
                if let Some(is_correct) = patch.is_correct {
                    option.is_correct = is_correct;
                }
                if let Some(description) = &patch.description {
                    option.description = description.clone();
                }
                if let Some(prompt) = &patch.image_prompt {
                    option.image_prompt = prompt.clone();
                }
                if let Some(image) = &patch.image_url {
                    option.image_url = Some(image.clone());
                }
            } else if exclusive {
                option.is_correct = false;
            }
            option
        })
        .collect();
    Some(updated)
}

fn patch_question(question: &mut Question, patch: &QuestionPatch) {
    if let Some(text) = &patch.text {
        question.text = text.clone();
    }
    if let Some(is_example) = patch.is_example {
        question.is_example = is_example;
    }
    match &mut question.body {
        QuestionBody::FillInBlank(blank) => {
            if let Some(answer) = &patch.answer {
                blank.answer = answer.clone();
            }
        }
        QuestionBody::TrueFalse(verdict) => {
            if let Some(is_true) = patch.is_true {
                verdict.is_true = is_true;
            }
        }
        QuestionBody::WriteTheWord(embedded) => {
            if let Some(answer) = &patch.answer {
                embedded.answer = answer.clone();
            }
            if let Some(after) = &patch.text_after {
                embedded.text_after = after.clone();
            }
        }
        QuestionBody::WritingOrderWords(order) => {
            if let Some(answer) = &patch.answer {
                order.answer = answer.clone();
            }
            if let Some(disordered) = &patch.disordered_words {
                order.disordered_words = disordered.clone();
            }
        }
        QuestionBody::SpeakingQa(spoken) => {
            if let Some(image) = &patch.image_url {
                spoken.image_url = Some(image.clone());
            }
            if let Some(reference) = &patch.reference_answer {
                spoken.reference_answer = reference.clone();
            }
        }
        QuestionBody::MultipleChoiceText(_)
        | QuestionBody::MultipleChoiceImage(_)
        | QuestionBody::WritingFillInWord(_)
        | QuestionBody::WritingParagraph {} => {}
    }
}

fn question_ids(part: &Part) -> Vec<ItemId> {
    part.questions.iter().map(|q| q.id).collect()
}

fn with_part(
    test: &mut Test,
    section: SectionKind,
    part_id: ItemId,
    f: impl FnOnce(&mut Part),
) -> bool {
    match test
        .sections
        .get_mut(section)
        .parts
        .iter_mut()
        .find(|p| p.id == part_id)
    {
        Some(part) => {
            f(part);
            true
        }
        None => false,
    }
}

fn with_question(
    test: &mut Test,
    section: SectionKind,
    part_id: ItemId,
    question_id: ItemId,
    f: impl FnOnce(&mut Question),
) -> bool {
    let mut found = false;
    with_part(test, section, part_id, |part| {
        if let Some(q) = part.questions.iter_mut().find(|q| q.id == question_id) {
            f(q);
            found = true;
        }
    });
    found
}

fn with_choices(
    test: &mut Test,
    section: SectionKind,
    part_id: ItemId,
    question_id: ItemId,
    f: impl FnOnce(&mut Choices),
) -> bool {
    let mut found = false;
    with_question(test, section, part_id, question_id, |q| {
        if let Some(choices) = q.body.choices_mut() {
            f(choices);
            found = true;
        }
    });
    found
}

fn with_picture_words(
    test: &mut Test,
    section: SectionKind,
    part_id: ItemId,
    question_id: ItemId,
    f: impl FnOnce(&mut PictureWords),
) -> bool {
    let mut found = false;
    with_question(test, section, part_id, question_id, |q| {
        if let Some(words) = q.body.picture_words_mut() {
            f(words);
            found = true;
        }
    });
    found
}

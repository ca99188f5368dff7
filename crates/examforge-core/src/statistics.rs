//! Scoring statistics and student-facing question numbering.
//!
//! Stats are a pure function of the section tree. Example questions are
//! excluded from both the counts and the numbering.

use serde::{Deserialize, Serialize};

use crate::model::{Part, Question, QuestionBody, Sections, Stats};

/// Points awarded for an ordinary question.
pub const QUESTION_SCORE: f64 = 0.25;
/// Points awarded for a writing-paragraph question.
pub const PARAGRAPH_SCORE: f64 = 1.0;

/// How many numbered units a question contributes and what they are worth.
///
/// Returns `(0, 0.0)` for example questions.
pub fn question_weight(question: &Question) -> (u32, f64) {
    if question.is_example {
        return (0, 0.0);
    }
    match &question.body {
        QuestionBody::WritingParagraph {} => (1, PARAGRAPH_SCORE),
        QuestionBody::WritingFillInWord(words) => {
            let n = words.sub_questions.len() as u32;
            (n, f64::from(n) * QUESTION_SCORE)
        }
        _ => (1, QUESTION_SCORE),
    }
}

/// Compute aggregate stats from the section tree.
pub fn compute_stats(sections: &Sections) -> Stats {
    let mut stats = Stats::default();
    for section in sections.iter() {
        stats.total_parts += section.parts.len() as u32;
        for question in section.parts.iter().flat_map(|p| &p.questions) {
            let (count, score) = question_weight(question);
            stats.total_questions += count;
            stats.total_score += score;
        }
    }
    stats
}

/// Student-facing label of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum QuestionLabel {
    /// Worked example, shown as "Ex.".
    Example,
    /// A single numbered question.
    Number { number: u32 },
    /// A question spanning several numbers (one per sub-question).
    Range { first: u32, last: u32 },
    /// A scored question with nothing to number (no sub-questions yet).
    Unnumbered,
}

impl std::fmt::Display for QuestionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionLabel::Example => write!(f, "Ex."),
            QuestionLabel::Number { number } => write!(f, "{number}."),
            QuestionLabel::Range { first, last } if first == last => write!(f, "{first}."),
            QuestionLabel::Range { first, last } => write!(f, "{first}-{last}."),
            QuestionLabel::Unnumbered => Ok(()),
        }
    }
}

/// Lays out one part for students: examples first, then scored questions
/// numbered consecutively from `next_number`.
///
/// Returns the labelled questions and the next free number.
pub fn layout_part(part: &Part, next_number: u32) -> (Vec<(QuestionLabel, &Question)>, u32) {
    let mut layout: Vec<(QuestionLabel, &Question)> = part
        .questions
        .iter()
        .filter(|q| q.is_example)
        .map(|q| (QuestionLabel::Example, q))
        .collect();

    let mut next = next_number;
    for question in part.questions.iter().filter(|q| !q.is_example) {
        let (count, _) = question_weight(question);
        let label = match count {
            0 => QuestionLabel::Unnumbered,
            1 if !matches!(question.body, QuestionBody::WritingFillInWord(_)) => {
                QuestionLabel::Number { number: next }
            }
            n => QuestionLabel::Range {
                first: next,
                last: next + n - 1,
            },
        };
        next += count;
        layout.push((label, question));
    }
    (layout, next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;

    fn question(id: ItemId, body: QuestionBody, is_example: bool) -> Question {
        Question {
            id,
            text: String::new(),
            is_example,
            body,
        }
    }

    fn tf(id: ItemId, is_example: bool) -> Question {
        question(id, QuestionBody::TrueFalse(Verdict { is_true: true }), is_example)
    }

    fn part(id: ItemId, questions: Vec<Question>) -> Part {
        Part {
            id,
            title: String::new(),
            passage: None,
            audio_url: None,
            questions,
        }
    }

    #[test]
    fn empty_test_has_zero_stats() {
        assert_eq!(compute_stats(&Sections::empty()), Stats::default());
    }

    #[test]
    fn example_true_false_contributes_nothing() {
        let mut sections = Sections::empty();
        sections.get_mut(SectionKind::Reading).parts.push(part(
            1,
            vec![tf(2, true), tf(3, false), tf(4, false)],
        ));

        let stats = compute_stats(&sections);
        assert_eq!(stats.total_questions, 2);
        assert_eq!(stats.total_score, 0.5);
        assert_eq!(stats.total_parts, 1);
    }

    #[test]
    fn paragraph_and_fill_in_word_weights() {
        let mut words = PictureWords::seeded(10);
        words.sub_questions.push(SubQuestion::new(11));
        words.images.push(ImageItem {
            id: 11,
            image_url: None,
        });
        words.sub_questions.push(SubQuestion::new(12));
        words.images.push(ImageItem {
            id: 12,
            image_url: None,
        });

        let mut sections = Sections::empty();
        sections.get_mut(SectionKind::Writing).parts.push(part(
            1,
            vec![
                question(2, QuestionBody::WritingParagraph {}, false),
                question(3, QuestionBody::WritingFillInWord(words), false),
            ],
        ));
        sections
            .get_mut(SectionKind::Speaking)
            .parts
            .push(part(4, vec![]));

        let stats = compute_stats(&sections);
        assert_eq!(stats.total_questions, 1 + 3);
        assert_eq!(stats.total_score, 1.0 + 0.75);
        assert_eq!(stats.total_parts, 2);
    }

    #[test]
    fn layout_puts_examples_first() {
        let p = part(1, vec![tf(2, false), tf(3, true), tf(4, false)]);
        let (layout, next) = layout_part(&p, 5);

        let labels: Vec<_> = layout.iter().map(|(l, q)| (*l, q.id)).collect();
        assert_eq!(
            labels,
            vec![
                (QuestionLabel::Example, 3),
                (QuestionLabel::Number { number: 5 }, 2),
                (QuestionLabel::Number { number: 6 }, 4),
            ]
        );
        assert_eq!(next, 7);
    }

    #[test]
    fn fill_in_word_consumes_one_number_per_sub_question() {
        let mut words = PictureWords::seeded(20);
        words.sub_questions.push(SubQuestion::new(21));
        words.images.push(ImageItem {
            id: 21,
            image_url: None,
        });
        let single = PictureWords::seeded(30);
        let p = part(
            1,
            vec![
                question(2, QuestionBody::WritingFillInWord(words), false),
                question(3, QuestionBody::WritingFillInWord(single), false),
                question(4, QuestionBody::WritingFillInWord(PictureWords::default()), false),
            ],
        );
        let (layout, next) = layout_part(&p, 1);
        assert_eq!(layout[0].0, QuestionLabel::Range { first: 1, last: 2 });
        assert_eq!(layout[1].0, QuestionLabel::Range { first: 3, last: 3 });
        assert_eq!(layout[2].0, QuestionLabel::Unnumbered);
        assert_eq!(next, 4);
        assert_eq!(layout[0].0.to_string(), "1-2.");
        assert_eq!(QuestionLabel::Example.to_string(), "Ex.");
    }
}

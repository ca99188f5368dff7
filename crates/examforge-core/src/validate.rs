//! Consistency checks for test documents.
//!
//! The editor keeps these invariants on every edit; documents loaded from
//! disk or produced by other tools may not, so they are reported here as
//! warnings rather than rejected.

use std::collections::HashSet;
use std::fmt;

use crate::model::{ItemId, QuestionBody, SectionKind, Test};
use crate::statistics::compute_stats;

/// A warning from test validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    /// Where the problem is, e.g. "reading/part 3/question 7".
    pub location: Option<String>,
    /// Warning message.
    pub message: String,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{location}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Validate a test document for common issues.
///
/// Set `stored` when checking a document read back from the store: stored
/// documents must not carry inline payloads.
pub fn validate_test(test: &Test, stored: bool) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut warn = |location: Option<String>, message: String| {
        warnings.push(ValidationWarning { location, message });
    };

    if test.title.trim().is_empty() {
        warn(None, "title is empty".into());
    }

    let expected = compute_stats(&test.sections);
    if test.stats != expected {
        warn(
            None,
            format!(
                "stats drift from tree: stored {}/{}/{}, computed {}/{}/{}",
                test.stats.total_questions,
                test.stats.total_score,
                test.stats.total_parts,
                expected.total_questions,
                expected.total_score,
                expected.total_parts
            ),
        );
    }

    for section in test.sections.iter() {
        let kind = section.id;
        duplicates(section.parts.iter().map(|p| p.id), |id| {
            warn(Some(kind.to_string()), format!("duplicate part id: {id}"))
        });

        for part in &section.parts {
            let part_loc = format!("{kind}/part {}", part.id);
            if part.passage.as_deref().is_some_and(|p| !p.is_empty()) && !kind.has_passage() {
                warn(Some(part_loc.clone()), "passage on a non-reading part".into());
            }
            if part.audio_url.is_some() && !kind.has_audio() {
                warn(Some(part_loc.clone()), "audio on a non-listening part".into());
            }
            duplicates(part.questions.iter().map(|q| q.id), |id| {
                warn(Some(part_loc.clone()), format!("duplicate question id: {id}"))
            });

            for question in &part.questions {
                let loc = format!("{part_loc}/question {}", question.id);
                match &question.body {
                    QuestionBody::MultipleChoiceText(choices)
                    | QuestionBody::MultipleChoiceImage(choices) => {
                        let correct = choices.correct_count();
                        if correct > 1 {
                            warn(
                                Some(loc.clone()),
                                format!("{correct} options marked correct, expected at most one"),
                            );
                        }
                        if correct == 0 && !question.is_example {
                            warn(Some(loc.clone()), "no option marked correct".into());
                        }
                        if choices.options.len() != 3 {
                            warn(
                                Some(loc.clone()),
                                format!("{} options, expected 3", choices.options.len()),
                            );
                        }
                        duplicates(choices.options.iter().map(|o| o.id), |id| {
                            warn(Some(loc.clone()), format!("duplicate option id: {id}"))
                        });
                    }
                    QuestionBody::WritingFillInWord(words) => {
                        if !words.is_paired() {
                            warn(
                                Some(loc.clone()),
                                "sub-questions and image slots are not paired".into(),
                            );
                        }
                        duplicates(words.sub_questions.iter().map(|sq| sq.id), |id| {
                            warn(Some(loc.clone()), format!("duplicate sub-question id: {id}"))
                        });
                    }
                    _ => {}
                }
            }
        }
    }

    if stored {
        for (location, asset) in test.assets() {
            if asset.is_inline() {
                warn(
                    Some(format!("{location:?}")),
                    "inline payload in a stored document".into(),
                );
            }
        }
    }

    warnings
}

fn duplicates(ids: impl Iterator<Item = ItemId>, mut report: impl FnMut(ItemId)) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            report(id);
        }
    }
}

/// Sections in which `test` has at least one part.
pub fn populated_sections(test: &Test) -> Vec<SectionKind> {
    test.sections
        .iter()
        .filter(|s| !s.parts.is_empty())
        .map(|s| s.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;

    fn mcq(id: ItemId, correct: &[ItemId]) -> Question {
        let mut choices = Choices::lettered();
        for option in &mut choices.options {
            option.is_correct = correct.contains(&option.id);
        }
        Question {
            id,
            text: "Pick one".into(),
            is_example: false,
            body: QuestionBody::MultipleChoiceText(choices),
        }
    }

    fn test_with(section: SectionKind, part: Part) -> Test {
        let mut test = Test::new("Quiz");
        test.sections.get_mut(section).parts.push(part);
        test.refresh_stats();
        test
    }

    fn part(questions: Vec<Question>) -> Part {
        Part {
            id: 1,
            title: "Part 1: ".into(),
            passage: None,
            audio_url: None,
            questions,
        }
    }

    #[test]
    fn clean_test_has_no_warnings() {
        let test = test_with(SectionKind::Reading, part(vec![mcq(2, &[1])]));
        assert!(validate_test(&test, false).is_empty());
        assert_eq!(populated_sections(&test), vec![SectionKind::Reading]);
    }

    #[test]
    fn flags_multiple_or_missing_correct_options() {
        let test = test_with(
            SectionKind::Reading,
            part(vec![mcq(2, &[1, 2]), mcq(3, &[])]),
        );
        let warnings = validate_test(&test, false);
        assert!(warnings.iter().any(|w| w.message.contains("2 options marked correct")));
        assert!(warnings
            .iter()
            .any(|w| w.message == "no option marked correct"
                && w.location.as_deref() == Some("reading/part 1/question 3")));
    }

    #[test]
    fn flags_duplicate_ids_and_stats_drift() {
        let mut test = test_with(SectionKind::Reading, part(vec![mcq(2, &[1]), mcq(2, &[1])]));
        test.stats.total_score = 99.0;
        let warnings = validate_test(&test, false);
        assert!(warnings.iter().any(|w| w.message == "duplicate question id: 2"));
        assert!(warnings.iter().any(|w| w.message.starts_with("stats drift")));
    }

    #[test]
    fn flags_misplaced_passage_and_audio() {
        let mut p = part(vec![]);
        p.passage = Some("Once upon a time".into());
        p.audio_url = Some("https://cdn.example/a.wav".into());
        let test = test_with(SectionKind::Writing, p);
        let warnings = validate_test(&test, false);
        assert!(warnings.iter().any(|w| w.message.contains("non-reading")));
        assert!(warnings.iter().any(|w| w.message.contains("non-listening")));
    }

    #[test]
    fn flags_unpaired_fill_in_word_and_inline_payloads() {
        let mut words = PictureWords::seeded(5);
        words.images[0].image_url = Some("data:image/png;base64,AA==".into());
        words.sub_questions.push(SubQuestion::new(6));
        let q = Question {
            id: 2,
            text: String::new(),
            is_example: false,
            body: QuestionBody::WritingFillInWord(words),
        };
        let test = test_with(SectionKind::Writing, part(vec![q]));

        let warnings = validate_test(&test, true);
        assert!(warnings.iter().any(|w| w.message.contains("not paired")));
        assert!(warnings.iter().any(|w| w.message.contains("inline payload")));
        // Inline payloads are expected before save.
        assert!(!validate_test(&test, false)
            .iter()
            .any(|w| w.message.contains("inline payload")));
    }

    #[test]
    fn flags_empty_title() {
        let test = Test::new("  ");
        let warnings = validate_test(&test, false);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].to_string(), "title is empty");
    }
}

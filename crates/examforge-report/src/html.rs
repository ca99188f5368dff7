//! Printable HTML worksheet generator.
//!
//! Produces a self-contained HTML file with the CSS inlined. Within each
//! part, worked examples come first and are labelled "Ex."; scored
//! questions are numbered across the whole test.

use std::path::Path;

use anyhow::{Context, Result};

use examforge_core::model::{AssetRef, Part, Question, QuestionBody, Section, Test};
use examforge_core::statistics::{layout_part, QuestionLabel};

/// What to include besides the student-facing content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Mark correct options and fill in answers.
    pub answer_key: bool,
}

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate a worksheet for a test.
pub fn generate_html(test: &Test, options: &RenderOptions) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{}</title>\n", html_escape(&test.title)));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&test.title)));
    let mut meta = format!(
        "{} questions | {:.2} points",
        test.stats.total_questions, test.stats.total_score
    );
    if let Some(minutes) = test.time_limit {
        meta.push_str(&format!(" | {minutes} minutes"));
    }
    if let Some(updated) = test.updated_at {
        meta.push_str(&format!(" | {}", updated.format("%Y-%m-%d")));
    }
    if options.answer_key {
        meta.push_str(" | Answer key");
    }
    html.push_str(&format!("<p class=\"meta\">{meta}</p>\n"));
    html.push_str("<p class=\"student\">Name: ______________________ Class: ________</p>\n");
    html.push_str("</header>\n");

    let mut next_number = 1;
    for section in test.sections.iter().filter(|s| !s.parts.is_empty()) {
        next_number = render_section(&mut html, section, next_number, options);
    }

    html.push_str("</body>\n</html>");
    html
}

/// Write a worksheet to a file.
pub fn write_html_worksheet(test: &Test, options: &RenderOptions, path: &Path) -> Result<()> {
    let html = generate_html(test, options);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn render_section(html: &mut String, section: &Section, mut next_number: u32, options: &RenderOptions) -> u32 {
    html.push_str(&format!(
        "<section class=\"section\" id=\"{}\">\n<h2>{}</h2>\n",
        section.id,
        html_escape(&section.title)
    ));
    for part in &section.parts {
        next_number = render_part(html, part, next_number, options);
    }
    html.push_str("</section>\n");
    next_number
}

fn render_part(html: &mut String, part: &Part, next_number: u32, options: &RenderOptions) -> u32 {
    html.push_str("<div class=\"part\">\n");
    html.push_str(&format!("<h3>{}</h3>\n", html_escape(&part.title)));
    if let Some(audio) = &part.audio_url {
        html.push_str(&format!(
            "<audio controls src=\"{}\"></audio>\n",
            html_escape(audio.as_str())
        ));
    }
    if let Some(passage) = part.passage.as_deref().filter(|p| !p.trim().is_empty()) {
        html.push_str("<div class=\"passage\">\n");
        for paragraph in passage.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
            html.push_str(&format!("<p>{}</p>\n", html_escape(paragraph).replace('\n', "<br>")));
        }
        html.push_str("</div>\n");
    }

    let (layout, next) = layout_part(part, next_number);
    html.push_str("<ol class=\"questions\">\n");
    for (label, question) in layout {
        render_question(html, label, question, options);
    }
    html.push_str("</ol>\n</div>\n");
    next
}

fn img(asset: &AssetRef, alt: &str) -> String {
    format!(
        "<img src=\"{}\" alt=\"{}\">",
        html_escape(asset.as_str()),
        html_escape(alt)
    )
}

/// Answer text shown only in the answer key.
fn answer(text: &str, options: &RenderOptions) -> String {
    if options.answer_key && !text.is_empty() {
        format!("<span class=\"answer\">{}</span>", html_escape(text))
    } else {
        BLANK.to_string()
    }
}

const BLANK: &str = "<span class=\"blank\"></span>";

fn render_question(html: &mut String, label: QuestionLabel, question: &Question, options: &RenderOptions) {
    let class = if question.is_example { "question example" } else { "question" };
    html.push_str(&format!(
        "<li class=\"{class}\"><span class=\"label\">{label}</span> "
    ));
    // Examples are worked: always show their answers.
    let shown = RenderOptions {
        answer_key: options.answer_key || question.is_example,
    };

    match &question.body {
        QuestionBody::MultipleChoiceText(choices) | QuestionBody::MultipleChoiceImage(choices) => {
            html.push_str(&html_escape(&question.text));
            html.push_str("\n<ul class=\"options\">\n");
            for option in &choices.options {
                let marked = shown.answer_key && option.is_correct;
                html.push_str(&format!(
                    "<li{}><strong>{}.</strong> ",
                    if marked { " class=\"correct\"" } else { "" },
                    html_escape(&option.label)
                ));
                if let Some(image) = &option.image_url {
                    html.push_str(&img(image, &option.description));
                    html.push(' ');
                }
                html.push_str(&html_escape(&option.description));
                html.push_str("</li>\n");
            }
            html.push_str("</ul>\n");
        }
        QuestionBody::FillInBlank(blank) => {
            let filled = answer(&blank.answer, &shown);
            let text = html_escape(&question.text);
            if text.contains("___") {
                html.push_str(&text.replacen("___", &filled, 1));
            } else {
                html.push_str(&format!("{text} {filled}"));
            }
        }
        QuestionBody::TrueFalse(verdict) => {
            html.push_str(&html_escape(&question.text));
            let (t, f) = match (shown.answer_key, verdict.is_true) {
                (true, true) => ("☑", "☐"),
                (true, false) => ("☐", "☑"),
                (false, _) => ("☐", "☐"),
            };
            html.push_str(&format!(" <span class=\"tf\">{t} True {f} False</span>"));
        }
        QuestionBody::WriteTheWord(embedded) => {
            html.push_str(&format!(
                "{} {} {}",
                html_escape(&question.text),
                answer(&embedded.answer, &shown),
                html_escape(&embedded.text_after)
            ));
        }
        QuestionBody::WritingFillInWord(words) => {
            html.push_str(&html_escape(&question.text));
            let first = match label {
                QuestionLabel::Range { first, .. } => Some(first),
                QuestionLabel::Number { number } => Some(number),
                _ => None,
            };
            html.push_str("\n<div class=\"picture-words\">\n");
            for (i, sub) in words.sub_questions.iter().enumerate() {
                let image = words.images.iter().find(|slot| slot.id == sub.id);
                html.push_str("<div class=\"picture-word\">");
                if let Some(url) = image.and_then(|slot| slot.image_url.as_ref()) {
                    html.push_str(&img(url, &sub.text));
                }
                let number = first.map(|n| format!("{}. ", n + i as u32)).unwrap_or_default();
                html.push_str(&format!(
                    "<p>{number}{} {}</p></div>\n",
                    html_escape(&sub.text),
                    answer(&sub.answer, &shown)
                ));
            }
            html.push_str("</div>\n");
        }
        QuestionBody::WritingOrderWords(order) => {
            html.push_str(&html_escape(&question.text));
            html.push_str(&format!(
                "\n<p class=\"scrambled\">{}</p>\n<p>{}</p>",
                html_escape(&order.disordered_words),
                answer(&order.answer, &shown)
            ));
        }
        QuestionBody::WritingParagraph {} => {
            html.push_str(&html_escape(&question.text));
            html.push_str("\n<div class=\"lines\"></div>");
        }
        QuestionBody::SpeakingQa(spoken) => {
            if let Some(image) = &spoken.image_url {
                html.push_str(&img(image, &question.text));
                html.push(' ');
            }
            html.push_str(&html_escape(&question.text));
            if shown.answer_key && !spoken.reference_answer.is_empty() {
                html.push_str(&format!(
                    "\n<p class=\"answer\">{}</p>",
                    html_escape(&spoken.reference_answer)
                ));
            }
        }
    }
    html.push_str("</li>\n");
}

const CSS: &str = r#"
body { font-family: 'Segoe UI', Arial, sans-serif; margin: 0 auto; padding: 2rem; max-width: 52rem; color: #111; }
header { border-bottom: 2px solid #111; margin-bottom: 1.5rem; }
h1 { margin: 0 0 0.25rem; }
h2 { border-bottom: 1px solid #999; padding-bottom: 0.25rem; margin-top: 2rem; }
h3 { font-style: italic; font-weight: 600; }
.meta { color: #555; }
.passage { background: #f5f5f5; padding: 0.75rem 1rem; border-radius: 6px; }
ol.questions { list-style: none; padding-left: 0; }
.question { margin: 0.75rem 0; }
.example { color: #444; }
.label { font-weight: bold; display: inline-block; min-width: 2.5rem; }
ul.options { list-style: none; padding-left: 2.5rem; }
ul.options li { margin: 0.2rem 0; }
.correct { text-decoration: underline; font-weight: bold; }
.blank { display: inline-block; min-width: 6rem; border-bottom: 1px solid #111; }
.answer { color: #1d4ed8; font-weight: 600; }
.scrambled { font-family: monospace; }
.picture-words { display: flex; flex-wrap: wrap; gap: 1rem; padding-left: 2.5rem; }
.picture-word { width: 10rem; text-align: center; }
img { max-width: 10rem; max-height: 8rem; vertical-align: middle; }
.lines { height: 8rem; background: repeating-linear-gradient(transparent, transparent 1.9rem, #999 2rem); }
@media print { audio { display: none; } section { break-inside: avoid-page; } }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use examforge_core::model::*;

    fn question(id: ItemId, text: &str, body: QuestionBody, is_example: bool) -> Question {
        Question {
            id,
            text: text.into(),
            is_example,
            body,
        }
    }

    fn sample_test() -> Test {
        let mut test = Test::new("Unit 1 <Quiz>");
        let mut choices = Choices::lettered();
        choices.options[1].is_correct = true;
        choices.options[1].description = "Science".into();
        test.sections.get_mut(SectionKind::Reading).parts.push(Part {
            id: 10,
            title: "Part 1: Read and answer.".into(),
            passage: Some("Hi, I'm Minh.\n\nI like science.".into()),
            audio_url: None,
            questions: vec![
                question(
                    11,
                    "What does Minh like?",
                    QuestionBody::MultipleChoiceText(choices),
                    false,
                ),
                question(
                    12,
                    "The sky is blue.",
                    QuestionBody::TrueFalse(Verdict { is_true: true }),
                    true,
                ),
            ],
        });
        let mut words = PictureWords::seeded(21);
        words.sub_questions[0].answer = "apple".into();
        words.sub_questions.push(SubQuestion {
            id: 22,
            text: "It is a ___".into(),
            answer: "pear".into(),
        });
        words.images.push(ImageItem {
            id: 22,
            image_url: Some(AssetRef::new("https://cdn.example/pear.png")),
        });
        test.sections.get_mut(SectionKind::Writing).parts.push(Part {
            id: 20,
            title: "Part 2: Look and write.".into(),
            passage: None,
            audio_url: None,
            questions: vec![question(
                23,
                "Look and write.",
                QuestionBody::WritingFillInWord(words),
                false,
            )],
        });
        test.refresh_stats();
        test
    }

    #[test]
    fn worksheet_contains_required_elements() {
        let html = generate_html(&sample_test(), &RenderOptions::default());

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Unit 1 &lt;Quiz&gt;"));
        assert!(html.contains("<h2>Reading</h2>"));
        assert!(!html.contains("<h2>Listening</h2>"));
        assert!(html.contains("<p>I like science.</p>"));
        assert!(html.contains("3 questions"));
    }

    #[test]
    fn examples_first_and_numbering_spans_sections() {
        let html = generate_html(&sample_test(), &RenderOptions::default());
        let example = html.find("Ex.").unwrap();
        let first = html.find("1.</span> What does Minh like?").unwrap();
        assert!(example < first);
        assert!(html.contains("<span class=\"label\">2-3.</span>"));
        assert!(html.contains("3. It is a ___"));
        assert!(html.contains("src=\"https://cdn.example/pear.png\""));
    }

    #[test]
    fn answers_only_in_answer_key() {
        let test = sample_test();
        let student = generate_html(&test, &RenderOptions::default());
        assert!(!student.contains("class=\"correct\""));
        assert!(!student.contains("pear</span>"));
        // Worked examples always show their answer.
        assert!(student.contains("☑ True ☐ False"));

        let key = generate_html(&test, &RenderOptions { answer_key: true });
        assert!(key.contains("<li class=\"correct\"><strong>B.</strong> Science</li>"));
        assert!(key.contains("<span class=\"answer\">pear</span>"));
        assert!(key.contains("Answer key"));
    }

    #[test]
    fn worksheet_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("worksheet.html");

        write_html_worksheet(&sample_test(), &RenderOptions::default(), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}

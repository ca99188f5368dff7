//! The `examforge init` command.

use std::path::Path;

use anyhow::Result;

const CONFIG_FILE: &str = "examforge.toml";
const SAMPLE_TEST_DIR: &str = "tests";
const SAMPLE_TEST_FILE: &str = "tests/sample-test.json";

pub fn execute() -> Result<()> {
    if Path::new(CONFIG_FILE).exists() {
        println!("{CONFIG_FILE} already exists, skipping.");
    } else {
        std::fs::write(CONFIG_FILE, SAMPLE_CONFIG)?;
        println!("Created {CONFIG_FILE}");
    }

    std::fs::create_dir_all(SAMPLE_TEST_DIR)?;
    if Path::new(SAMPLE_TEST_FILE).exists() {
        println!("{SAMPLE_TEST_FILE} already exists, skipping.");
    } else {
        std::fs::write(SAMPLE_TEST_FILE, SAMPLE_TEST)?;
        println!("Created {SAMPLE_TEST_FILE}");
    }

    println!("\nNext steps:");
    println!("  1. Set OPENAI_API_KEY (or edit {CONFIG_FILE})");
    println!("  2. Run: examforge validate --test {SAMPLE_TEST_FILE}");
    println!("  3. Run: examforge save --test {SAMPLE_TEST_FILE}");
    println!("  4. Run: examforge render --test {SAMPLE_TEST_FILE} --output worksheet.html");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examforge configuration

default_provider = "openai"
# knowledge_base = "curricula/"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"

[providers.offline]
type = "mock"

[models]
text = "gpt-4.1-mini"
image = "gpt-image-1"
image_edit = "gpt-image-1"
speech = "gpt-4o-mini-tts"
transcription = "gpt-4o-audio-preview"

[storage]
documents_dir = "./examforge-data/tests"
blobs_dir = "./examforge-data/blobs"
# public_base_url = "https://cdn.example.com/examforge"
prune_orphans_on_save = false
"#;

const SAMPLE_TEST: &str = r#"{
  "title": "Unit 1: School",
  "curriculumId": "i-learn-smart-start-5",
  "knowledgeUnitId": "unit1",
  "timeLimit": 40,
  "stats": { "totalQuestions": 7, "totalScore": 1.75, "totalParts": 3 },
  "sections": [
    { "id": "listening", "title": "Listening", "parts": [] },
    {
      "id": "reading",
      "title": "Reading",
      "parts": [
        {
          "id": 1,
          "title": "Part 1: Read and answer the questions.",
          "passage": "Hi, I'm Minh. I'm in grade five. My favorite subject is science because I like doing experiments. I usually use computers in I.T. class. My English class starts at eight o'clock.",
          "questions": [
            {
              "id": 2,
              "type": "mcq",
              "text": "What grade is Minh in?",
              "isExample": true,
              "options": [
                { "id": 1, "text": "A", "isCorrect": false, "description": "grade four", "imagePrompt": "" },
                { "id": 2, "text": "B", "isCorrect": true, "description": "grade five", "imagePrompt": "" },
                { "id": 3, "text": "C", "isCorrect": false, "description": "grade six", "imagePrompt": "" }
              ]
            },
            {
              "id": 3,
              "type": "mcq",
              "text": "Which subject does Minh like?",
              "options": [
                { "id": 1, "text": "A", "isCorrect": true, "description": "science", "imagePrompt": "" },
                { "id": 2, "text": "B", "isCorrect": false, "description": "history", "imagePrompt": "" },
                { "id": 3, "text": "C", "isCorrect": false, "description": "geography", "imagePrompt": "" }
              ]
            },
            { "id": 4, "type": "true-false", "text": "Minh's English class starts at nine o'clock.", "isTrue": false },
            { "id": 5, "type": "fib", "text": "Minh usually uses ___ in I.T. class.", "answer": "computers" }
          ]
        }
      ]
    },
    {
      "id": "writing",
      "title": "Writing",
      "parts": [
        {
          "id": 6,
          "title": "Part 2: Write the words.",
          "questions": [
            {
              "id": 7,
              "type": "writing-order-words",
              "answer": "I like solving problems.",
              "disorderedWords": "solving / I / problems / like"
            },
            {
              "id": 8,
              "type": "writing-fill-in-word",
              "text": "Look at the pictures and write the subjects.",
              "subQuestions": [
                { "id": 9, "text": "We learn about maps in ____.", "answer": "geography" },
                { "id": 10, "text": "We learn about the past in ____.", "answer": "history" }
              ],
              "images": [{ "id": 9 }, { "id": 10 }]
            }
          ]
        }
      ]
    },
    {
      "id": "speaking",
      "title": "Speaking",
      "parts": [
        {
          "id": 11,
          "title": "Part 3: Answer the question.",
          "questions": [
            {
              "id": 12,
              "type": "speaking-qa",
              "text": "Which subject do you like? Why?",
              "referenceAnswer": "I like science because I like doing experiments."
            }
          ]
        }
      ]
    }
  ]
}
"#;

#[cfg(test)]
mod tests {
    use examforge_core::parser::parse_test_str;
    use examforge_core::validate::validate_test;

    use super::*;

    #[test]
    fn sample_test_is_valid() {
        let test = parse_test_str(SAMPLE_TEST, "sample").unwrap();
        assert!(validate_test(&test, true).is_empty());
        assert_eq!(test.stats.total_questions, 7);
    }

    #[test]
    fn sample_config_parses() {
        let config: crate::config::ExamforgeConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.providers.len(), 2);
        assert!(!config.storage.prune_orphans_on_save);
    }
}

use anyhow::Result;
use tracing::instrument;

use examforge_core::error::ProviderError;
use examforge_core::flows::{PassageRequest, PassageResponse};
use examforge_core::traits::TextRequest;

use super::{prompt_list, ContentFlows};

const PASSAGE_CONTEXT: &str = "\
You write reading passages for Vietnamese primary school students learning English \
(CEFR A1/A2) with the \"Tiếng Anh 5 i-Learn Smart Start\" curriculum.
Write one engaging passage in simple, clear English, in the first person, narrated by a \
child with a Vietnamese name (for example Hoa, Linh, Minh or An).

Rules:
1. Use mainly the vocabulary and sentence patterns of the knowledge base below.
2. Build the theme around the current unit's vocabulary and sentence patterns.
3. Words and patterns from earlier units may support the text but must not be its focus.
4. Weave the topic into the unit's theme.
5. Keep a friendly, personal tone.

Example (unit: Health, topic: staying fit):
Hi, I'm Hoa. Last week in our P.E. class, we learned how to stay fit and strong. Our \
teacher said we should play outside for one hour a day. We shouldn't sit too long \
because it's not healthy. Now I try to move more, eat better, and sleep early.

Reply with the passage text only.";

impl ContentFlows {
    /// Generate a reading passage for a topic, optionally constrained to a
    /// curriculum unit.
    #[instrument(skip(self, request), fields(topic = %request.topic))]
    pub async fn generate_passage(&self, request: &PassageRequest) -> Result<PassageResponse> {
        let word_count = format!("about {} words", request.length.word_target());
        let constraints = match &request.knowledge {
            Some(knowledge) => format!(
                "Knowledge base constraints:\n\
                 - Curriculum unit: {}\n\
                 - Topic to integrate: {}\n\
                 - Length: {word_count}\n\n\
                 Current unit focus (primary):\n\
                 - Vocabulary to emphasize: {}\n\
                 - Sentence patterns to use: {}\n\n\
                 Cumulative knowledge (supporting context only):\n\
                 - Allowed vocabulary: {}\n\
                 - Allowed sentence patterns: {}",
                knowledge.unit_title,
                request.topic,
                prompt_list(&knowledge.current_unit_vocabulary, ", "),
                prompt_list(&knowledge.current_unit_sentence_patterns, "; "),
                prompt_list(&knowledge.vocabulary, ", "),
                prompt_list(&knowledge.sentence_patterns, "; "),
            ),
            None => format!(
                "Write a new passage with these requirements:\n\
                 - Topic: {}\n\
                 - Length: {word_count}",
                request.topic
            ),
        };

        let prompt = format!("{PASSAGE_CONTEXT}\n\n{constraints}");
        let response = self
            .provider
            .generate_text(&TextRequest::new(&self.models.text, prompt))
            .await?;

        let passage = response.content.trim().to_string();
        if passage.is_empty() {
            return Err(ProviderError::EmptyOutput("empty passage".into()).into());
        }
        tracing::debug!(words = passage.split_whitespace().count(), "passage generated");
        Ok(PassageResponse { passage })
    }
}

#[cfg(test)]
mod tests {
    use examforge_core::flows::{PassageKnowledge, PassageLength};

    use super::super::test_support::flows_with;
    use super::*;

    #[tokio::test]
    async fn unconstrained_passage() {
        let (flows, provider) = flows_with(&[("Topic: family", "  My name is Linh.  ")]);
        let response = flows
            .generate_passage(&PassageRequest {
                topic: "family".into(),
                length: PassageLength::Medium,
                knowledge: None,
            })
            .await
            .unwrap();
        assert_eq!(response.passage, "My name is Linh.");

        let request = provider.last_text_request().unwrap();
        assert!(request.prompt.contains("about 150 words"));
        assert!(!request.json_output);
    }

    #[tokio::test]
    async fn knowledge_is_spelled_out() {
        let (flows, provider) = flows_with(&[("Curriculum unit", "I like science.")]);
        flows
            .generate_passage(&PassageRequest {
                topic: "my school".into(),
                length: PassageLength::Short,
                knowledge: Some(PassageKnowledge {
                    unit_title: "Unit 1: SCHOOL".into(),
                    vocabulary: vec!["math".into(), "science".into()],
                    sentence_patterns: vec![],
                    current_unit_vocabulary: vec!["science".into()],
                    current_unit_sentence_patterns: vec!["I like ___.".into()],
                }),
            })
            .await
            .unwrap();

        let prompt = provider.last_text_request().unwrap().prompt;
        assert!(prompt.contains("Curriculum unit: Unit 1: SCHOOL"));
        assert!(prompt.contains("Allowed vocabulary: math, science"));
        assert!(prompt.contains("Allowed sentence patterns: (none)"));
        assert!(prompt.contains("about 100 words"));
    }

    #[tokio::test]
    async fn blank_output_is_an_error() {
        let (flows, _) = flows_with(&[("Topic", "   ")]);
        let err = flows
            .generate_passage(&PassageRequest {
                topic: "jobs".into(),
                length: PassageLength::Long,
                knowledge: None,
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no usable output"));
    }
}

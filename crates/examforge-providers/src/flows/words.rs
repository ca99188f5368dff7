use anyhow::Result;
use tracing::instrument;

use examforge_core::flows::{ShuffleRequest, ShuffleResponse};
use examforge_core::words::{is_valid_shuffle, shuffle_words};

use super::ContentFlows;

const SHUFFLE_CONTEXT: &str = "\
You scramble the words of an English sentence for a word-order exercise.
Randomize the order of the words and separate them with \" / \".
Leave out the final punctuation mark.

Examples:
- \"I go to school.\" -> \"go / I / school / to\"
- \"What is your name?\" -> \"your / name / What / is\"";

impl ContentFlows {
    /// Scramble a sentence for a writing-order-words question.
    ///
    /// An empty sentence yields an empty result without calling the model.
    /// Model output that is not a permutation of the sentence's words is
    /// replaced by a local shuffle.
    #[instrument(skip(self, request))]
    pub async fn shuffle_words(&self, request: &ShuffleRequest) -> Result<ShuffleResponse> {
        let sentence = request.sentence.trim();
        if sentence.is_empty() {
            return Ok(ShuffleResponse {
                shuffled_sentence: String::new(),
            });
        }

        let prompt = format!(
            "{SHUFFLE_CONTEXT}\n\nSentence:\n---\n{sentence}\n---\n\n\
             Reply with a JSON object of the form {{\"shuffledSentence\": \"...\"}}."
        );
        let response: ShuffleResponse = self.complete_json(prompt, "shuffled sentence").await?;
        if is_valid_shuffle(sentence, &response.shuffled_sentence) {
            return Ok(response);
        }

        tracing::warn!(
            shuffled = %response.shuffled_sentence,
            "model shuffle does not match the sentence, shuffling locally"
        );
        Ok(ShuffleResponse {
            shuffled_sentence: shuffle_words(sentence),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::flows_with;
    use super::*;

    #[tokio::test]
    async fn empty_sentence_skips_the_model() {
        let (flows, provider) = flows_with(&[]);
        let response = flows
            .shuffle_words(&ShuffleRequest {
                sentence: "   ".into(),
            })
            .await
            .unwrap();
        assert_eq!(response.shuffled_sentence, "");
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn valid_model_shuffle_is_kept() {
        let (flows, _) = flows_with(&[(
            "I go to school.",
            r#"{"shuffledSentence": "school / I / to / go"}"#,
        )]);
        let response = flows
            .shuffle_words(&ShuffleRequest {
                sentence: "I go to school.".into(),
            })
            .await
            .unwrap();
        assert_eq!(response.shuffled_sentence, "school / I / to / go");
    }

    #[tokio::test]
    async fn model_shuffle_ending_in_comma_word_is_kept() {
        let (flows, _) = flows_with(&[("Yes, I do.", r#"{"shuffledSentence": "I / do / Yes,"}"#)]);
        let response = flows
            .shuffle_words(&ShuffleRequest {
                sentence: "Yes, I do.".into(),
            })
            .await
            .unwrap();
        assert_eq!(response.shuffled_sentence, "I / do / Yes,");
    }

    #[tokio::test]
    async fn invalid_model_shuffle_falls_back() {
        let (flows, _) = flows_with(&[(
            "She reads books.",
            r#"{"shuffledSentence": "books / reads / He."}"#,
        )]);
        let response = flows
            .shuffle_words(&ShuffleRequest {
                sentence: "She reads books.".into(),
            })
            .await
            .unwrap();
        assert!(is_valid_shuffle("She reads books.", &response.shuffled_sentence));
    }
}

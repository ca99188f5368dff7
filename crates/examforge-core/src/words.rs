//! Sentence tokenizing and word-order scrambling for writing-order-words
//! questions.

use rand::seq::SliceRandom;
use rand::Rng;

/// Separator between tokens of a scrambled sentence.
pub const TOKEN_SEPARATOR: &str = " / ";

const FINAL_PUNCTUATION: &[char] = &['.', '!', '?', ',', ';', ':'];

/// Split a sentence into its word tokens, dropping final punctuation.
pub fn tokenize(sentence: &str) -> Vec<&str> {
    sentence
        .trim()
        .trim_end_matches(FINAL_PUNCTUATION)
        .split_whitespace()
        .collect()
}

/// Scramble the tokens of `sentence` with `rng` and join them with " / ".
///
/// Retries a few times to avoid returning the original order when the
/// sentence has at least two distinct tokens.
pub fn shuffle_words_with<R: Rng + ?Sized>(sentence: &str, rng: &mut R) -> String {
    let original = tokenize(sentence);
    let mut tokens = original.clone();
    let distinct = original.windows(2).any(|w| w[0] != w[1]);
    for _ in 0..8 {
        tokens.shuffle(rng);
        if !distinct || tokens != original {
            break;
        }
    }
    tokens.join(TOKEN_SEPARATOR)
}

/// Scramble with the thread-local generator.
pub fn shuffle_words(sentence: &str) -> String {
    shuffle_words_with(sentence, &mut rand::thread_rng())
}

/// Whether `shuffled` is a permutation of exactly the tokens of `sentence`,
/// separated by slashes.
///
/// Internal punctuation stays attached to its word ("Yes," may land last);
/// the sentence's final punctuation must not reappear on any token.
pub fn is_valid_shuffle(sentence: &str, shuffled: &str) -> bool {
    let mut expected = tokenize(sentence);
    let mut actual: Vec<&str> = if shuffled.trim().is_empty() {
        Vec::new()
    } else {
        shuffled.split('/').map(str::trim).collect()
    };
    expected.sort_unstable();
    actual.sort_unstable();
    expected == actual
}

use regex::Regex;

use model::Document;

/// Text normalization as the readers and enrichers see it: whole-text
/// cleanup before segmentation, per-word normalization after it, and a
/// best-effort way back from tokens to plaintext.
pub trait Normalizer {
    fn normalize(&self, text: &str) -> String;

    fn normalize_word(&self, word: &str) -> String;

    /// Reconstructs plaintext from the token stream.
    fn revert(&self, document: &Document) -> String;
}

pub struct DefaultNormalizer {
    whitespace: Regex,
}

impl DefaultNormalizer {
    pub fn new() -> Self {
        Self {
            whitespace: Regex::new(r"\s+").unwrap(),
        }
    }
}

impl Default for DefaultNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for DefaultNormalizer {
    fn normalize(&self, text: &str) -> String {
        self.whitespace.replace_all(text.trim(), " ").into_owned()
    }

    fn normalize_word(&self, word: &str) -> String {
        word.trim().to_lowercase()
    }

    fn revert(&self, document: &Document) -> String {
        document.words().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{Sentence, Word};

    #[test]
    fn collapses_whitespace() {
        let normalizer = DefaultNormalizer::new();
        assert_eq!(normalizer.normalize("  a\n b\t\tc "), "a b c");
    }

    #[test]
    fn lowercases_words() {
        let normalizer = DefaultNormalizer::new();
        assert_eq!(normalizer.normalize_word(" Corporation "), "corporation");
    }

    #[test]
    fn revert_joins_token_text() {
        let doc = Document::new(vec![Sentence::new(
            0,
            vec![Word::new(0, "Hello", "hello"), Word::new(1, "world", "world")],
        )]);
        assert_eq!(DefaultNormalizer::new().revert(&doc), "Hello world");
    }
}

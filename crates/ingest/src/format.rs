use anyhow::Result;
use unicode_segmentation::UnicodeSegmentation;

use model::{Document, Sentence, Word};

use crate::normalize::Normalizer;
use crate::FormatReader;

/// Segments plain text into sentences and words. Word splitting keeps
/// punctuation as its own tokens; downstream stages expect to see commas and
/// periods as words.
pub struct RawTextReader {
    normalizer: Box<dyn Normalizer>,
    keep_original_text: bool,
}

impl RawTextReader {
    pub fn new(normalizer: Box<dyn Normalizer>, keep_original_text: bool) -> Self {
        Self { normalizer, keep_original_text }
    }
}

impl FormatReader for RawTextReader {
    fn create_doc(&self, raw: &str) -> Result<Document> {
        let text = self.normalizer.normalize(raw);

        let sentences = text
            .unicode_sentences()
            .enumerate()
            .map(|(index, sentence)| {
                let words = sentence
                    .split_word_bounds()
                    .filter(|token| !token.trim().is_empty())
                    .enumerate()
                    .map(|(position, token)| {
                        Word::new(position, token, self.normalizer.normalize_word(token))
                    })
                    .collect();
                Sentence::new(index, words)
            })
            .collect();

        let mut doc = Document::new(sentences);
        if self.keep_original_text {
            doc.set_text(text);
        } else {
            let reverted = self.normalizer.revert(&doc);
            doc.set_text(reverted);
        }
        Ok(doc)
    }
}

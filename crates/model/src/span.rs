use serde::Serialize;

/// Position of a span within its document: a word range inside one sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WordRange {
    pub sentence: usize,
    pub start: usize,
    pub end: usize,
}

/// A text fragment produced by extraction that may or may not have been
/// aligned to concrete tokens. `words` stays `None` until something manages
/// to anchor the fragment in the document.
#[derive(Debug, Clone, Serialize)]
pub struct MaybeSpan {
    pub text: String,
    pub words: Option<WordRange>,
    pub embedding: Option<Vec<f32>>,
}

impl MaybeSpan {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            words: None,
            embedding: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.words.is_some()
    }
}

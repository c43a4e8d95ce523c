use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::fact::FactStore;
use crate::language::LanguageTag;

#[derive(Debug, Clone, Serialize)]
pub struct Word {
    /// Position within the owning sentence, in original token order.
    pub index: usize,
    pub text: String,
    pub normalized: String,
    pub pos_tag: Option<String>,
    pub embedding: Option<Vec<f32>>,
}

impl Word {
    pub fn new(index: usize, text: impl Into<String>, normalized: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            normalized: normalized.into(),
            pos_tag: None,
            embedding: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Sentence {
    pub index: usize,
    pub words: Vec<Word>,
}

impl Sentence {
    pub fn new(index: usize, words: Vec<Word>) -> Self {
        Self { index, words }
    }

    pub fn text(&self) -> String {
        self.words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ")
    }
}

/// One unit of input text, segmented into sentences and words, annotated in
/// place by the enrichment stages. Documents exclusively own their sentences
/// and facts; no stage removes structure, it only attaches to it.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: Uuid,
    pub name: Option<String>,
    pub language: Option<LanguageTag>,
    pub genre: Option<String>,
    /// Static metadata outside the declared fields.
    pub tags: BTreeMap<String, String>,
    pub sentences: Vec<Sentence>,
    pub facts: FactStore,
    text: Option<String>,
}

impl Document {
    pub fn new(sentences: Vec<Sentence>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: None,
            language: None,
            genre: None,
            tags: BTreeMap::new(),
            sentences,
            facts: FactStore::default(),
            text: None,
        }
    }

    /// The originating plaintext, when the reader chose to retain it.
    pub fn plaintext(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.sentences.iter().flat_map(|s| s.words.iter())
    }
}

use std::collections::BTreeMap;

use anyhow::Result;
use tracing::warn;

use model::{Document, LanguageSet};

use crate::Enricher;

/// Stamps the same static metadata onto every document passing through:
/// language and genre go to their declared fields, anything else lands in
/// the document's free-form tag map.
pub struct StaticEnricher {
    meta_tags: BTreeMap<String, String>,
    languages: LanguageSet,
}

impl StaticEnricher {
    pub fn new(meta_tags: BTreeMap<String, String>, languages: LanguageSet) -> Self {
        Self { meta_tags, languages }
    }
}

impl Enricher for StaticEnricher {
    fn enrich(&mut self, document: &mut Document) -> Result<()> {
        for (key, value) in &self.meta_tags {
            match key.as_str() {
                "language" => document.language = Some(self.languages.from_code(value)),
                "genre" => document.genre = Some(value.clone()),
                other => {
                    warn!(attribute = other, "setting a tag the document model does not declare");
                    document.tags.insert(other.to_string(), value.clone());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enricher() -> StaticEnricher {
        let mut tags = BTreeMap::new();
        tags.insert("language".to_string(), "en".to_string());
        tags.insert("genre".to_string(), "factoid".to_string());
        tags.insert("marco".to_string(), "polo".to_string());
        let languages =
            LanguageSet::from_pairs(vec![("English".to_string(), "en".to_string())]);
        StaticEnricher::new(tags, languages)
    }

    #[test]
    fn declared_fields_and_free_tags_are_set() {
        let mut document = Document::new(Vec::new());
        enricher().enrich(&mut document).unwrap();

        assert_eq!(document.language.as_ref().unwrap().name, "English");
        assert_eq!(document.genre.as_deref(), Some("factoid"));
        assert_eq!(document.tags.get("marco").map(String::as_str), Some("polo"));
    }

    #[test]
    fn undeclared_language_codes_become_unknown() {
        let mut tags = BTreeMap::new();
        tags.insert("language".to_string(), "xx".to_string());
        let mut enricher = StaticEnricher::new(tags, LanguageSet::default());

        let mut document = Document::new(Vec::new());
        enricher.enrich(&mut document).unwrap();
        assert_eq!(document.language.as_ref().unwrap().code, "unk");
    }
}

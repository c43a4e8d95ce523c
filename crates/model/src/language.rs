use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageTag {
    pub name: String,
    pub code: String,
}

/// The set of languages a deployment declares in its configuration. Codes
/// that are not declared resolve to the unknown tag rather than failing;
/// language is descriptive metadata, not a constraint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LanguageSet {
    tags: Vec<LanguageTag>,
}

impl LanguageSet {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            tags: pairs
                .into_iter()
                .map(|(name, code)| LanguageTag { name, code: code.to_ascii_lowercase() })
                .collect(),
        }
    }

    pub fn unknown() -> LanguageTag {
        LanguageTag { name: "Unknown".to_string(), code: "unk".to_string() }
    }

    pub fn from_code(&self, code: &str) -> LanguageTag {
        let code = code.to_ascii_lowercase();
        self.tags
            .iter()
            .find(|t| t.code == code)
            .cloned()
            .unwrap_or_else(Self::unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> LanguageSet {
        LanguageSet::from_pairs(vec![
            ("English".to_string(), "en".to_string()),
            ("German".to_string(), "de".to_string()),
        ])
    }

    #[test]
    fn declared_codes_resolve() {
        let tag = set().from_code("EN");
        assert_eq!(tag.name, "English");
        assert_eq!(tag.code, "en");
    }

    #[test]
    fn undeclared_codes_fall_back_to_unknown() {
        assert_eq!(set().from_code("xx"), LanguageSet::unknown());
    }
}

//! The user-facing facade: named pipelines from one configuration file, a
//! growing document collection, views over it and relatedness ranking.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use assemble::{Overrides, Pipeline, PipelineConfig, Registry, SpecOr};
use enrich::{sort_by_relatedness, RelatednessRanker};
use model::{Document, LanguageSet};
use view::{NodeRef, NodeType, View, ViewError};

/// Top-level configuration: the declared languages, an optional relatedness
/// comparator spec and the named pipeline configurations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkbenchConfig {
    #[serde(default)]
    pub languages: BTreeMap<String, String>,
    #[serde(default)]
    pub relatedness: Option<Value>,
    #[serde(default)]
    pub pipelines: BTreeMap<String, PipelineConfig>,
}

impl WorkbenchConfig {
    /// Reads a JSON configuration file, falling back to the empty default
    /// when the file does not exist.
    pub fn from_file(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse configuration: {}", path.display())),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "configuration not found; using defaults");
                Ok(Self::default())
            }
            Err(err) => Err(err)
                .with_context(|| format!("failed to read configuration: {}", path.display())),
        }
    }
}

pub struct Workbench {
    config: WorkbenchConfig,
    documents: Vec<Document>,
    pipelines: HashMap<String, Pipeline>,
    languages: LanguageSet,
    relatedness: Option<Box<dyn RelatednessRanker>>,
}

impl Workbench {
    pub fn new(config: WorkbenchConfig) -> Result<Self> {
        let languages = LanguageSet::from_pairs(config.languages.clone());

        let relatedness = match &config.relatedness {
            Some(spec) => {
                let registry = Registry::with_builtins();
                Some(registry.comparator(SpecOr::Spec(spec.clone()))?)
            }
            None => None,
        };

        let pipelines = config
            .pipelines
            .iter()
            .map(|(name, pipeline_config)| {
                (
                    name.clone(),
                    Pipeline::from_config(pipeline_config.clone(), Registry::with_builtins()),
                )
            })
            .collect();

        Ok(Self { config, documents: Vec::new(), pipelines, languages, relatedness })
    }

    pub fn available_pipelines(&self) -> impl Iterator<Item = &str> {
        self.pipelines.keys().map(String::as_str)
    }

    pub fn pipeline_mut(&mut self, name: &str) -> Option<&mut Pipeline> {
        self.pipelines.get_mut(name)
    }

    /// Rebuilds a pipeline from its configuration, so it can be assembled
    /// again with different arguments.
    pub fn reset_pipeline(&mut self, name: &str) -> Result<&mut Pipeline> {
        let pipeline_config = self
            .config
            .pipelines
            .get(name)
            .with_context(|| format!("no pipeline configured under `{name}`"))?;
        self.pipelines.insert(
            name.to_string(),
            Pipeline::from_config(pipeline_config.clone(), Registry::with_builtins()),
        );
        self.pipelines.get_mut(name).context("pipeline was just inserted")
    }

    /// Runs a named pipeline over a location, assembling it first (without
    /// arguments) when needed, and keeps the produced documents.
    pub fn run_pipeline(&mut self, name: &str, location: &Path) -> Result<usize> {
        let pipeline = self
            .pipelines
            .get_mut(name)
            .with_context(|| format!("no pipeline configured under `{name}`"))?;
        if !pipeline.is_assembled() {
            pipeline.assemble(Overrides::None)?;
        }
        let documents = pipeline.load(location)?;
        let count = documents.len();
        info!(pipeline = name, documents = count, "pipeline finished");
        self.documents.extend(documents);
        Ok(count)
    }

    pub fn add_documents(&mut self, documents: impl IntoIterator<Item = Document>) {
        self.documents.extend(documents);
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn languages(&self) -> &LanguageSet {
        &self.languages
    }

    /// A view over the whole document collection.
    pub fn docs(&self) -> View<'_> {
        View::new(self.documents.iter().map(NodeRef::Document).collect())
    }

    /// A view of `target`-typed nodes drawn from every document.
    pub fn view_of(&self, target: NodeType) -> Result<View<'_>, ViewError> {
        let documents: Vec<NodeRef<'_>> =
            self.documents.iter().map(NodeRef::Document).collect();
        view::create_from(&documents, target)
    }

    /// Orders items by relatedness to a reference string via the configured
    /// comparator service.
    pub fn rank_by_relatedness<T>(
        &self,
        compare_with: &str,
        items: Vec<T>,
        text_of: impl Fn(&T) -> String,
    ) -> Result<Vec<T>> {
        let ranker = self
            .relatedness
            .as_deref()
            .context("no relatedness comparator configured")?;
        sort_by_relatedness(ranker, compare_with, items, text_of)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{Sentence, Word};
    use serde_json::json;

    fn config() -> WorkbenchConfig {
        serde_json::from_value(json!({
            "languages": {"English": "en"},
            "pipelines": {
                "plain": {
                    "source_reader": "FileSource",
                    "format_reader": "RawTextReader"
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn missing_configuration_files_yield_defaults() {
        let config = WorkbenchConfig::from_file(Path::new("/definitely/not/there.json")).unwrap();
        assert!(config.pipelines.is_empty());
    }

    #[test]
    fn pipelines_come_from_configuration() {
        let workbench = Workbench::new(config()).unwrap();
        let names: Vec<&str> = workbench.available_pipelines().collect();
        assert_eq!(names, vec!["plain"]);
    }

    #[test]
    fn unknown_pipelines_are_an_error() {
        let mut workbench = Workbench::new(config()).unwrap();
        assert!(workbench.run_pipeline("nope", Path::new("anywhere")).is_err());
    }

    #[test]
    fn reset_replaces_an_assembled_pipeline() {
        let mut workbench = Workbench::new(config()).unwrap();
        workbench.pipeline_mut("plain").unwrap().assemble(Overrides::None).unwrap();
        assert!(workbench.pipeline_mut("plain").unwrap().is_assembled());

        let fresh = workbench.reset_pipeline("plain").unwrap();
        assert!(!fresh.is_assembled());
    }

    #[test]
    fn docs_view_covers_the_collection() {
        let mut workbench = Workbench::new(WorkbenchConfig::default()).unwrap();
        workbench.add_documents(vec![
            Document::new(vec![Sentence::new(0, vec![Word::new(0, "a", "a")])]),
            Document::new(Vec::new()),
        ]);

        assert_eq!(workbench.docs().len(), 2);
        let words = workbench.view_of(NodeType::Word).unwrap();
        assert_eq!(words.len(), 1);
    }

    #[test]
    fn ranking_without_a_comparator_is_an_error() {
        let workbench = Workbench::new(WorkbenchConfig::default()).unwrap();
        assert!(workbench
            .rank_by_relatedness("x", vec!["a".to_string()], |s| s.clone())
            .is_err());
    }
}

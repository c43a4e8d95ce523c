use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use enrich::Enricher;
use ingest::{FormatReader, SourceReader};
use model::Document;

use crate::args::{bind, spec_parts, ArgPayload};
use crate::error::AssemblyError;
use crate::registry::{Component, ComponentEntry, ComponentKind, Registry};

/// Declarative pipeline description: one source reader, one format reader
/// and an ordered list of enrichers, each given as a component spec.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub source_reader: Value,
    pub format_reader: Value,
    #[serde(default)]
    pub enrichers: Vec<Value>,
}

/// Arguments supplied at assembly time, on top of the configured ones.
pub enum Overrides {
    None,
    /// Parameter name → value. Only valid while no parameter name is shared
    /// between components; each key is routed to the component declaring it.
    Flat(Map<String, Value>),
    /// Component name → parameter map. Required once names collide, and the
    /// only way to address every instance of a component explicitly.
    ByComponent(BTreeMap<String, Map<String, Value>>),
}

enum PipelineSource {
    Config(PipelineConfig),
    Registered { source: String, format: String, enrichers: Vec<String> },
    Instances,
}

/// A read → parse → enrich chain. Built unassembled from configuration or
/// registered names, or already assembled from live instances; the
/// transition to assembled happens at most once.
pub struct Pipeline {
    registry: Registry,
    source: PipelineSource,
    assembled: bool,
    source_reader: Option<Box<dyn SourceReader>>,
    format_reader: Option<Box<dyn FormatReader>>,
    enrichers: Vec<Box<dyn Enricher>>,
}

impl Pipeline {
    pub fn from_config(config: PipelineConfig, registry: Registry) -> Self {
        Self {
            registry,
            source: PipelineSource::Config(config),
            assembled: false,
            source_reader: None,
            format_reader: None,
            enrichers: Vec::new(),
        }
    }

    /// A pipeline over live instances is assembled from the start; assembly
    /// and resolution are skipped entirely.
    pub fn from_instances(
        source_reader: Box<dyn SourceReader>,
        format_reader: Box<dyn FormatReader>,
        enrichers: Vec<Box<dyn Enricher>>,
    ) -> Self {
        Self {
            registry: Registry::new(),
            source: PipelineSource::Instances,
            assembled: true,
            source_reader: Some(source_reader),
            format_reader: Some(format_reader),
            enrichers,
        }
    }

    /// A pipeline over registered component names. Construction arguments
    /// are not configured anywhere, so assembly demands them per component.
    pub fn from_registered(
        source: &str,
        format: &str,
        enrichers: &[&str],
        registry: Registry,
    ) -> Self {
        Self {
            registry,
            source: PipelineSource::Registered {
                source: source.to_string(),
                format: format.to_string(),
                enrichers: enrichers.iter().map(|e| e.to_string()).collect(),
            },
            assembled: false,
            source_reader: None,
            format_reader: None,
            enrichers: Vec::new(),
        }
    }

    pub fn is_assembled(&self) -> bool {
        self.assembled
    }

    /// Resolves every declared component, routes overrides and constructs
    /// the chain. Per component, overrides win over configured arguments.
    pub fn assemble(&mut self, overrides: Overrides) -> Result<(), AssemblyError> {
        if self.assembled {
            return Err(AssemblyError::AlreadyAssembled);
        }

        let mut entries: Vec<(&ComponentEntry, ArgPayload)> = Vec::new();
        match &self.source {
            PipelineSource::Config(config) => {
                let (name, payload) = spec_parts(&config.source_reader)?;
                entries.push((
                    self.registry.resolve(&name, &[ComponentKind::Source], &["ingest"])?,
                    payload,
                ));

                let (name, payload) = spec_parts(&config.format_reader)?;
                entries.push((
                    self.registry.resolve(&name, &[ComponentKind::Format], &["ingest"])?,
                    payload,
                ));

                for spec in &config.enrichers {
                    let (name, payload) = spec_parts(spec)?;
                    entries.push((
                        self.registry.resolve(&name, &[ComponentKind::Enricher], &["enrich"])?,
                        payload,
                    ));
                }
            }
            PipelineSource::Registered { source, format, enrichers } => {
                if !matches!(&overrides, Overrides::ByComponent(_)) {
                    return Err(AssemblyError::ConfigurationFormat(
                        "pipelines built from registered names carry no configured arguments; \
                         supply per-component override maps"
                            .to_string(),
                    ));
                }
                entries.push((
                    self.registry.resolve(source, &[ComponentKind::Source], &["ingest"])?,
                    ArgPayload::empty(),
                ));
                entries.push((
                    self.registry.resolve(format, &[ComponentKind::Format], &["ingest"])?,
                    ArgPayload::empty(),
                ));
                for name in enrichers {
                    entries.push((
                        self.registry.resolve(name, &[ComponentKind::Enricher], &["enrich"])?,
                        ArgPayload::empty(),
                    ));
                }
            }
            // live instances start out assembled, so this cannot be reached
            PipelineSource::Instances => return Err(AssemblyError::AlreadyAssembled),
        }

        // record which component declared which parameter name; the first
        // reappearing name disables flat overrides for good
        let mut param_owner: HashMap<&'static str, &'static str> = HashMap::new();
        let mut no_clashes = true;
        for (entry, _) in &entries {
            let clash = entry.params.iter().any(|p| param_owner.contains_key(p));
            no_clashes = no_clashes && !clash;
            if no_clashes {
                for param in entry.params {
                    param_owner.insert(*param, entry.name);
                }
            } else {
                debug!(component = entry.name, "parameter names collide; flat overrides disabled");
            }
        }

        let mut routed: HashMap<&'static str, Map<String, Value>> = HashMap::new();
        match &overrides {
            Overrides::None => {}
            Overrides::Flat(map) => {
                if !no_clashes {
                    return Err(AssemblyError::ConfigurationFormat(
                        "flat overrides are ambiguous because components share parameter names; \
                         key overrides by component instead"
                            .to_string(),
                    ));
                }
                for (key, value) in map {
                    let Some(owner) = param_owner.get(key.as_str()) else {
                        return Err(AssemblyError::OverrideRouting { name: key.clone() });
                    };
                    routed.entry(*owner).or_default().insert(key.clone(), value.clone());
                }
            }
            Overrides::ByComponent(map) => {
                for (component, params) in map {
                    let Some(canonical) = entries
                        .iter()
                        .map(|(entry, _)| entry.name)
                        .find(|name| {
                            *name == component.as_str() || name.ends_with(&format!(".{component}"))
                        })
                    else {
                        return Err(AssemblyError::Resolution { name: component.clone() });
                    };
                    routed.entry(canonical).or_default().extend(params.clone());
                }
            }
        }

        let mut components = Vec::with_capacity(entries.len());
        for (entry, payload) in &entries {
            let mut bound = bind(entry.name, entry.params, payload)?;
            if let Some(extra) = routed.get(entry.name) {
                for (key, value) in extra {
                    if !entry.params.contains(&key.as_str()) {
                        return Err(AssemblyError::UnknownParameter {
                            component: entry.name.to_string(),
                            name: key.clone(),
                        });
                    }
                    bound.insert(key, value.clone());
                }
            }
            components.push(self.registry.build(entry, &bound)?);
        }

        for (position, component) in components.into_iter().enumerate() {
            match (position, component) {
                (0, Component::Source(source)) => self.source_reader = Some(source),
                (1, Component::Format(format)) => self.format_reader = Some(format),
                (_, Component::Enricher(enricher)) => self.enrichers.push(enricher),
                (position, other) => {
                    return Err(AssemblyError::TypeConstraint {
                        name: format!("component #{position}"),
                        found: other.kind().as_str(),
                        expected: "the declared pipeline slot".to_string(),
                    })
                }
            }
        }

        self.assembled = true;
        Ok(())
    }

    /// Loads raw resources, parses them into documents and runs every
    /// enricher over every document in declared order. Enricher failures
    /// propagate; the produced documents belong to the caller.
    pub fn load(&mut self, location: &Path) -> Result<Vec<Document>, AssemblyError> {
        if !self.assembled {
            return Err(AssemblyError::NotAssembled);
        }
        let (Some(source), Some(format)) = (&self.source_reader, &self.format_reader) else {
            return Err(AssemblyError::NotAssembled);
        };

        let resources = source.load(location)?;
        let mut documents = format.read_resource(&resources)?;
        debug!(documents = documents.len(), "running enrichment chain");
        for document in &mut documents {
            for enricher in &mut self.enrichers {
                enricher.enrich(document)?;
            }
        }
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use ingest::{DefaultNormalizer, RawTextReader};
    use serde_json::json;

    fn reading_config() -> PipelineConfig {
        serde_json::from_value(json!({
            "source_reader": {"class": "FileSource", "args": {"ending": ".txt"}},
            "format_reader": {"class": "RawTextReader", "args": {"keep_original_text": true}},
            "enrichers": []
        }))
        .unwrap()
    }

    fn colliding_config() -> PipelineConfig {
        // both enrichers declare `embedding_provider` and `random_seed`
        serde_json::from_value(json!({
            "source_reader": "FileSource",
            "format_reader": "RawTextReader",
            "enrichers": [
                {"class": "EmbeddingEnricher",
                 "args": {"embedding_provider": "SemanticsClient"}},
                {"class": "FactEmbeddingEnricher",
                 "args": {"embedding_provider": "SemanticsClient"}}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn load_before_assemble_fails() {
        let mut pipeline = Pipeline::from_config(reading_config(), Registry::with_builtins());
        assert!(matches!(
            pipeline.load(Path::new("anywhere")),
            Err(AssemblyError::NotAssembled)
        ));
    }

    #[test]
    fn assembling_twice_fails() {
        let mut pipeline = Pipeline::from_config(reading_config(), Registry::with_builtins());
        pipeline.assemble(Overrides::None).unwrap();
        assert!(matches!(
            pipeline.assemble(Overrides::None),
            Err(AssemblyError::AlreadyAssembled)
        ));
    }

    #[test]
    fn instance_pipelines_start_out_assembled() {
        let mut pipeline = Pipeline::from_instances(
            Box::new(EchoSource("irrelevant".to_string())),
            Box::new(RawTextReader::new(Box::new(DefaultNormalizer::new()), true)),
            Vec::new(),
        );
        assert!(pipeline.is_assembled());
        assert!(matches!(
            pipeline.assemble(Overrides::None),
            Err(AssemblyError::AlreadyAssembled)
        ));
    }

    #[test]
    fn flat_overrides_route_to_the_declaring_component() {
        let mut pipeline = Pipeline::from_config(reading_config(), Registry::with_builtins());
        let mut flat = Map::new();
        flat.insert("ending".to_string(), json!(".md"));
        pipeline.assemble(Overrides::Flat(flat)).unwrap();
    }

    #[test]
    fn unknown_flat_overrides_are_rejected() {
        let mut pipeline = Pipeline::from_config(reading_config(), Registry::with_builtins());
        let mut flat = Map::new();
        flat.insert("no_such_parameter".to_string(), json!(1));
        assert!(matches!(
            pipeline.assemble(Overrides::Flat(flat)),
            Err(AssemblyError::OverrideRouting { .. })
        ));
    }

    #[test]
    fn collisions_disable_flat_overrides() {
        let mut pipeline = Pipeline::from_config(colliding_config(), Registry::with_builtins());
        let mut flat = Map::new();
        flat.insert("random_seed".to_string(), json!(42));
        assert!(matches!(
            pipeline.assemble(Overrides::Flat(flat)),
            Err(AssemblyError::ConfigurationFormat(_))
        ));
    }

    #[test]
    fn keyed_overrides_work_despite_collisions() {
        let mut pipeline = Pipeline::from_config(colliding_config(), Registry::with_builtins());
        let mut keyed = BTreeMap::new();
        let mut params = Map::new();
        params.insert("random_seed".to_string(), json!(42));
        keyed.insert("EmbeddingEnricher".to_string(), params);
        pipeline.assemble(Overrides::ByComponent(keyed)).unwrap();
    }

    #[test]
    fn keyed_overrides_reach_only_the_named_component() {
        // `ending` belongs to the source reader; addressing the format
        // reader with it must fail, proving routing honors the key
        let mut pipeline = Pipeline::from_config(reading_config(), Registry::with_builtins());
        let mut keyed = BTreeMap::new();
        let mut params = Map::new();
        params.insert("ending".to_string(), json!(".md"));
        keyed.insert("RawTextReader".to_string(), params);
        assert!(matches!(
            pipeline.assemble(Overrides::ByComponent(keyed)),
            Err(AssemblyError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn keyed_overrides_for_unknown_components_fail() {
        let mut pipeline = Pipeline::from_config(colliding_config(), Registry::with_builtins());
        let mut keyed = BTreeMap::new();
        keyed.insert("NoSuchEnricher".to_string(), Map::new());
        assert!(matches!(
            pipeline.assemble(Overrides::ByComponent(keyed)),
            Err(AssemblyError::Resolution { .. })
        ));
    }

    #[test]
    fn registered_pipelines_demand_per_component_arguments() {
        let mut pipeline = Pipeline::from_registered(
            "FileSource",
            "RawTextReader",
            &[],
            Registry::with_builtins(),
        );
        assert!(matches!(
            pipeline.assemble(Overrides::None),
            Err(AssemblyError::ConfigurationFormat(_))
        ));

        let mut pipeline = Pipeline::from_registered(
            "FileSource",
            "RawTextReader",
            &[],
            Registry::with_builtins(),
        );
        pipeline.assemble(Overrides::ByComponent(BTreeMap::new())).unwrap();
    }

    /// Serves a fixed text for any location.
    struct EchoSource(String);

    impl SourceReader for EchoSource {
        fn load(&self, _location: &Path) -> Result<Vec<String>> {
            Ok(vec![self.0.clone()])
        }
    }

    /// Tags documents with its own position so test assertions can see the
    /// order enrichers ran in.
    struct TraceEnricher(&'static str);

    impl Enricher for TraceEnricher {
        fn enrich(&mut self, document: &mut Document) -> Result<()> {
            let trail = document.tags.remove("trail").unwrap_or_default();
            document.tags.insert("trail".to_string(), format!("{trail}{}", self.0));
            Ok(())
        }
    }

    #[test]
    fn load_parses_and_enriches_in_declared_order() {
        let mut pipeline = Pipeline::from_instances(
            Box::new(EchoSource("Hello, world.".to_string())),
            Box::new(RawTextReader::new(Box::new(DefaultNormalizer::new()), true)),
            vec![Box::new(TraceEnricher("a")), Box::new(TraceEnricher("b"))],
        );

        let documents = pipeline.load(Path::new("ignored")).unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].sentences.len(), 1);
        assert_eq!(documents[0].tags.get("trail").map(String::as_str), Some("ab"));
    }

    /// Fails on sight, to prove enricher errors propagate.
    struct FailingEnricher;

    impl Enricher for FailingEnricher {
        fn enrich(&mut self, _document: &mut Document) -> Result<()> {
            anyhow::bail!("refusing to enrich")
        }
    }

    #[test]
    fn enricher_failures_propagate() {
        let mut pipeline = Pipeline::from_instances(
            Box::new(EchoSource("text".to_string())),
            Box::new(RawTextReader::new(Box::new(DefaultNormalizer::new()), true)),
            vec![Box::new(FailingEnricher)],
        );
        assert!(pipeline.load(Path::new("ignored")).is_err());
    }
}

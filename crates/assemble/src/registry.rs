use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use enrich::{
    EmbeddingEnricher, EmbeddingProvider, Enricher, FactEmbeddingEnricher, RelatednessRanker,
    RelationEnricher, SemanticsClient, StaticEnricher,
};
use ingest::{DefaultNormalizer, FileSource, FormatReader, Normalizer, RawTextReader, SourceReader};
use model::LanguageSet;

use crate::args::{bind, spec_parts, ArgPayload, BoundArgs};
use crate::error::AssemblyError;

/// The extension points components can be plugged into. The set is closed;
/// a component declares at registration which points it can serve, replacing
/// any runtime walk of an implementation hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Source,
    Format,
    Enricher,
    Normalizer,
    Embedding,
    Comparator,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source reader",
            Self::Format => "format reader",
            Self::Enricher => "enricher",
            Self::Normalizer => "normalizer",
            Self::Embedding => "embedding provider",
            Self::Comparator => "relatedness comparator",
        }
    }
}

/// A constructed component, one variant per extension point. The semantics
/// client is its own variant because it serves two points at once.
pub enum Component {
    Source(Box<dyn SourceReader>),
    Format(Box<dyn FormatReader>),
    Enricher(Box<dyn Enricher>),
    Normalizer(Box<dyn Normalizer>),
    Embedding(Box<dyn EmbeddingProvider>),
    Semantics(SemanticsClient),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Source(_) => ComponentKind::Source,
            Self::Format(_) => ComponentKind::Format,
            Self::Enricher(_) => ComponentKind::Enricher,
            Self::Normalizer(_) => ComponentKind::Normalizer,
            Self::Embedding(_) => ComponentKind::Embedding,
            Self::Semantics(_) => ComponentKind::Embedding,
        }
    }

    pub fn into_embedding_provider(self) -> Option<Box<dyn EmbeddingProvider>> {
        match self {
            Self::Embedding(provider) => Some(provider),
            Self::Semantics(client) => Some(Box::new(client)),
            _ => None,
        }
    }

    pub fn into_comparator(self) -> Option<Box<dyn RelatednessRanker>> {
        match self {
            Self::Semantics(client) => Some(Box::new(client)),
            _ => None,
        }
    }

    pub fn into_normalizer(self) -> Option<Box<dyn Normalizer>> {
        match self {
            Self::Normalizer(normalizer) => Some(normalizer),
            _ => None,
        }
    }
}

type BuildFn = fn(&Registry, &BoundArgs) -> anyhow::Result<Component>;

pub struct ComponentEntry {
    pub name: &'static str,
    /// Every extension point this component can serve.
    pub kinds: &'static [ComponentKind],
    /// Declared constructor parameters, in positional order.
    pub params: &'static [&'static str],
    build: BuildFn,
}

/// Either a live, already-constructed instance or a declarative spec still
/// to be resolved. Live instances satisfy their type constraint by
/// construction and pass through unchanged.
pub enum SpecOr<T> {
    Instance(T),
    Spec(Value),
}

/// Maps component references to entries. Populated once at startup with the
/// built-in implementations; resolution never inspects types at runtime.
pub struct Registry {
    entries: HashMap<&'static str, ComponentEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(ComponentEntry {
            name: "ingest.FileSource",
            kinds: &[ComponentKind::Source],
            params: &["ending"],
            build: build_file_source,
        });
        registry.register(ComponentEntry {
            name: "ingest.RawTextReader",
            kinds: &[ComponentKind::Format],
            params: &["normalizer", "keep_original_text"],
            build: build_raw_text_reader,
        });
        registry.register(ComponentEntry {
            name: "ingest.DefaultNormalizer",
            kinds: &[ComponentKind::Normalizer],
            params: &[],
            build: build_default_normalizer,
        });
        registry.register(ComponentEntry {
            name: "enrich.StaticEnricher",
            kinds: &[ComponentKind::Enricher],
            params: &["meta_tags", "languages"],
            build: build_static_enricher,
        });
        registry.register(ComponentEntry {
            name: "enrich.EmbeddingEnricher",
            kinds: &[ComponentKind::Enricher],
            params: &["embedding_provider", "random_seed"],
            build: build_embedding_enricher,
        });
        registry.register(ComponentEntry {
            name: "enrich.FactEmbeddingEnricher",
            kinds: &[ComponentKind::Enricher],
            params: &["embedding_provider", "random_seed"],
            build: build_fact_embedding_enricher,
        });
        registry.register(ComponentEntry {
            name: "enrich.RelationEnricher",
            kinds: &[ComponentKind::Enricher],
            params: &["do_coreference", "server_address", "server_port", "group_lists"],
            build: build_relation_enricher,
        });
        registry.register(ComponentEntry {
            name: "enrich.SemanticsClient",
            kinds: &[ComponentKind::Embedding, ComponentKind::Comparator],
            params: &["corpus", "model", "language", "server", "scoring_function", "port"],
            build: build_semantics_client,
        });
        registry
    }

    /// Registering the same name twice is a startup-time programming error.
    pub fn register(&mut self, entry: ComponentEntry) {
        let name = entry.name;
        assert!(
            self.entries.insert(name, entry).is_none(),
            "component `{name}` registered twice"
        );
    }

    fn lookup(&self, name: &str, roots: &[&str]) -> Option<&ComponentEntry> {
        if let Some(entry) = self.entries.get(name) {
            return Some(entry);
        }
        // a bare class name resolves relative to the given search roots
        for root in roots {
            if let Some(entry) = self.entries.get(format!("{root}.{name}").as_str()) {
                return Some(entry);
            }
        }
        None
    }

    pub fn resolve(
        &self,
        name: &str,
        allowed: &[ComponentKind],
        roots: &[&str],
    ) -> Result<&ComponentEntry, AssemblyError> {
        let entry = self
            .lookup(name, roots)
            .ok_or_else(|| AssemblyError::Resolution { name: name.to_string() })?;
        if !entry.kinds.iter().any(|kind| allowed.contains(kind)) {
            return Err(AssemblyError::TypeConstraint {
                name: name.to_string(),
                found: entry.kinds.first().map_or("unregistered", |k| k.as_str()),
                expected: allowed.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(", "),
            });
        }
        Ok(entry)
    }

    pub fn build(
        &self,
        entry: &ComponentEntry,
        args: &BoundArgs,
    ) -> Result<Component, AssemblyError> {
        debug!(component = entry.name, "constructing component");
        (entry.build)(self, args).map_err(|source| AssemblyError::Construction {
            component: entry.name.to_string(),
            source,
        })
    }

    pub fn construct(
        &self,
        entry: &ComponentEntry,
        payload: &ArgPayload,
    ) -> Result<Component, AssemblyError> {
        let args = bind(entry.name, entry.params, payload)?;
        self.build(entry, &args)
    }

    fn construct_spec(
        &self,
        spec: &Value,
        allowed: &[ComponentKind],
        roots: &[&str],
    ) -> Result<Component, AssemblyError> {
        let (name, payload) = spec_parts(spec)?;
        let entry = self.resolve(&name, allowed, roots)?;
        self.construct(entry, &payload)
    }

    /// Resolves a normalizer from either form.
    pub fn normalizer(
        &self,
        spec: SpecOr<Box<dyn Normalizer>>,
    ) -> Result<Box<dyn Normalizer>, AssemblyError> {
        match spec {
            SpecOr::Instance(normalizer) => Ok(normalizer),
            SpecOr::Spec(value) => {
                let component =
                    self.construct_spec(&value, &[ComponentKind::Normalizer], &["ingest"])?;
                component.into_normalizer().ok_or_else(|| AssemblyError::TypeConstraint {
                    name: "normalizer spec".to_string(),
                    found: "other component",
                    expected: ComponentKind::Normalizer.as_str().to_string(),
                })
            }
        }
    }

    /// Resolves an embedding provider from either form.
    pub fn embedding_provider(
        &self,
        spec: SpecOr<Box<dyn EmbeddingProvider>>,
    ) -> Result<Box<dyn EmbeddingProvider>, AssemblyError> {
        match spec {
            SpecOr::Instance(provider) => Ok(provider),
            SpecOr::Spec(value) => {
                let component =
                    self.construct_spec(&value, &[ComponentKind::Embedding], &["enrich"])?;
                component.into_embedding_provider().ok_or_else(|| AssemblyError::TypeConstraint {
                    name: "embedding provider spec".to_string(),
                    found: "other component",
                    expected: ComponentKind::Embedding.as_str().to_string(),
                })
            }
        }
    }

    /// Resolves a relatedness comparator from either form.
    pub fn comparator(
        &self,
        spec: SpecOr<Box<dyn RelatednessRanker>>,
    ) -> Result<Box<dyn RelatednessRanker>, AssemblyError> {
        match spec {
            SpecOr::Instance(ranker) => Ok(ranker),
            SpecOr::Spec(value) => {
                let component =
                    self.construct_spec(&value, &[ComponentKind::Comparator], &["enrich"])?;
                component.into_comparator().ok_or_else(|| AssemblyError::TypeConstraint {
                    name: "comparator spec".to_string(),
                    found: "other component",
                    expected: ComponentKind::Comparator.as_str().to_string(),
                })
            }
        }
    }
}

fn build_file_source(_: &Registry, args: &BoundArgs) -> anyhow::Result<Component> {
    let ending = args.opt_str("ending")?;
    Ok(Component::Source(Box::new(FileSource::new(ending))))
}

fn build_raw_text_reader(registry: &Registry, args: &BoundArgs) -> anyhow::Result<Component> {
    let normalizer = match args.value("normalizer") {
        Some(value) => registry.normalizer(SpecOr::Spec(value.clone()))?,
        None => Box::new(DefaultNormalizer::new()) as Box<dyn Normalizer>,
    };
    let keep_original_text = args.bool_or("keep_original_text", true)?;
    Ok(Component::Format(Box::new(RawTextReader::new(normalizer, keep_original_text))))
}

fn build_default_normalizer(_: &Registry, _: &BoundArgs) -> anyhow::Result<Component> {
    Ok(Component::Normalizer(Box::new(DefaultNormalizer::new())))
}

fn build_static_enricher(_: &Registry, args: &BoundArgs) -> anyhow::Result<Component> {
    let meta_tags = args.string_map("meta_tags")?;
    let languages = LanguageSet::from_pairs(args.string_map("languages")?);
    Ok(Component::Enricher(Box::new(StaticEnricher::new(meta_tags, languages))))
}

fn build_embedding_enricher(registry: &Registry, args: &BoundArgs) -> anyhow::Result<Component> {
    let Some(spec) = args.value("embedding_provider") else {
        anyhow::bail!("`EmbeddingEnricher` needs an `embedding_provider`");
    };
    let provider = registry.embedding_provider(SpecOr::Spec(spec.clone()))?;
    let seed = args.u64_or("random_seed", 1337)?;
    Ok(Component::Enricher(Box::new(EmbeddingEnricher::new(provider, seed))))
}

fn build_fact_embedding_enricher(
    registry: &Registry,
    args: &BoundArgs,
) -> anyhow::Result<Component> {
    let Some(spec) = args.value("embedding_provider") else {
        anyhow::bail!("`FactEmbeddingEnricher` needs an `embedding_provider`");
    };
    let provider = registry.embedding_provider(SpecOr::Spec(spec.clone()))?;
    let seed = args.u64_or("random_seed", 1337)?;
    Ok(Component::Enricher(Box::new(FactEmbeddingEnricher::new(provider, seed))))
}

fn build_relation_enricher(_: &Registry, args: &BoundArgs) -> anyhow::Result<Component> {
    let server_address = args.str_or("server_address", "localhost")?;
    let server_port = u16::try_from(args.u64_or("server_port", 8080)?)?;
    let do_coreference = args.bool_or("do_coreference", false)?;
    let group_lists = args.bool_or("group_lists", false)?;
    Ok(Component::Enricher(Box::new(RelationEnricher::new(
        &server_address,
        server_port,
        do_coreference,
        group_lists,
    ))))
}

fn build_semantics_client(_: &Registry, args: &BoundArgs) -> anyhow::Result<Component> {
    let client = SemanticsClient::new(
        args.str_or("corpus", "googlenews")?,
        args.str_or("model", "W2V")?,
        args.str_or("language", "EN")?,
        args.str_or("server", "localhost")?,
        u16::try_from(args.u64_or("port", 8916)?)?,
        args.str_or("scoring_function", "COSINE")?,
    );
    Ok(Component::Semantics(client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolution_succeeds_for_allowed_kinds() {
        let registry = Registry::with_builtins();
        assert!(registry
            .resolve("ingest.FileSource", &[ComponentKind::Source], &[])
            .is_ok());
    }

    #[test]
    fn bare_names_resolve_through_search_roots() {
        let registry = Registry::with_builtins();
        assert!(registry.resolve("FileSource", &[ComponentKind::Source], &["ingest"]).is_ok());
        assert!(matches!(
            registry.resolve("FileSource", &[ComponentKind::Source], &["enrich"]),
            Err(AssemblyError::Resolution { .. })
        ));
    }

    #[test]
    fn unknown_names_fail_resolution() {
        let registry = Registry::with_builtins();
        assert!(matches!(
            registry.resolve("NoSuchThing", &[ComponentKind::Source], &["ingest", "enrich"]),
            Err(AssemblyError::Resolution { .. })
        ));
    }

    #[test]
    fn kind_mismatches_fail_the_type_constraint() {
        let registry = Registry::with_builtins();
        assert!(matches!(
            registry.resolve("ingest.FileSource", &[ComponentKind::Enricher], &[]),
            Err(AssemblyError::TypeConstraint { .. })
        ));
    }

    #[test]
    fn the_semantics_client_serves_two_extension_points() {
        let registry = Registry::with_builtins();
        assert!(registry
            .resolve("enrich.SemanticsClient", &[ComponentKind::Embedding], &[])
            .is_ok());
        assert!(registry
            .resolve("enrich.SemanticsClient", &[ComponentKind::Comparator], &[])
            .is_ok());
        assert!(matches!(
            registry.resolve("enrich.SemanticsClient", &[ComponentKind::Source], &[]),
            Err(AssemblyError::TypeConstraint { .. })
        ));
    }

    #[test]
    fn components_construct_from_every_payload_shape() {
        let registry = Registry::with_builtins();
        let entry = registry.resolve("ingest.FileSource", &[ComponentKind::Source], &[]).unwrap();

        for payload in [
            ArgPayload::from_value(&json!({"ending": ".txt"})),
            ArgPayload::from_value(&json!([".txt"])),
            ArgPayload::from_value(&json!(".txt")),
        ] {
            assert!(matches!(registry.construct(entry, &payload), Ok(Component::Source(_))));
        }
    }

    #[test]
    fn nested_normalizer_specs_construct_recursively() {
        let registry = Registry::with_builtins();
        let entry =
            registry.resolve("RawTextReader", &[ComponentKind::Format], &["ingest"]).unwrap();
        let payload = ArgPayload::from_value(&json!({
            "normalizer": "DefaultNormalizer",
            "keep_original_text": false
        }));
        assert!(matches!(registry.construct(entry, &payload), Ok(Component::Format(_))));
    }

    #[test]
    fn live_instances_pass_safe_construction_unchanged() {
        let registry = Registry::with_builtins();
        let instance: Box<dyn Normalizer> = Box::new(DefaultNormalizer::new());
        assert!(registry.normalizer(SpecOr::Instance(instance)).is_ok());
    }
}

pub mod embedding;
pub mod facts;
pub mod meta;
pub mod relation;
pub mod semantics;

pub use embedding::{
    oov_embedding, EmbeddingEnricher, EmbeddingProvider, FactEmbeddingEnricher, NoKnownEmbedding,
};
pub use meta::StaticEnricher;
pub use relation::RelationEnricher;
pub use semantics::{sort_by_relatedness, RelatednessRanker, SemanticsClient};

use anyhow::Result;
use model::Document;

/// A pipeline stage that annotates a document in place. Enrichers never
/// restructure sentence or word boundaries; they attach facts, embeddings
/// and tags to what the readers produced.
pub trait Enricher {
    fn enrich(&mut self, document: &mut Document) -> Result<()>;
}

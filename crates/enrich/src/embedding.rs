use std::collections::{BTreeSet, HashMap};

use anyhow::Result;
use rand::distributions::Standard;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use model::{Document, FactNode, LinkTarget};

use crate::Enricher;

#[derive(Debug, Error)]
#[error("document has no term with a known embedding")]
pub struct NoKnownEmbedding;

/// Maps terms into a vector space. `None` per term means the term is out of
/// vocabulary there.
pub trait EmbeddingProvider {
    fn embeddings(&self, terms: &[String]) -> Result<HashMap<String, Option<Vec<f32>>>>;
}

/// Deterministic stand-in vector for out-of-vocabulary terms. The same seed
/// and dimensionality always produce the same vector.
pub fn oov_embedding(seed: u64, dim: usize) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..dim).map(|_| rng.sample::<f32, _>(Standard)).collect()
}

fn zero_embedding(dim: usize) -> Vec<f32> {
    vec![0.0; dim]
}

fn known_dimension(embeddings: &HashMap<String, Option<Vec<f32>>>) -> Result<usize, NoKnownEmbedding> {
    embeddings
        .values()
        .find_map(|v| v.as_ref().map(Vec::len))
        .ok_or(NoKnownEmbedding)
}

/// Attaches a vector to every word, substituting the seeded
/// out-of-vocabulary vector where the provider knows nothing.
pub struct EmbeddingEnricher {
    provider: Box<dyn EmbeddingProvider>,
    seed: u64,
}

impl EmbeddingEnricher {
    pub fn new(provider: Box<dyn EmbeddingProvider>, seed: u64) -> Self {
        Self { provider, seed }
    }
}

impl Enricher for EmbeddingEnricher {
    fn enrich(&mut self, document: &mut Document) -> Result<()> {
        let vocab: BTreeSet<String> = document.words().map(|w| w.normalized.clone()).collect();
        if vocab.is_empty() {
            return Ok(());
        }
        let terms: Vec<String> = vocab.into_iter().collect();
        let embeddings = self.provider.embeddings(&terms)?;

        let dim = known_dimension(&embeddings)?;
        let oov = oov_embedding(self.seed, dim);

        for sentence in &mut document.sentences {
            for word in &mut sentence.words {
                let vector = embeddings.get(&word.normalized).and_then(Clone::clone);
                word.embedding = Some(vector.unwrap_or_else(|| oov.clone()));
            }
        }
        Ok(())
    }
}

/// Attaches vectors to the spans of every fact: subject, predicate, object
/// and the targets of simple links, batched by distinct text.
pub struct FactEmbeddingEnricher {
    provider: Box<dyn EmbeddingProvider>,
    seed: u64,
}

impl FactEmbeddingEnricher {
    pub fn new(provider: Box<dyn EmbeddingProvider>, seed: u64) -> Self {
        Self { provider, seed }
    }
}

impl Enricher for FactEmbeddingEnricher {
    fn enrich(&mut self, document: &mut Document) -> Result<()> {
        if document.facts.is_empty() {
            return Ok(());
        }

        let mut texts: BTreeSet<String> = BTreeSet::new();
        for node in document.facts.iter() {
            if let FactNode::Single(fact) = node {
                for span in [&fact.subject, &fact.predicate, &fact.object] {
                    if !span.text.is_empty() {
                        texts.insert(span.text.clone());
                    }
                }
            }
            for link in node.simple_links() {
                if let LinkTarget::Span(span) = link.target() {
                    if !span.text.is_empty() {
                        texts.insert(span.text.clone());
                    }
                }
            }
        }
        if texts.is_empty() {
            return Ok(());
        }

        let terms: Vec<String> = texts.into_iter().collect();
        let embeddings = self.provider.embeddings(&terms)?;

        let dim = known_dimension(&embeddings)?;
        let oov = oov_embedding(self.seed, dim);
        let lookup = |text: &str| -> Vec<f32> {
            if text.is_empty() {
                return zero_embedding(dim);
            }
            embeddings
                .get(text)
                .and_then(Clone::clone)
                .unwrap_or_else(|| oov.clone())
        };

        for node in document.facts.iter_mut() {
            match node {
                FactNode::Single(fact) => {
                    fact.subject.embedding = Some(lookup(&fact.subject.text));
                    fact.predicate.embedding = Some(lookup(&fact.predicate.text));
                    fact.object.embedding = Some(lookup(&fact.object.text));
                    for link in &mut fact.simple_links {
                        if let LinkTarget::Span(span) = link.target_mut() {
                            span.embedding = Some(lookup(&span.text));
                        }
                    }
                }
                FactNode::Collection(collection) => {
                    for link in &mut collection.simple_links {
                        if let LinkTarget::Span(span) = link.target_mut() {
                            span.embedding = Some(lookup(&span.text));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

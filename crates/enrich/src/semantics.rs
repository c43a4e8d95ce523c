use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::embedding::EmbeddingProvider;

/// Client for the remote distributional-semantics service. One endpoint
/// resolves term vectors, the other scores pairwise relatedness; both calls
/// block until the service answers.
pub struct SemanticsClient {
    corpus: String,
    model: String,
    language: String,
    scoring_function: String,
    vectors_url: String,
    relatedness_url: String,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct VectorsRequest<'a> {
    corpus: &'a str,
    model: &'a str,
    language: &'a str,
    terms: &'a [String],
}

#[derive(Deserialize)]
struct VectorsResponse {
    terms: HashMap<String, Option<Vec<f32>>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairQuery {
    pub t1: String,
    pub t2: String,
}

#[derive(Serialize)]
struct RelatednessRequest<'a> {
    corpus: &'a str,
    model: &'a str,
    language: &'a str,
    #[serde(rename = "scoreFunction")]
    score_function: &'a str,
    pairs: &'a [PairQuery],
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoredPair {
    pub t1: String,
    pub t2: String,
    pub score: f64,
}

#[derive(Deserialize)]
struct RelatednessResponse {
    pairs: Vec<ScoredPair>,
}

impl SemanticsClient {
    pub fn new(
        corpus: String,
        model: String,
        language: String,
        server: String,
        port: u16,
        scoring_function: String,
    ) -> Self {
        Self {
            corpus,
            model,
            language,
            scoring_function,
            vectors_url: format!("http://{server}:{port}/vectors"),
            relatedness_url: format!("http://{server}:{port}/relatedness"),
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn relatedness(&self, pairs: &[PairQuery]) -> Result<Vec<ScoredPair>> {
        let request = RelatednessRequest {
            corpus: &self.corpus,
            model: &self.model,
            language: &self.language,
            score_function: &self.scoring_function,
            pairs,
        };

        let response = self
            .client
            .post(&self.relatedness_url)
            .json(&request)
            .send()
            .context("failed to reach the relatedness endpoint")?;

        if !response.status().is_success() {
            anyhow::bail!("relatedness request failed: {}", response.status());
        }

        let parsed: RelatednessResponse = response
            .json()
            .context("failed to parse the relatedness response")?;
        Ok(parsed.pairs)
    }
}

impl EmbeddingProvider for SemanticsClient {
    fn embeddings(&self, terms: &[String]) -> Result<HashMap<String, Option<Vec<f32>>>> {
        let request = VectorsRequest {
            corpus: &self.corpus,
            model: &self.model,
            language: &self.language,
            terms,
        };

        let response = self
            .client
            .post(&self.vectors_url)
            .json(&request)
            .send()
            .context("failed to reach the vectors endpoint")?;

        if !response.status().is_success() {
            anyhow::bail!("vectors request failed: {}", response.status());
        }

        let parsed: VectorsResponse = response.json().context("failed to parse the vectors response")?;
        debug!(requested = terms.len(), resolved = parsed.terms.len(), "fetched term vectors");
        Ok(parsed.terms)
    }
}

/// Orders texts by their relatedness to a reference string. Returns the
/// indices of the input texts, most related first.
pub trait RelatednessRanker {
    fn rank(&self, compare_with: &str, texts: &[String]) -> Result<Vec<usize>>;
}

impl RelatednessRanker for SemanticsClient {
    fn rank(&self, compare_with: &str, texts: &[String]) -> Result<Vec<usize>> {
        // the service only echoes pair texts back, so the index rides along
        // as a prefix of the second term
        let pairs: Vec<PairQuery> = texts
            .iter()
            .enumerate()
            .map(|(id, text)| PairQuery {
                t1: compare_with.to_string(),
                t2: format!("{id} | {text}"),
            })
            .collect();

        let mut scored = self.relatedness(&pairs)?;
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .iter()
            .map(|pair| {
                pair.t2
                    .split(" | ")
                    .next()
                    .and_then(|prefix| prefix.trim().parse().ok())
                    .context("relatedness response pair lost its index prefix")
            })
            .collect()
    }
}

/// Sorts arbitrary items by their semantic relatedness to a reference
/// string, descending, using `text_of` to obtain the comparison text.
pub fn sort_by_relatedness<T>(
    ranker: &dyn RelatednessRanker,
    compare_with: &str,
    items: Vec<T>,
    text_of: impl Fn(&T) -> String,
) -> Result<Vec<T>> {
    let texts: Vec<String> = items.iter().map(&text_of).collect();
    let order = ranker.rank(compare_with, &texts)?;

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(slots.len());
    for index in order {
        if let Some(item) = slots.get_mut(index).and_then(Option::take) {
            ordered.push(item);
        }
    }
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ranks by text length, longest first.
    struct LengthRanker;

    impl RelatednessRanker for LengthRanker {
        fn rank(&self, _compare_with: &str, texts: &[String]) -> Result<Vec<usize>> {
            let mut order: Vec<usize> = (0..texts.len()).collect();
            order.sort_by_key(|&i| std::cmp::Reverse(texts[i].len()));
            Ok(order)
        }
    }

    #[test]
    fn sorts_items_by_ranker_order() {
        let items = vec!["ab", "a", "abcd", "abc"];
        let sorted =
            sort_by_relatedness(&LengthRanker, "reference", items, |s| s.to_string()).unwrap();
        assert_eq!(sorted, vec!["abcd", "abc", "ab", "a"]);
    }

    #[test]
    fn duplicate_indices_are_consumed_once() {
        struct Repeating;
        impl RelatednessRanker for Repeating {
            fn rank(&self, _c: &str, texts: &[String]) -> Result<Vec<usize>> {
                Ok(vec![0; texts.len()])
            }
        }
        let sorted = sort_by_relatedness(&Repeating, "x", vec!["a", "b"], |s| s.to_string()).unwrap();
        assert_eq!(sorted, vec!["a"]);
    }
}

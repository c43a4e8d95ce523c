use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use model::Document;

use crate::facts;
use crate::Enricher;

/// Sends a document's text to the remote relation-extraction service and
/// builds the resulting fact graph. A failing service costs the document its
/// facts, nothing more; the rest of the pipeline keeps running.
pub struct RelationEnricher {
    do_coreference: bool,
    group_lists: bool,
    endpoint: String,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtractionRequest<'a> {
    text: &'a str,
    do_coreference: bool,
    isolate_sentences: bool,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ExtractionResponse {
    pub extractions: Vec<RawExtraction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExtraction {
    /// The service's own long-form id, referenced by linked contexts.
    pub id: String,
    pub sentence_idx: usize,
    pub arg1: String,
    pub relation: String,
    pub arg2: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub context_layer: i32,
    #[serde(default)]
    pub simple_contexts: Vec<RawSimpleContext>,
    #[serde(default)]
    pub linked_contexts: Vec<RawLinkedContext>,
}

#[derive(Debug, Deserialize)]
pub struct RawSimpleContext {
    pub classification: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct RawLinkedContext {
    pub classification: String,
    #[serde(rename = "targetID")]
    pub target_id: String,
}

impl RelationEnricher {
    pub fn new(server_address: &str, server_port: u16, do_coreference: bool, group_lists: bool) -> Self {
        Self {
            do_coreference,
            group_lists,
            endpoint: format!("http://{server_address}:{server_port}/relationExtraction/text"),
            client: reqwest::blocking::Client::new(),
        }
    }

    fn fetch(&self, text: &str) -> Result<ExtractionResponse> {
        let request = ExtractionRequest {
            text,
            do_coreference: self.do_coreference,
            isolate_sentences: false,
            format: "DEFAULT",
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .context("failed to reach the relation extraction service")?;

        if !response.status().is_success() {
            anyhow::bail!("relation extraction request failed: {}", response.status());
        }

        response
            .json()
            .context("failed to parse the relation extraction response")
    }
}

impl Enricher for RelationEnricher {
    fn enrich(&mut self, document: &mut Document) -> Result<()> {
        let text = match document.plaintext() {
            Some(t) => t.to_string(),
            None => document.words().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" "),
        };

        let response = match self.fetch(&text) {
            Ok(response) => response,
            Err(err) => {
                error!(
                    document = %document.id,
                    error = %err,
                    "relation extraction failed; leaving document without facts"
                );
                return Ok(());
            }
        };

        debug!(document = %document.id, extractions = response.extractions.len(), "building fact graph");
        document.facts = facts::build_fact_graph(&response, self.group_lists)?;
        Ok(())
    }
}

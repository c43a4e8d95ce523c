//! Turns a flat extraction response into the linked fact graph.
//!
//! Link resolution is two-pass: facts are created first, fact-to-fact edges
//! are held back as (source, label, external-target-id) triples and attached
//! once every fact exists, because an extraction may reference a fact that
//! appears later in the response.

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::{bail, Result};
use tracing::debug;

use model::{
    ContextLabel, ContextLink, Fact, FactCollection, FactId, FactLabel, FactNode, FactStore,
    MaybeSpan,
};

use crate::relation::ExtractionResponse;

pub fn build_fact_graph(response: &ExtractionResponse, group_lists: bool) -> Result<FactStore> {
    let mut store = FactStore::default();
    let mut id_map: HashMap<&str, FactId> = HashMap::new();
    let mut pending: Vec<(FactId, ContextLabel, FactId)> = Vec::new();
    let mut unresolved: Vec<(FactId, ContextLabel, &str)> = Vec::new();

    for (index, raw) in response.extractions.iter().enumerate() {
        let id = FactId(index);
        let mut fact = Fact::new(
            id,
            raw.sentence_idx,
            raw.context_layer,
            MaybeSpan::new(raw.arg1.as_str()),
            MaybeSpan::new(raw.relation.as_str()),
            MaybeSpan::new(raw.arg2.as_str()),
            FactLabel::from_external(&raw.kind)?,
        );

        for context in &raw.simple_contexts {
            // noun-based contexts reappear as linked contexts
            if context.classification.eq_ignore_ascii_case("NOUN_BASED") {
                continue;
            }
            fact.simple_links.push(ContextLink::to_span(
                ContextLabel::from_external(&context.classification)?,
                MaybeSpan::new(context.text.as_str()),
            ));
        }

        for context in &raw.linked_contexts {
            unresolved.push((
                id,
                ContextLabel::from_external(&context.classification)?,
                context.target_id.as_str(),
            ));
        }

        id_map.insert(raw.id.as_str(), id);
        store.push(FactNode::Single(fact));
    }

    for (source, label, target) in unresolved {
        match id_map.get(target) {
            Some(resolved) => pending.push((source, label, *resolved)),
            None => bail!("linked context references unknown extraction id {target}"),
        }
    }

    if group_lists {
        group_by_lists(&mut store, &mut pending);
    }

    for (source, label, target) in pending {
        let (Some(source_level), Some(target_level)) = (
            store.get(source).map(FactNode::context_level),
            store.get(target).map(FactNode::context_level),
        ) else {
            bail!("pending link endpoints vanished while grouping");
        };
        let link = ContextLink::to_fact(label, target, source_level, target_level);
        if let Some(node) = store.get_mut(source) {
            node.fact_links_mut().push(link);
        }
    }

    Ok(store)
}

/// Coalesces list siblings into collections.
///
/// Policy: facts joined by List-labeled pending links whose endpoints share
/// a sentence and context level form one collection per connected component
/// (of at least two members). Pending edges into or out of a member are
/// redirected to its collection; edges that end up internal to a collection
/// are dropped, as are exact duplicates produced by the redirection.
fn group_by_lists(store: &mut FactStore, pending: &mut Vec<(FactId, ContextLabel, FactId)>) {
    let count = store.len();
    let mut parent: Vec<usize> = (0..count).collect();

    fn find(parent: &mut [usize], x: usize) -> usize {
        let mut root = x;
        while parent[root] != root {
            root = parent[root];
        }
        let mut cursor = x;
        while parent[cursor] != root {
            let next = parent[cursor];
            parent[cursor] = root;
            cursor = next;
        }
        root
    }

    for (source, label, target) in pending.iter() {
        if *label != ContextLabel::List {
            continue;
        }
        let siblings = match (store.get(*source), store.get(*target)) {
            (Some(s), Some(t)) => {
                s.sentence() == t.sentence() && s.context_level() == t.context_level()
            }
            _ => false,
        };
        if siblings {
            let (a, b) = (find(&mut parent, source.0), find(&mut parent, target.0));
            parent[a] = b;
        }
    }

    let mut components: BTreeMap<usize, Vec<FactId>> = BTreeMap::new();
    for index in 0..count {
        let root = find(&mut parent, index);
        components.entry(root).or_default().push(FactId(index));
    }

    let mut remap: HashMap<FactId, FactId> = HashMap::new();
    for members in components.into_values() {
        if members.len() < 2 {
            continue;
        }
        let Some(head) = store.get(members[0]) else { continue };
        let collection = FactCollection {
            id: store.next_id(),
            sentence: head.sentence(),
            context_level: head.context_level(),
            members: members.clone(),
            simple_links: Vec::new(),
            fact_links: Vec::new(),
        };
        debug!(collection = %collection.id, members = members.len(), "grouping list facts");
        for member in &members {
            remap.insert(*member, collection.id);
            if let Some(FactNode::Single(fact)) = store.get_mut(*member) {
                fact.grouped = true;
            }
        }
        store.push(FactNode::Collection(collection));
    }

    if remap.is_empty() {
        return;
    }

    let mut seen: HashSet<(FactId, ContextLabel, FactId)> = HashSet::new();
    let mut kept = Vec::with_capacity(pending.len());
    for (source, label, target) in pending.drain(..) {
        let source = remap.get(&source).copied().unwrap_or(source);
        let target = remap.get(&target).copied().unwrap_or(target);
        if source == target {
            // the link collapsed into its own collection
            continue;
        }
        if seen.insert((source, label, target)) {
            kept.push((source, label, target));
        }
    }
    *pending = kept;
}

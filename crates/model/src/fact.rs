use std::fmt;

use serde::Serialize;

use crate::label::{ContextLabel, FactLabel};
use crate::span::MaybeSpan;

/// Index of a fact within its document's `FactStore`. Ids are assigned
/// sequentially while a single extraction response is turned into a graph
/// and stay stable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FactId(pub usize);

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

/// What a context link points at: either a loose text span or another fact
/// in the same store.
#[derive(Debug, Clone, Serialize)]
pub enum LinkTarget {
    Span(MaybeSpan),
    Fact(FactId),
}

/// A labeled edge to some target.
#[derive(Debug, Clone, Serialize)]
pub struct Link<T> {
    pub label: ContextLabel,
    pub target: T,
}

/// A discourse-relation edge from a fact to a span or another fact.
///
/// `is_coordinate` is derived once, at construction: it holds exactly when
/// both endpoints carry a context level and the levels are equal. A span
/// target has no level, so such links are never coordinate.
#[derive(Debug, Clone, Serialize)]
pub struct ContextLink {
    link: Link<LinkTarget>,
    pub is_coordinate: bool,
}

impl ContextLink {
    pub fn to_span(label: ContextLabel, span: MaybeSpan) -> Self {
        Self {
            link: Link { label, target: LinkTarget::Span(span) },
            is_coordinate: false,
        }
    }

    pub fn to_fact(label: ContextLabel, target: FactId, source_level: i32, target_level: i32) -> Self {
        Self {
            link: Link { label, target: LinkTarget::Fact(target) },
            is_coordinate: source_level == target_level,
        }
    }

    pub fn label(&self) -> ContextLabel {
        self.link.label
    }

    pub fn target(&self) -> &LinkTarget {
        &self.link.target
    }

    pub fn target_mut(&mut self) -> &mut LinkTarget {
        &mut self.link.target
    }
}

/// A subject-predicate-object extraction tied to one sentence and one
/// nesting level of the discourse hierarchy.
#[derive(Debug, Clone, Serialize)]
pub struct Fact {
    pub id: FactId,
    pub sentence: usize,
    pub context_level: i32,
    pub subject: MaybeSpan,
    pub predicate: MaybeSpan,
    pub object: MaybeSpan,
    pub kind: FactLabel,
    pub simple_links: Vec<ContextLink>,
    pub fact_links: Vec<ContextLink>,
    /// Set when the fact has been absorbed into a `FactCollection`.
    pub grouped: bool,
}

impl Fact {
    pub fn new(
        id: FactId,
        sentence: usize,
        context_level: i32,
        subject: MaybeSpan,
        predicate: MaybeSpan,
        object: MaybeSpan,
        kind: FactLabel,
    ) -> Self {
        Self {
            id,
            sentence,
            context_level,
            subject,
            predicate,
            object,
            kind,
            simple_links: Vec::new(),
            fact_links: Vec::new(),
            grouped: false,
        }
    }

    /// All links of this fact: simple links first, then fact links. The
    /// sequence is assembled on every read, so it can never go stale between
    /// mutations of either list.
    pub fn links(&self) -> impl Iterator<Item = &ContextLink> {
        self.simple_links.iter().chain(self.fact_links.iter())
    }

    pub fn text(&self) -> String {
        format!("{} {} {}", self.subject.text, self.predicate.text, self.object.text)
    }
}

/// A group of sibling facts sharing a sentence and context level, typically
/// the items of an enumeration. Collections participate in the link graph in
/// place of their members.
#[derive(Debug, Clone, Serialize)]
pub struct FactCollection {
    pub id: FactId,
    pub sentence: usize,
    pub context_level: i32,
    pub members: Vec<FactId>,
    pub simple_links: Vec<ContextLink>,
    pub fact_links: Vec<ContextLink>,
}

#[derive(Debug, Clone, Serialize)]
pub enum FactNode {
    Single(Fact),
    Collection(FactCollection),
}

impl FactNode {
    pub fn id(&self) -> FactId {
        match self {
            Self::Single(f) => f.id,
            Self::Collection(c) => c.id,
        }
    }

    pub fn sentence(&self) -> usize {
        match self {
            Self::Single(f) => f.sentence,
            Self::Collection(c) => c.sentence,
        }
    }

    pub fn context_level(&self) -> i32 {
        match self {
            Self::Single(f) => f.context_level,
            Self::Collection(c) => c.context_level,
        }
    }

    pub fn simple_links(&self) -> &[ContextLink] {
        match self {
            Self::Single(f) => &f.simple_links,
            Self::Collection(c) => &c.simple_links,
        }
    }

    pub fn fact_links(&self) -> &[ContextLink] {
        match self {
            Self::Single(f) => &f.fact_links,
            Self::Collection(c) => &c.fact_links,
        }
    }

    pub fn fact_links_mut(&mut self) -> &mut Vec<ContextLink> {
        match self {
            Self::Single(f) => &mut f.fact_links,
            Self::Collection(c) => &mut c.fact_links,
        }
    }

    /// Simple links first, then fact links, recomputed per read.
    pub fn links(&self) -> impl Iterator<Item = &ContextLink> {
        self.simple_links().iter().chain(self.fact_links().iter())
    }

    pub fn as_single(&self) -> Option<&Fact> {
        match self {
            Self::Single(f) => Some(f),
            Self::Collection(_) => None,
        }
    }

    fn is_grouped(&self) -> bool {
        match self {
            Self::Single(f) => f.grouped,
            Self::Collection(_) => false,
        }
    }
}

/// Arena of all facts extracted for one document. Ids index into it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FactStore {
    nodes: Vec<FactNode>,
}

impl FactStore {
    pub fn next_id(&self) -> FactId {
        FactId(self.nodes.len())
    }

    pub fn push(&mut self, node: FactNode) -> FactId {
        let id = FactId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: FactId) -> Option<&FactNode> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: FactId) -> Option<&mut FactNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FactNode> {
        self.nodes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut FactNode> {
        self.nodes.iter_mut()
    }

    /// Facts still visible at document level: everything not absorbed into a
    /// collection.
    pub fn top_level(&self) -> impl Iterator<Item = &FactNode> {
        self.nodes.iter().filter(|n| !n.is_grouped())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(id: usize, level: i32) -> Fact {
        Fact::new(
            FactId(id),
            0,
            level,
            MaybeSpan::new("a"),
            MaybeSpan::new("b"),
            MaybeSpan::new("c"),
            FactLabel::VerbBased,
        )
    }

    #[test]
    fn coordinate_links_require_equal_levels() {
        let link = ContextLink::to_fact(ContextLabel::Cause, FactId(1), 2, 2);
        assert!(link.is_coordinate);

        let link = ContextLink::to_fact(ContextLabel::Cause, FactId(1), 1, 2);
        assert!(!link.is_coordinate);

        let link = ContextLink::to_span(ContextLabel::Temporal, MaybeSpan::new("yesterday"));
        assert!(!link.is_coordinate);
    }

    #[test]
    fn links_reflect_mutations_immediately() {
        let mut f = fact(0, 0);
        f.fact_links.push(ContextLink::to_fact(ContextLabel::Elaboration, FactId(1), 0, 0));
        assert_eq!(f.links().count(), 1);

        f.simple_links.push(ContextLink::to_span(ContextLabel::Spatial, MaybeSpan::new("in Memphis")));
        let labels: Vec<_> = f.links().map(|l| l.label()).collect();
        // simple links come first
        assert_eq!(labels, vec![ContextLabel::Spatial, ContextLabel::Elaboration]);
    }

    #[test]
    fn top_level_skips_grouped_facts() {
        let mut store = FactStore::default();
        let mut member = fact(0, 1);
        member.grouped = true;
        store.push(FactNode::Single(member));
        store.push(FactNode::Single(fact(1, 0)));
        store.push(FactNode::Collection(FactCollection {
            id: FactId(2),
            sentence: 0,
            context_level: 1,
            members: vec![FactId(0)],
            simple_links: Vec::new(),
            fact_links: Vec::new(),
        }));

        let visible: Vec<_> = store.top_level().map(FactNode::id).collect();
        assert_eq!(visible, vec![FactId(1), FactId(2)]);
    }
}

//! Ad-hoc navigation over document graphs: a view is a mutable, ordered
//! cursor over nodes of one element type, narrowed and moved by chainable
//! filter / expand / hop operations.

pub mod node;

pub use node::{AttrValue, EdgeRef, NodeRef, NodeType};

use std::cell::Cell;

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("cannot create a {target:?} view from a {source_type:?} node")]
    NotCreatable { source_type: NodeType, target: NodeType },
}

/// A stateful cursor over graph nodes. All operations mutate the view in
/// place and hand it back for chaining; `copy()` is the escape hatch when a
/// branch point is needed. The snapshot taken at creation stays untouched
/// and is the default pool for `expand`.
pub struct View<'a> {
    members: Vec<NodeRef<'a>>,
    initial: Vec<NodeRef<'a>>,
    node_type: Cell<Option<NodeType>>,
}

impl<'a> View<'a> {
    pub fn new(initial: Vec<NodeRef<'a>>) -> Self {
        Self {
            members: initial.clone(),
            initial,
            node_type: Cell::new(None),
        }
    }

    pub fn members(&self) -> &[NodeRef<'a>] {
        &self.members
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeRef<'a>> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Element type of the view, inferred from the first member and cached
    /// until a hop changes what the view holds.
    pub fn node_type(&self) -> Option<NodeType> {
        if self.node_type.get().is_none() {
            if let Some(first) = self.members.first() {
                self.node_type.set(Some(first.node_type()));
            }
        }
        self.node_type.get()
    }

    /// Retains only members satisfying the predicate.
    pub fn filter(&mut self, predicate: impl Fn(&NodeRef<'a>) -> bool) -> &mut Self {
        self.members.retain(|member| predicate(member));
        self
    }

    /// Retains only members whose named attributes all equal the given
    /// values. A member lacking one of the attributes does not match; that
    /// is logged, never raised.
    pub fn filter_by(&mut self, attrs: &[(&str, AttrValue)]) -> &mut Self {
        self.filter(attrs_equal(attrs))
    }

    /// Adds every node from `source` that satisfies the predicate.
    pub fn expand_from(
        &mut self,
        source: &[NodeRef<'a>],
        predicate: impl Fn(&NodeRef<'a>) -> bool,
    ) -> &mut Self {
        let matching: Vec<NodeRef<'a>> =
            source.iter().filter(|member| predicate(member)).copied().collect();
        self.members.extend(matching);
        self
    }

    /// Adds matching nodes from the initial snapshot, not from the current
    /// (possibly narrowed) members.
    pub fn expand(&mut self, predicate: impl Fn(&NodeRef<'a>) -> bool) -> &mut Self {
        let matching: Vec<NodeRef<'a>> =
            self.initial.iter().filter(|member| predicate(member)).copied().collect();
        self.members.extend(matching);
        self
    }

    pub fn expand_by(&mut self, attrs: &[(&str, AttrValue)]) -> &mut Self {
        self.expand(attrs_equal(attrs))
    }

    /// Follows the named relation from every member. Members without the
    /// relation contribute nothing. With `keep` false the gathered targets
    /// replace the current members; with `keep` true they are appended.
    pub fn hop(&mut self, link_name: &str, keep: bool) -> &mut Self {
        self.hop_where(link_name, |_| true, keep)
    }

    /// Like `hop`, but only follows edges the constraint accepts. The
    /// constraint sees the whole edge, so it can select by label or
    /// coordination as well as by target.
    pub fn hop_where(
        &mut self,
        link_name: &str,
        constraint: impl Fn(&EdgeRef<'a>) -> bool,
        keep: bool,
    ) -> &mut Self {
        let mut gathered = Vec::new();
        for member in &self.members {
            let Some(edges) = member.edges(link_name) else { continue };
            for edge in edges {
                if constraint(&edge) {
                    gathered.push(edge.target);
                }
            }
        }
        if !keep {
            self.members.clear();
        }
        self.members.extend(gathered);
        // whatever we held before, the element type must be re-inferred
        self.node_type.set(None);
        self
    }

    /// Stable in-place sort by key, optionally descending. Equal keys keep
    /// their current order either way.
    pub fn rank_by<K: Ord>(
        &mut self,
        key: impl Fn(&NodeRef<'a>) -> K,
        reverse: bool,
    ) -> &mut Self {
        if reverse {
            self.members.sort_by(|a, b| key(b).cmp(&key(a)));
        } else {
            self.members.sort_by(|a, b| key(a).cmp(&key(b)));
        }
        self
    }

    /// A new view over the current members; its snapshot is the current
    /// content, not this view's ancestry.
    pub fn copy(&self) -> View<'a> {
        View::new(self.members.clone())
    }
}

/// Conjunctive attribute-equality predicate. Missing attributes evaluate to
/// no-match with a warning; views tolerate heterogeneous members silently.
pub fn attrs_equal<'a, 'q>(
    attrs: &'q [(&'q str, AttrValue<'q>)],
) -> impl Fn(&NodeRef<'a>) -> bool + 'q {
    move |member| {
        attrs.iter().all(|(name, expected)| match member.attr(name) {
            Some(actual) => actual.matches(expected),
            None => {
                warn!(member = ?member, attribute = *name, "member lacks attribute; treating as no match");
                false
            }
        })
    }
}

/// Builds a view of `target`-typed nodes reachable from each source node:
/// a document yields its sentences, words or facts; a sentence its words.
/// Results from all sources are flattened into one view.
pub fn create_from<'a>(
    sources: &[NodeRef<'a>],
    target: NodeType,
) -> Result<View<'a>, ViewError> {
    let mut nodes = Vec::new();
    for source in sources {
        let relation = match (source.node_type(), target) {
            (NodeType::Document, NodeType::Sentence) => "sentences",
            (NodeType::Document, NodeType::Word) => "words",
            (NodeType::Document, NodeType::Fact) => "facts",
            (NodeType::Sentence, NodeType::Word) => "words",
            (source_type, _) => {
                return Err(ViewError::NotCreatable { source_type, target })
            }
        };
        if let Some(edges) = source.edges(relation) {
            nodes.extend(edges.into_iter().map(|edge| edge.target));
        }
    }
    Ok(View::new(nodes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{
        ContextLabel, ContextLink, Document, Fact, FactId, FactLabel, FactNode, MaybeSpan,
        Sentence, Word,
    };

    fn fixture() -> Document {
        let mut doc = Document::new(vec![
            Sentence::new(
                0,
                vec![
                    Word::new(0, "FedEx", "fedex"),
                    Word::new(1, "ships", "ships"),
                    Word::new(2, "parcels", "parcels"),
                ],
            ),
            Sentence::new(1, vec![Word::new(0, "Quickly", "quickly")]),
        ]);

        let mut first = Fact::new(
            FactId(0),
            0,
            0,
            MaybeSpan::new("FedEx"),
            MaybeSpan::new("ships"),
            MaybeSpan::new("parcels"),
            FactLabel::VerbBased,
        );
        first
            .simple_links
            .push(ContextLink::to_span(ContextLabel::Temporal, MaybeSpan::new("overnight")));
        first
            .fact_links
            .push(ContextLink::to_fact(ContextLabel::Elaboration, FactId(1), 0, 0));
        doc.facts.push(FactNode::Single(first));

        let second = Fact::new(
            FactId(1),
            1,
            0,
            MaybeSpan::new("it"),
            MaybeSpan::new("is"),
            MaybeSpan::new("fast"),
            FactLabel::VerbBased,
        );
        doc.facts.push(FactNode::Single(second));
        doc
    }

    fn fact_view(doc: &Document) -> View<'_> {
        create_from(&[NodeRef::Document(doc)], NodeType::Fact).unwrap()
    }

    #[test]
    fn create_from_flattens_over_sources() {
        let doc = fixture();
        let sentences: Vec<NodeRef> =
            doc.sentences.iter().map(|s| NodeRef::Sentence(&doc, s)).collect();
        let words = create_from(&sentences, NodeType::Word).unwrap();
        assert_eq!(words.len(), 4);
        assert_eq!(words.node_type(), Some(NodeType::Word));
    }

    #[test]
    fn create_from_rejects_unknown_pairs() {
        let doc = fixture();
        let word_nodes: Vec<NodeRef> = doc.words().map(NodeRef::Word).collect();
        assert!(create_from(&word_nodes, NodeType::Fact).is_err());
    }

    #[test]
    fn filter_by_matches_attribute_equality() {
        let doc = fixture();
        let mut facts = fact_view(&doc);
        facts.filter_by(&[("subject", "FedEx".into())]);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts.members()[0].attr("id"), Some(AttrValue::Int(0)));
    }

    #[test]
    fn filter_by_is_conjunctive() {
        let doc = fixture();
        let mut facts = fact_view(&doc);
        facts.filter_by(&[("subject", "FedEx".into()), ("object", "fast".into())]);
        assert!(facts.is_empty());
    }

    #[test]
    fn missing_attributes_mean_no_match_not_error() {
        let doc = fixture();
        let mut words = create_from(&[NodeRef::Document(&doc)], NodeType::Word).unwrap();
        // words have no "subject"
        words.filter_by(&[("subject", "FedEx".into())]);
        assert!(words.is_empty());
    }

    #[test]
    fn expand_draws_from_the_initial_snapshot() {
        let doc = fixture();
        let mut facts = fact_view(&doc);
        facts.filter_by(&[("subject", "it".into())]);
        assert_eq!(facts.len(), 1);

        // the discarded fact is still in the snapshot
        facts.expand_by(&[("subject", "FedEx".into())]);
        assert_eq!(facts.len(), 2);
    }

    #[test]
    fn hop_replaces_members_by_default() {
        let doc = fixture();
        let mut facts = fact_view(&doc);
        facts.hop("links", false);

        // both links of the first fact, nothing from the second
        assert_eq!(facts.len(), 2);
        let types: Vec<NodeType> = facts.iter().map(NodeRef::node_type).collect();
        assert_eq!(types, vec![NodeType::Span, NodeType::Fact]);
    }

    #[test]
    fn hop_with_keep_appends() {
        let doc = fixture();
        let mut facts = fact_view(&doc);
        facts.hop("links", true);
        assert_eq!(facts.len(), 4);
    }

    #[test]
    fn members_without_the_relation_contribute_nothing() {
        let doc = fixture();
        let mut facts = fact_view(&doc);
        // spans have no further links
        facts.hop("links", false).hop("links", false);
        assert!(facts.iter().all(|m| m.node_type() != NodeType::Span) || facts.is_empty());
    }

    #[test]
    fn hop_constraint_selects_by_label() {
        let doc = fixture();
        let mut facts = fact_view(&doc);
        facts.hop_where("links", |edge| edge.label == Some(ContextLabel::Elaboration), false);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts.members()[0].attr("subject"), Some(AttrValue::Text("it".into())));
    }

    #[test]
    fn hop_resets_the_cached_node_type() {
        let doc = fixture();
        let mut facts = fact_view(&doc);
        assert_eq!(facts.node_type(), Some(NodeType::Fact));
        facts.hop_where("links", |e| e.label == Some(ContextLabel::Temporal), false);
        assert_eq!(facts.node_type(), Some(NodeType::Span));
    }

    #[test]
    fn rank_by_orders_and_reverses() {
        let doc = fixture();
        let mut facts = fact_view(&doc);
        facts.rank_by(|m| m.attr("sentence").and_then(as_int), true);
        let first = facts.members()[0].attr("sentence");
        assert_eq!(first, Some(AttrValue::Int(1)));
    }

    fn as_int(value: AttrValue<'_>) -> Option<i64> {
        match value {
            AttrValue::Int(i) => Some(i),
            _ => None,
        }
    }

    #[test]
    fn copy_snapshots_current_content() {
        let doc = fixture();
        let mut facts = fact_view(&doc);
        facts.filter_by(&[("subject", "it".into())]);
        let mut copied = facts.copy();

        // the copy's snapshot is the narrowed set, expanding cannot bring
        // the discarded fact back
        copied.expand_by(&[("subject", "FedEx".into())]);
        assert_eq!(copied.len(), 1);
    }
}

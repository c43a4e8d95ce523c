use std::borrow::Cow;
use std::fmt;

use model::{ContextLabel, ContextLink, Document, FactId, FactLabel, FactNode, LinkTarget, MaybeSpan, Sentence, Word};

/// The element types a view can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Document,
    Sentence,
    Word,
    Fact,
    Span,
}

/// A reference to one node of a document graph. Fact and sentence variants
/// carry the owning document so link targets can be resolved.
#[derive(Clone, Copy)]
pub enum NodeRef<'a> {
    Document(&'a Document),
    Sentence(&'a Document, &'a Sentence),
    Word(&'a Word),
    Fact(&'a Document, FactId),
    Span(&'a MaybeSpan),
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document(d) => write!(f, "Document({})", d.id),
            Self::Sentence(_, s) => write!(f, "Sentence({})", s.index),
            Self::Word(w) => write!(f, "Word({:?})", w.text),
            Self::Fact(_, id) => write!(f, "Fact({id})"),
            Self::Span(s) => write!(f, "Span({:?})", s.text),
        }
    }
}

/// An attribute value as seen by view predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue<'a> {
    Text(Cow<'a, str>),
    Int(i64),
    Bool(bool),
    Fact(FactLabel),
    Context(ContextLabel),
}

impl<'a> AttrValue<'a> {
    fn text(value: &'a str) -> Self {
        Self::Text(Cow::Borrowed(value))
    }

    /// Equality across borrows with different lifetimes.
    pub fn matches(&self, other: &AttrValue<'_>) -> bool {
        match (self, other) {
            (Self::Text(a), AttrValue::Text(b)) => a == b,
            (Self::Int(a), AttrValue::Int(b)) => a == b,
            (Self::Bool(a), AttrValue::Bool(b)) => a == b,
            (Self::Fact(a), AttrValue::Fact(b)) => a == b,
            (Self::Context(a), AttrValue::Context(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> From<&'a str> for AttrValue<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(Cow::Borrowed(value))
    }
}

impl From<String> for AttrValue<'static> {
    fn from(value: String) -> Self {
        Self::Text(Cow::Owned(value))
    }
}

impl From<i64> for AttrValue<'static> {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for AttrValue<'static> {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<FactLabel> for AttrValue<'static> {
    fn from(value: FactLabel) -> Self {
        Self::Fact(value)
    }
}

impl From<ContextLabel> for AttrValue<'static> {
    fn from(value: ContextLabel) -> Self {
        Self::Context(value)
    }
}

/// A gathered relation candidate: the resolved target plus, when the edge
/// was a context link, its label and coordination flag.
#[derive(Debug, Clone, Copy)]
pub struct EdgeRef<'a> {
    pub label: Option<ContextLabel>,
    pub coordinate: Option<bool>,
    pub target: NodeRef<'a>,
}

impl<'a> EdgeRef<'a> {
    fn plain(target: NodeRef<'a>) -> Self {
        Self { label: None, coordinate: None, target }
    }
}

fn resolve_link<'a>(document: &'a Document, link: &'a ContextLink) -> EdgeRef<'a> {
    let target = match link.target() {
        LinkTarget::Span(span) => NodeRef::Span(span),
        LinkTarget::Fact(id) => NodeRef::Fact(document, *id),
    };
    EdgeRef { label: Some(link.label()), coordinate: Some(link.is_coordinate), target }
}

impl<'a> NodeRef<'a> {
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Document(_) => NodeType::Document,
            Self::Sentence(_, _) => NodeType::Sentence,
            Self::Word(_) => NodeType::Word,
            Self::Fact(_, _) => NodeType::Fact,
            Self::Span(_) => NodeType::Span,
        }
    }

    /// Attribute lookup by name. `None` means the node does not expose the
    /// attribute; callers decide whether that is a no-match or an error.
    pub fn attr(&self, name: &str) -> Option<AttrValue<'a>> {
        match *self {
            Self::Document(d) => match name {
                "name" => d.name.as_deref().map(AttrValue::text),
                "language" => d.language.as_ref().map(|l| AttrValue::text(&l.code)),
                "genre" => d.genre.as_deref().map(AttrValue::text),
                "text" => d.plaintext().map(AttrValue::text),
                other => d.tags.get(other).map(|v| AttrValue::text(v)),
            },
            Self::Sentence(_, s) => match name {
                "index" => Some(AttrValue::Int(s.index as i64)),
                "text" => Some(AttrValue::Text(Cow::Owned(s.text()))),
                _ => None,
            },
            Self::Word(w) => match name {
                "index" => Some(AttrValue::Int(w.index as i64)),
                "text" => Some(AttrValue::text(&w.text)),
                "normalized_text" => Some(AttrValue::text(&w.normalized)),
                "pos_tag" => w.pos_tag.as_deref().map(AttrValue::text),
                _ => None,
            },
            Self::Fact(d, id) => {
                let node = d.facts.get(id)?;
                match (node, name) {
                    (node, "id") => Some(AttrValue::Int(node.id().0 as i64)),
                    (node, "sentence") => Some(AttrValue::Int(node.sentence() as i64)),
                    (node, "context_level") => Some(AttrValue::Int(node.context_level() as i64)),
                    (FactNode::Single(f), "subject") => Some(AttrValue::text(&f.subject.text)),
                    (FactNode::Single(f), "predicate") => Some(AttrValue::text(&f.predicate.text)),
                    (FactNode::Single(f), "object") => Some(AttrValue::text(&f.object.text)),
                    (FactNode::Single(f), "type") => Some(AttrValue::Fact(f.kind)),
                    (FactNode::Single(f), "text") => Some(AttrValue::Text(Cow::Owned(f.text()))),
                    _ => None,
                }
            }
            Self::Span(s) => match name {
                "text" => Some(AttrValue::text(&s.text)),
                _ => None,
            },
        }
    }

    /// Relation lookup by name. `None` means the node has no such relation;
    /// an empty list means it exists but leads nowhere right now.
    pub fn edges(&self, name: &str) -> Option<Vec<EdgeRef<'a>>> {
        match *self {
            Self::Document(d) => match name {
                "sentences" => {
                    Some(d.sentences.iter().map(|s| EdgeRef::plain(NodeRef::Sentence(d, s))).collect())
                }
                "words" => Some(d.words().map(|w| EdgeRef::plain(NodeRef::Word(w))).collect()),
                "facts" => Some(
                    d.facts
                        .top_level()
                        .map(|node| EdgeRef::plain(NodeRef::Fact(d, node.id())))
                        .collect(),
                ),
                _ => None,
            },
            Self::Sentence(_, s) => match name {
                "words" => Some(s.words.iter().map(|w| EdgeRef::plain(NodeRef::Word(w))).collect()),
                _ => None,
            },
            Self::Word(_) | Self::Span(_) => None,
            Self::Fact(d, id) => {
                let node = d.facts.get(id)?;
                match (node, name) {
                    (node, "links") => Some(node.links().map(|l| resolve_link(d, l)).collect()),
                    (node, "simple_links") => {
                        Some(node.simple_links().iter().map(|l| resolve_link(d, l)).collect())
                    }
                    (node, "fact_links") => {
                        Some(node.fact_links().iter().map(|l| resolve_link(d, l)).collect())
                    }
                    (node, "sentence") => Some(
                        d.sentences
                            .get(node.sentence())
                            .map(|s| EdgeRef::plain(NodeRef::Sentence(d, s)))
                            .into_iter()
                            .collect(),
                    ),
                    (FactNode::Single(f), "subject") => {
                        Some(vec![EdgeRef::plain(NodeRef::Span(&f.subject))])
                    }
                    (FactNode::Single(f), "predicate") => {
                        Some(vec![EdgeRef::plain(NodeRef::Span(&f.predicate))])
                    }
                    (FactNode::Single(f), "object") => {
                        Some(vec![EdgeRef::plain(NodeRef::Span(&f.object))])
                    }
                    (FactNode::Collection(c), "members") => Some(
                        c.members.iter().map(|m| EdgeRef::plain(NodeRef::Fact(d, *m))).collect(),
                    ),
                    _ => None,
                }
            }
        }
    }
}

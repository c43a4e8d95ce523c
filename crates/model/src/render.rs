//! Human-readable rendering of fact graphs, one fact per block with its
//! links drawn as a small tree.

use crate::document::Document;
use crate::fact::{ContextLink, FactNode, FactStore, LinkTarget};

fn render_target(store: &FactStore, target: &LinkTarget) -> String {
    match target {
        LinkTarget::Span(span) => format!("({})", span.text),
        LinkTarget::Fact(id) => match store.get(*id).and_then(FactNode::as_single) {
            Some(f) => format!("({})─({})─({})", f.subject.text, f.predicate.text, f.object.text),
            None => format!("[{id}]"),
        },
    }
}

pub fn render_link(store: &FactStore, link: &ContextLink) -> String {
    format!("[{:^14}]─{}", link.label().as_str(), render_target(store, link.target()))
}

pub fn render_fact(store: &FactStore, node: &FactNode) -> String {
    let links: Vec<&ContextLink> = node.links().collect();
    let fork = if links.is_empty() { "─" } else { "┬" };
    let head = match node {
        FactNode::Single(f) => format!(
            "─{}─{}({})─({})─({})",
            f.id, fork, f.subject.text, f.predicate.text, f.object.text
        ),
        FactNode::Collection(c) => {
            format!("─{}─{}<collection of {} facts>", c.id, fork, c.members.len())
        }
    };
    let mut lines = vec![head];
    for (position, link) in links.iter().enumerate() {
        let branch = if position + 1 == links.len() { "└" } else { "├" };
        lines.push(format!("     {}{}", branch, render_link(store, link)));
    }
    lines.join("\n")
}

pub fn render_document_facts(document: &Document) -> String {
    document
        .facts
        .top_level()
        .map(|node| render_fact(&document.facts, node))
        .collect::<Vec<_>>()
        .join("\n")
}

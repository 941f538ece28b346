//! Intermediate markdown tree and its lowering to structural nodes.
//!
//! The markdown walker builds [`MdNode`]s, which may still contain raw HTML
//! spans. A sibling list holding raw spans is re-parsed as an HTML fragment
//! in which every markdown element is replaced by a `nbc-slot` stand-in. The
//! lowered markdown elements are put back in place of their stand-ins, so an
//! inline `<b>` ... `</b>` pair wraps the markdown between them while the
//! enclosing element keeps its own shape.

use std::collections::BTreeMap;

use nbcontent_shared::{CompileError, CompileResult, Node};

use crate::fragment::compile_fragment;
use crate::html::escape_text;

const SLOT_TAG: &str = "nbc-slot";
const SLOT_ATTR: &str = "data-slot";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MdNode {
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        children: Vec<MdNode>,
    },
    Text(String),
    /// Unsanitized HTML source, passed through.
    Raw(String),
}

impl MdNode {
    pub(crate) fn element(
        tag: impl Into<String>,
        attributes: BTreeMap<String, String>,
        children: Vec<MdNode>,
    ) -> Self {
        Self::Element {
            tag: tag.into(),
            attributes,
            children,
        }
    }

    pub(crate) fn text_content(&self, out: &mut String) {
        match self {
            Self::Text(value) => out.push_str(value),
            Self::Raw(_) => {}
            Self::Element { children, .. } => {
                children.iter().for_each(|c| c.text_content(out));
            }
        }
    }
}

/// Append `node` to `list`, merging adjacent text and adjacent raw spans.
pub(crate) fn push_merged(list: &mut Vec<MdNode>, node: MdNode) {
    match (list.last_mut(), node) {
        (Some(MdNode::Text(prev)), MdNode::Text(next)) => prev.push_str(&next),
        (Some(MdNode::Raw(prev)), MdNode::Raw(next)) => prev.push_str(&next),
        (_, node) => list.push(node),
    }
}

/// Lower a sibling list into structural nodes.
///
/// Raw spans are resolved within the list that holds them; elements above
/// and below keep the shape markdown gave them.
pub(crate) fn lower(nodes: Vec<MdNode>, max_depth: usize) -> CompileResult<Vec<Node>> {
    if nodes.iter().any(|node| matches!(node, MdNode::Raw(_))) {
        return lower_with_raw(nodes, max_depth);
    }

    nodes
        .into_iter()
        .map(|node| match node {
            MdNode::Text(value) => Ok(Node::text(value)),
            // Unreachable: lists holding raw spans take the fragment path.
            MdNode::Raw(html) => Ok(Node::text(html)),
            element => lower_element(element, max_depth),
        })
        .collect()
}

fn lower_element(node: MdNode, max_depth: usize) -> CompileResult<Node> {
    match node {
        MdNode::Element {
            tag,
            attributes,
            children,
        } => Ok(Node::Element {
            tag,
            attributes,
            children: lower(children, max_depth)?,
        }),
        MdNode::Text(value) | MdNode::Raw(value) => Ok(Node::text(value)),
    }
}

fn lower_with_raw(nodes: Vec<MdNode>, max_depth: usize) -> CompileResult<Vec<Node>> {
    let mut html = String::new();
    let mut slots = Vec::new();

    for node in nodes {
        match node {
            MdNode::Raw(raw) => html.push_str(&raw),
            MdNode::Text(value) => escape_text(&value, &mut html),
            element => {
                html.push_str(&format!(
                    "<{SLOT_TAG} {SLOT_ATTR}=\"{}\"></{SLOT_TAG}>",
                    slots.len()
                ));
                slots.push(Some(lower_element(element, max_depth)?));
            }
        }
    }

    let mut parsed = compile_fragment(&html, max_depth)?;
    fill_slots(&mut parsed, &mut slots);

    // Raw markup such as `<textarea>` or `<select>` can swallow a stand-in.
    if let Some(index) = slots.iter().position(Option::is_some) {
        return Err(CompileError::Html(format!(
            "raw HTML dropped markdown element {index}"
        )));
    }
    Ok(parsed)
}

/// Replace each stand-in with its lowered markdown element.
fn fill_slots(nodes: &mut [Node], slots: &mut [Option<Node>]) {
    for node in nodes.iter_mut() {
        let filled = match &*node {
            Node::Element {
                tag, attributes, ..
            } if tag == SLOT_TAG => attributes
                .get(SLOT_ATTR)
                .and_then(|index| index.parse::<usize>().ok())
                .and_then(|index| slots.get_mut(index))
                .and_then(Option::take),
            _ => None,
        };

        match filled {
            Some(element) => *node = element,
            None => {
                if let Node::Root { children } | Node::Element { children, .. } = node {
                    fill_slots(children, slots);
                }
            }
        }
    }
}

//! Fixed-shape container nodes for cells and outputs.
//!
//! Downstream styling keys off these class markers, so every container is
//! emitted even when its content is empty.

use nbcontent_shared::Node;

pub const CLASS_CELL: &str = "cell";
pub const CLASS_MARKDOWN_SOURCE: &str = "source markdown";
pub const CLASS_CODE_SOURCE: &str = "source code";
pub const CLASS_OUTPUT: &str = "output";
pub const CLASS_TEXT_HTML: &str = "text html";
pub const CLASS_TEXT_PLAIN: &str = "text plain";

fn container(class: &str, children: Vec<Node>) -> Node {
    Node::element("div").with_class(class).with_children(children)
}

/// Outer `cell` container.
pub fn cell(children: Vec<Node>) -> Node {
    container(CLASS_CELL, children)
}

/// `source markdown` container around compiled prose.
pub fn markdown_source(children: Vec<Node>) -> Node {
    container(CLASS_MARKDOWN_SOURCE, children)
}

/// `source code` container: `pre > code > text`, the source left as-is.
pub fn code_source(source: String) -> Node {
    let code = Node::element("code").with_children(vec![Node::text(source)]);
    let pre = Node::element("pre").with_children(vec![code]);
    container(CLASS_CODE_SOURCE, vec![pre])
}

/// `output` container: the `text html` block always precedes `text plain`.
pub fn output(html: Vec<Node>, plain: String) -> Node {
    container(
        CLASS_OUTPUT,
        vec![
            container(CLASS_TEXT_HTML, html),
            container(CLASS_TEXT_PLAIN, vec![Node::text(plain)]),
        ],
    )
}

//! HTML serialization of structural nodes.

use nbcontent_shared::Node;

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose text content is emitted verbatim.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Render a node sequence to an HTML string.
///
/// Roots are transparent; text is escaped except inside `script`/`style`.
pub fn render_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, false, &mut out);
    }
    out
}

fn write_node(node: &Node, raw_text: bool, out: &mut String) {
    match node {
        Node::Root { children } => {
            for child in children {
                write_node(child, false, out);
            }
        }
        Node::Text { value } if raw_text => out.push_str(value),
        Node::Text { value } => escape_text(value, out),
        Node::Element {
            tag,
            attributes,
            children,
        } => {
            write_open_tag(tag, attributes.iter(), out);
            if is_void(tag) {
                return;
            }
            let raw = is_raw_text(tag);
            for child in children {
                write_node(child, raw, out);
            }
            write_close_tag(tag, out);
        }
    }
}

fn write_open_tag<'a>(
    tag: &str,
    attributes: impl Iterator<Item = (&'a String, &'a String)>,
    out: &mut String,
) {
    out.push('<');
    out.push_str(tag);
    for (name, value) in attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
    }
    out.push('>');
}

fn write_close_tag(tag: &str, out: &mut String) {
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

pub(crate) fn escape_text(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

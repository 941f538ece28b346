//! HTML fragment → structural nodes.

use scraper::{ElementRef, Html};
use tracing::debug;

use nbcontent_shared::{CompileError, CompileOptions, CompileResult, Node};

/// Parses HTML fragments (no implicit `html`/`body` wrapper in the result).
#[derive(Debug, Clone)]
pub struct FragmentCompiler {
    max_depth: usize,
}

impl Default for FragmentCompiler {
    fn default() -> Self {
        Self::new(&CompileOptions::default())
    }
}

impl FragmentCompiler {
    pub fn new(options: &CompileOptions) -> Self {
        Self {
            max_depth: options.max_nesting_depth,
        }
    }

    /// Compile one fragment. Empty input yields an empty node list.
    pub fn compile(&self, html: &str) -> CompileResult<Vec<Node>> {
        compile_fragment(html, self.max_depth)
    }
}

/// Parse `html` in fragment mode and lower elements and text.
///
/// Comments, doctypes and processing instructions are dropped.
pub(crate) fn compile_fragment(html: &str, max_depth: usize) -> CompileResult<Vec<Node>> {
    if html.is_empty() {
        return Ok(Vec::new());
    }

    let fragment = Html::parse_fragment(html);
    if !fragment.errors.is_empty() {
        debug!(errors = fragment.errors.len(), "html fragment parsed with recoverable errors");
    }

    // The fragment's root element is the parser's context wrapper.
    lower_children(fragment.root_element(), 1, max_depth)
}

fn lower_children(parent: ElementRef<'_>, depth: usize, max_depth: usize) -> CompileResult<Vec<Node>> {
    let mut nodes = Vec::new();

    for child in parent.children() {
        match child.value() {
            scraper::Node::Text(text) => nodes.push(Node::text(&**text)),
            scraper::Node::Element(_) => {
                let Some(element) = ElementRef::wrap(child) else {
                    continue;
                };
                if depth > max_depth {
                    return Err(CompileError::TooDeep { limit: max_depth });
                }
                nodes.push(lower_element(element, depth, max_depth)?);
            }
            _ => {}
        }
    }

    Ok(nodes)
}

fn lower_element(element: ElementRef<'_>, depth: usize, max_depth: usize) -> CompileResult<Node> {
    let value = element.value();
    let attributes = value
        .attrs()
        .map(|(name, val)| (name.to_string(), val.to_string()))
        .collect();

    Ok(Node::Element {
        tag: value.name().to_string(),
        attributes,
        children: lower_children(element, depth + 1, max_depth)?,
    })
}

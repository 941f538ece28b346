//! Notebook walker: cells in document order → `root` node + merged frontmatter.
//!
//! Cells and outputs are compiled one at a time and awaited in sequence. The
//! frontmatter fold is order-dependent (last write wins), and so is the
//! position of every container in the tree.

use tracing::{debug, instrument, warn};

use nbcontent_markdown::{FragmentCompiler, ProseCompiler, ProseOutput};
use nbcontent_shared::{
    Cell, CompileOptions, CompileResult, Frontmatter, MIME_HTML, MIME_PLAIN, Node, Notebook, Output,
};

use crate::render;

/// The prose and fragment compilers behind the walker's suspension points.
#[derive(Debug, Clone, Default)]
pub struct Compilers {
    prose: ProseCompiler,
    fragments: FragmentCompiler,
}

impl Compilers {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            fragments: FragmentCompiler::new(&options),
            prose: ProseCompiler::new(options),
        }
    }

    async fn prose(&self, markdown: &str) -> CompileResult<ProseOutput> {
        self.prose.compile(markdown)
    }

    async fn fragment(&self, html: &str) -> CompileResult<Vec<Node>> {
        self.fragments.compile(html)
    }
}

/// Result of walking one notebook.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkOutput {
    /// `root` node whose children are the `cell` containers, in input order.
    pub root: Node,
    pub frontmatter: Frontmatter,
}

/// Walk every cell of `notebook` in order.
#[instrument(skip_all, fields(cells = notebook.cells.len()))]
pub async fn walk(notebook: &Notebook, compilers: &Compilers) -> WalkOutput {
    let mut cells = Vec::with_capacity(notebook.cells.len());
    let mut frontmatter = Frontmatter::default();

    for (index, cell) in notebook.cells.iter().enumerate() {
        let (node, matter) = render_cell(index, cell, compilers).await;
        frontmatter.merge(matter);
        cells.push(node);
    }

    debug!(frontmatter_keys = frontmatter.len(), "notebook walked");

    WalkOutput {
        root: Node::root(cells),
        frontmatter,
    }
}

/// Render one cell into its `cell` container plus the frontmatter it declares.
async fn render_cell(index: usize, cell: &Cell, compilers: &Compilers) -> (Node, Frontmatter) {
    match cell {
        Cell::Markdown { source } => {
            debug!(cell = index, "markdown cell");
            let compiled = or_empty(index, "markdown", compilers.prose(&source.join("\n")).await);
            let node = render::cell(vec![render::markdown_source(compiled.children)]);
            (node, compiled.frontmatter)
        }
        Cell::Code { source, outputs } => {
            debug!(cell = index, outputs = outputs.len(), "code cell");
            let mut children = Vec::with_capacity(outputs.len() + 1);
            children.push(render::code_source(source.join("\n")));
            for output in outputs {
                children.push(render_output(index, output, compilers).await);
            }
            (render::cell(children), Frontmatter::default())
        }
        Cell::Other => {
            debug!(cell = index, "unrecognized cell, rendering empty container");
            (render::cell(Vec::new()), Frontmatter::default())
        }
    }
}

async fn render_output(index: usize, output: &Output, compilers: &Compilers) -> Node {
    let html = output.mime_text(MIME_HTML);
    let html = or_empty(index, "html output", compilers.fragment(&html).await);
    render::output(html, output.mime_text(MIME_PLAIN))
}

/// Substitute the empty value for a failed sub-pipeline run.
fn or_empty<T: Default>(index: usize, stage: &str, result: CompileResult<T>) -> T {
    result.unwrap_or_else(|e| {
        warn!(cell = index, stage, error = %e, "compile failed, rendering empty");
        T::default()
    })
}

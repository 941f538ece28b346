//! Markdown and HTML-fragment compilers for notebook cells.
//!
//! - [`ProseCompiler`] turns a markdown cell source into structural nodes and
//!   lifts a leading `---` YAML block into frontmatter.
//! - [`FragmentCompiler`] turns an HTML output fragment into structural nodes.
//! - [`render_html`] serializes structural nodes back to HTML.
//!
//! Both compilers return `Err(CompileError)` rather than panicking; deciding
//! what to substitute on failure is the caller's job.

mod fragment;
mod html;
mod mdast;
mod prose;

pub use fragment::FragmentCompiler;
pub use html::render_html;
pub use prose::{ProseCompiler, ProseOutput};

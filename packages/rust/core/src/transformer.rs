//! The transformer contract exposed to the content pipeline.

use std::future::Future;
use std::path::Path;

use serde_json::Value;
use tracing::{info, instrument};

use nbcontent_shared::{AppConfig, CompileOptions, ParsedContent};

use crate::classify::{Classified, classify};
use crate::walker::{Compilers, walk};

/// Name the notebook transformer registers under.
pub const TRANSFORMER_NAME: &str = "ipynb";

/// File extensions routed to the notebook transformer.
pub const NOTEBOOK_EXTENSIONS: &[&str] = &[".ipynb"];

/// A content-pipeline stage that turns one source unit into a record.
pub trait Transformer {
    fn name(&self) -> &str;

    /// Extensions (with leading dot) this transformer is registered for.
    fn extensions(&self) -> &[&str];

    /// Whether `path` carries one of [`Transformer::extensions`].
    fn handles(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions()
            .iter()
            .any(|known| known.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }

    /// Parse one source unit. Always returns a well-shaped record.
    fn parse(&self, id: &str, content: Option<&Value>) -> impl Future<Output = ParsedContent> + Send;
}

/// Converts `.ipynb` content into a `root` document tree.
///
/// Holds only its compile options, so repeated calls on the same input give
/// identical records.
#[derive(Debug, Clone, Default)]
pub struct NotebookTransformer {
    compilers: Compilers,
}

impl NotebookTransformer {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            compilers: Compilers::new(options),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(CompileOptions::from(config))
    }
}

impl Transformer for NotebookTransformer {
    fn name(&self) -> &str {
        TRANSFORMER_NAME
    }

    fn extensions(&self) -> &[&str] {
        NOTEBOOK_EXTENSIONS
    }

    #[instrument(skip(self, content))]
    async fn parse(&self, id: &str, content: Option<&Value>) -> ParsedContent {
        info!(id, "parsing content");

        match classify(id, content) {
            Classified::EmptyJson => ParsedContent::empty_json(id),
            Classified::Json(body) => ParsedContent::json(id, body),
            Classified::Notebook(notebook) => {
                let out = walk(&notebook, &self.compilers).await;
                ParsedContent::markdown(id, out.root, out.frontmatter)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbcontent_shared::{ContentType, Node};
    use serde_json::json;

    fn fixture_path(name: &str) -> std::path::PathBuf {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures/notebooks")
            .join(name)
    }

    fn load_fixture(name: &str) -> Value {
        let text = std::fs::read_to_string(fixture_path(name))
            .unwrap_or_else(|e| panic!("failed to read fixture {name}: {e}"));
        serde_json::from_str(&text).unwrap_or_else(|e| panic!("invalid fixture {name}: {e}"))
    }

    async fn parse(content: Option<&Value>) -> ParsedContent {
        NotebookTransformer::default().parse("content:test.ipynb", content).await
    }

    // --- Classification ---

    #[tokio::test]
    async fn scalars_yield_empty_json() {
        for content in [None, Some(json!(null)), Some(json!(3)), Some(json!(false))] {
            let record = parse(content.as_ref()).await;
            assert_eq!(record.content_type(), ContentType::Json);
            assert_eq!(
                serde_json::to_value(&record).expect("serialize"),
                json!({ "id": "content:test.ipynb", "type": "json", "body": {} })
            );
        }
    }

    #[tokio::test]
    async fn textual_json_passes_through() {
        let text = json!(r#"{"cells": [], "nbformat": 4}"#);
        let record = parse(Some(&text)).await;
        assert_eq!(record, ParsedContent::json("content:test.ipynb", json!({ "cells": [], "nbformat": 4 })));
    }

    #[tokio::test]
    async fn invalid_text_yields_empty_json() {
        let record = parse(Some(&json!("{\"cells\": ["))).await;
        assert_eq!(record, ParsedContent::empty_json("content:test.ipynb"));

        let record = parse(Some(&json!("null"))).await;
        assert_eq!(record, ParsedContent::empty_json("content:test.ipynb"));
    }

    // --- Notebook path ---

    #[tokio::test]
    async fn notebook_record_shape() {
        let nb = json!({
            "cells": [
                { "cell_type": "markdown", "source": ["---", "title: T", "---", "# Heading"] },
                { "cell_type": "code", "source": ["print('hi')"], "outputs": [
                    { "output_type": "stream", "name": "stdout", "text": ["hi\n"] }
                ] }
            ]
        });
        let record = parse(Some(&nb)).await;

        assert_eq!(record.content_type(), ContentType::Markdown);
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["title"], json!("T"));
        assert_eq!(value["id"], json!("content:test.ipynb"));
        assert_eq!(value["type"], json!("markdown"));
        assert_eq!(value["body"]["type"], json!("root"));
        assert_eq!(value["body"]["children"].as_array().map(Vec::len), Some(2));
        assert_eq!(
            value["body"]["children"][0]["children"][0]["children"][0],
            json!({
                "type": "element",
                "tag": "h1",
                "props": {},
                "children": [{ "type": "text", "value": "Heading" }]
            })
        );
    }

    #[tokio::test]
    async fn unknown_cell_keeps_position() {
        let nb = json!({
            "cells": [
                { "cell_type": "markdown", "source": ["a"] },
                { "cell_type": "raw", "source": ["b"] },
                { "cell_type": "markdown", "source": ["c"] }
            ]
        });
        let record = parse(Some(&nb)).await;
        let root = record.tree().expect("tree");
        assert_eq!(root.children().len(), 3);
        assert_eq!(root.children()[1], Node::element("div").with_class("cell"));
    }

    #[tokio::test]
    async fn repeated_parses_are_identical() {
        let transformer = NotebookTransformer::default();
        let nb = load_fixture("analysis.ipynb");

        let first = transformer.parse("a", Some(&nb)).await;
        let second = transformer.parse("a", Some(&nb)).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn frontmatter_does_not_leak_between_calls() {
        let transformer = NotebookTransformer::default();
        let with_matter = json!({
            "cells": [{ "cell_type": "markdown", "source": ["---", "title: T", "---"] }]
        });
        let without = json!({ "cells": [{ "cell_type": "markdown", "source": ["plain"] }] });

        let first = transformer.parse("a", Some(&with_matter)).await;
        assert_eq!(first.frontmatter.len(), 1);
        let second = transformer.parse("b", Some(&without)).await;
        assert!(second.frontmatter.is_empty());
    }

    // --- Fixtures ---

    #[tokio::test]
    async fn analysis_fixture() {
        let record = parse(Some(&load_fixture("analysis.ipynb"))).await;

        assert_eq!(record.frontmatter.get("title"), Some(&json!("Sales Analysis")));
        assert_eq!(record.frontmatter.get("tags"), Some(&json!(["pandas", "report"])));

        let root = record.tree().expect("tree");
        assert_eq!(root.children().len(), 5);

        // The fenced block is lifted out; the heading leads the first cell.
        let prose = &root.children()[0].children()[0];
        assert_eq!(prose.children()[0].tag(), Some("h1"));
        assert!(!prose.text_content().contains("Sales Analysis"));

        // Second cell: code with an html + plain execute_result.
        let code_cell = &root.children()[1];
        assert_eq!(code_cell.children().len(), 2);
        let output = &code_cell.children()[1];
        let table = &output.children()[0].children()[0];
        assert_eq!(table.tag(), Some("table"));
        assert_eq!(table.class(), Some("dataframe"));
        assert!(output.children()[1].text_content().contains("region"));

        // Raw cell in the middle stays empty.
        assert!(root.children()[3].children().is_empty());
    }

    #[tokio::test]
    async fn malformed_fixture_degrades() {
        let record = parse(Some(&load_fixture("malformed.ipynb"))).await;
        let root = record.tree().expect("tree");
        assert_eq!(root.children().len(), 4);

        // Cell with non-list outputs renders its source only.
        assert_eq!(root.children()[1].children().len(), 1);
        // Bad frontmatter cell renders an empty markdown container.
        assert!(root.children()[2].children()[0].children().is_empty());
        assert!(record.frontmatter.is_empty());
    }

    // --- Registration surface ---

    #[test]
    fn handles_notebook_extension() {
        let transformer = NotebookTransformer::default();
        assert_eq!(transformer.name(), "ipynb");
        assert!(transformer.handles(Path::new("docs/intro.ipynb")));
        assert!(transformer.handles(Path::new("docs/INTRO.IPYNB")));
        assert!(!transformer.handles(Path::new("docs/intro.md")));
        assert!(!transformer.handles(Path::new("ipynb")));
    }
}

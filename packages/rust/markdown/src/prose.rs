//! Markdown → structural nodes, with leading-frontmatter extraction.
//!
//! Stages, in order:
//! 1. a leading `---` fenced YAML block is split off and parsed
//! 2. pulldown-cmark parses the rest into an event stream
//! 3. the builder folds events into an [`MdNode`] tree
//! 4. raw HTML spans are resolved against the fragment parser
//! 5. the tree is lowered to [`Node`]s

use std::collections::BTreeMap;

use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use serde_json::Value;
use tracing::{debug, instrument};

use nbcontent_shared::{CompileError, CompileOptions, CompileResult, Frontmatter, Node};

use crate::mdast::{self, MdNode, push_merged};

/// A compiled markdown cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProseOutput {
    /// Top-level nodes of the rendered prose (frontmatter excluded).
    pub children: Vec<Node>,
    /// Keys from the leading YAML block; empty when there is none.
    pub frontmatter: Frontmatter,
}

/// Compiles markdown cell sources.
#[derive(Debug, Clone, Default)]
pub struct ProseCompiler {
    options: CompileOptions,
}

impl ProseCompiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    fn parser_options(&self) -> Options {
        let mut opts = Options::empty();
        if self.options.tables {
            opts.insert(Options::ENABLE_TABLES);
        }
        if self.options.strikethrough {
            opts.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.options.tasklists {
            opts.insert(Options::ENABLE_TASKLISTS);
        }
        if self.options.footnotes {
            opts.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.options.heading_attributes {
            opts.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        }
        opts
    }

    /// Compile one markdown blob.
    #[instrument(skip_all, fields(len = markdown.len()))]
    pub fn compile(&self, markdown: &str) -> CompileResult<ProseOutput> {
        let max_depth = self.options.max_nesting_depth;

        let (frontmatter, body) = match split_frontmatter(markdown) {
            Some((yaml, body)) if self.options.frontmatter => (parse_frontmatter(yaml)?, body),
            _ => (Frontmatter::default(), markdown),
        };

        let mut builder = TreeBuilder::new(max_depth);
        for event in Parser::new_ext(body, self.parser_options()) {
            builder.event(event)?;
        }

        let tree = builder.finish()?;
        let children = mdast::lower(tree, max_depth)?;

        debug!(
            nodes = children.len(),
            frontmatter_keys = frontmatter.len(),
            "markdown compiled"
        );

        Ok(ProseOutput {
            children,
            frontmatter,
        })
    }
}

/// Fence line opening and closing a frontmatter block.
const FENCE: &str = "---";

/// Split a leading fenced block off `markdown`, returning `(yaml, rest)`.
///
/// Both fences must be exactly `---` on a line of their own. Blank lines
/// inside the block are allowed. Without a closing fence there is no block.
fn split_frontmatter(markdown: &str) -> Option<(&str, &str)> {
    let mut lines = markdown.split_inclusive('\n');
    let opening = lines.next()?;
    if !is_fence(opening) {
        return None;
    }

    let start = opening.len();
    let mut offset = start;
    for line in lines {
        if is_fence(line) {
            return Some((&markdown[start..offset], &markdown[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn is_fence(line: &str) -> bool {
    line.trim_end_matches(['\n', '\r']) == FENCE
}

/// Parse the body of a `---` block into frontmatter.
///
/// A YAML document that is not a mapping contributes nothing.
fn parse_frontmatter(yaml: &str) -> CompileResult<Frontmatter> {
    let doc: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|e| CompileError::Frontmatter(e.to_string()))?;
    let json = serde_json::to_value(doc).map_err(|e| CompileError::Frontmatter(e.to_string()))?;

    match json {
        Value::Object(map) => Ok(Frontmatter::from(map)),
        Value::Null => Ok(Frontmatter::default()),
        other => {
            debug!(value = %other, "ignoring non-mapping frontmatter");
            Ok(Frontmatter::default())
        }
    }
}

// ---------------------------------------------------------------------------
// Event stream → MdNode tree
// ---------------------------------------------------------------------------

enum FrameKind {
    /// The document itself, or a container that contributes no element.
    Transparent,
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
    },
    CodeBlock {
        language: Option<String>,
    },
    Image {
        attributes: BTreeMap<String, String>,
    },
    Table,
    TableHead,
}

struct Frame {
    kind: FrameKind,
    children: Vec<MdNode>,
}

impl Frame {
    fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }
}

struct TreeBuilder {
    stack: Vec<Frame>,
    max_depth: usize,
    alignments: Vec<Alignment>,
    in_table_head: bool,
    cell_index: usize,
}

impl TreeBuilder {
    fn new(max_depth: usize) -> Self {
        Self {
            stack: vec![Frame::new(FrameKind::Transparent)],
            max_depth,
            alignments: Vec::new(),
            in_table_head: false,
            cell_index: 0,
        }
    }

    fn finish(mut self) -> CompileResult<Vec<MdNode>> {
        if self.stack.len() != 1 {
            return Err(CompileError::Markdown(format!(
                "{} unclosed block(s) at end of input",
                self.stack.len() - 1
            )));
        }
        Ok(self.stack.pop().map(|f| f.children).unwrap_or_default())
    }

    fn top(&mut self) -> &mut Frame {
        // The root frame is never popped by `close`.
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn push(&mut self, node: MdNode) {
        push_merged(&mut self.top().children, node);
    }

    fn open(&mut self, kind: FrameKind) -> CompileResult<()> {
        if self.stack.len() > self.max_depth {
            return Err(CompileError::TooDeep {
                limit: self.max_depth,
            });
        }
        self.stack.push(Frame::new(kind));
        Ok(())
    }

    fn open_element(&mut self, tag: &str) -> CompileResult<()> {
        self.open(FrameKind::Element {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
        })
    }

    fn event(&mut self, event: Event<'_>) -> CompileResult<()> {
        match event {
            Event::Start(tag) => self.start(tag)?,
            Event::End(tag) => self.end(tag)?,
            Event::Text(text) => self.push(MdNode::Text(text.into_string())),
            Event::Code(code) => self.push(MdNode::element(
                "code",
                BTreeMap::new(),
                vec![MdNode::Text(code.into_string())],
            )),
            Event::Html(html) | Event::InlineHtml(html) => self.push(MdNode::Raw(html.into_string())),
            Event::SoftBreak => self.push(MdNode::Text("\n".into())),
            Event::HardBreak => self.push(MdNode::element("br", BTreeMap::new(), Vec::new())),
            Event::Rule => self.push(MdNode::element("hr", BTreeMap::new(), Vec::new())),
            Event::FootnoteReference(label) => {
                let link = MdNode::element(
                    "a",
                    attrs([("href", format!("#fn-{label}"))]),
                    vec![MdNode::Text(label.into_string())],
                );
                self.push(MdNode::element(
                    "sup",
                    attrs([("class", "footnote-reference".to_string())]),
                    vec![link],
                ));
            }
            Event::TaskListMarker(checked) => {
                let mut attributes = attrs([
                    ("type", "checkbox".to_string()),
                    ("disabled", String::new()),
                ]);
                if checked {
                    attributes.insert("checked".into(), String::new());
                }
                self.push(MdNode::element("input", attributes, Vec::new()));
            }
            _ => {}
        }
        Ok(())
    }

    fn start(&mut self, tag: Tag<'_>) -> CompileResult<()> {
        match tag {
            Tag::Paragraph => self.open_element("p"),
            Tag::Heading {
                level,
                id,
                classes,
                attrs: extra,
            } => {
                let mut attributes = BTreeMap::new();
                if let Some(id) = id {
                    attributes.insert("id".to_string(), id.into_string());
                }
                if !classes.is_empty() {
                    let classes: Vec<String> = classes.iter().map(|c| c.to_string()).collect();
                    attributes.insert("class".to_string(), classes.join(" "));
                }
                for (name, value) in extra {
                    attributes.insert(
                        name.into_string(),
                        value.map(|v| v.into_string()).unwrap_or_default(),
                    );
                }
                self.open(FrameKind::Element {
                    tag: heading_tag(level).to_string(),
                    attributes,
                })
            }
            Tag::BlockQuote(_) => self.open_element("blockquote"),
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info.split_whitespace().next().map(String::from),
                    CodeBlockKind::Indented => None,
                };
                self.open(FrameKind::CodeBlock { language })
            }
            Tag::HtmlBlock => self.open(FrameKind::Transparent),
            Tag::List(Some(start)) => {
                let mut attributes = BTreeMap::new();
                if start != 1 {
                    attributes.insert("start".to_string(), start.to_string());
                }
                self.open(FrameKind::Element {
                    tag: "ol".into(),
                    attributes,
                })
            }
            Tag::List(None) => self.open_element("ul"),
            Tag::Item => self.open_element("li"),
            Tag::FootnoteDefinition(label) => self.open(FrameKind::Element {
                tag: "div".into(),
                attributes: attrs([
                    ("class", "footnote-definition".to_string()),
                    ("id", format!("fn-{label}")),
                ]),
            }),
            Tag::Table(alignments) => {
                self.alignments = alignments;
                self.open(FrameKind::Table)
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.cell_index = 0;
                self.open(FrameKind::TableHead)
            }
            Tag::TableRow => {
                self.cell_index = 0;
                self.open_element("tr")
            }
            Tag::TableCell => {
                let tag = if self.in_table_head { "th" } else { "td" };
                let mut attributes = BTreeMap::new();
                if let Some(align) = self.alignments.get(self.cell_index).and_then(|a| align_attr(*a)) {
                    attributes.insert("align".to_string(), align.to_string());
                }
                self.open(FrameKind::Element {
                    tag: tag.into(),
                    attributes,
                })
            }
            Tag::Emphasis => self.open_element("em"),
            Tag::Strong => self.open_element("strong"),
            Tag::Strikethrough => self.open_element("del"),
            Tag::Link {
                dest_url, title, ..
            } => {
                let mut attributes = attrs([("href", dest_url.into_string())]);
                if !title.is_empty() {
                    attributes.insert("title".into(), title.into_string());
                }
                self.open(FrameKind::Element {
                    tag: "a".into(),
                    attributes,
                })
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let mut attributes = attrs([("src", dest_url.into_string())]);
                if !title.is_empty() {
                    attributes.insert("title".into(), title.into_string());
                }
                self.open(FrameKind::Image { attributes })
            }
            _ => self.open(FrameKind::Transparent),
        }
    }

    fn end(&mut self, tag: TagEnd) -> CompileResult<()> {
        match tag {
            TagEnd::TableHead => self.in_table_head = false,
            TagEnd::TableCell => self.cell_index += 1,
            _ => {}
        }
        self.close()
    }

    fn close(&mut self) -> CompileResult<()> {
        if self.stack.len() < 2 {
            return Err(CompileError::Markdown("unbalanced end event".into()));
        }
        let Some(frame) = self.stack.pop() else {
            return Ok(());
        };

        match frame.kind {
            FrameKind::Transparent => {
                for child in frame.children {
                    self.push(child);
                }
            }
            FrameKind::Element { tag, attributes } => {
                self.push(MdNode::element(tag, attributes, frame.children));
            }
            FrameKind::CodeBlock { language } => {
                let mut attributes = BTreeMap::new();
                if let Some(lang) = language {
                    attributes.insert("class".to_string(), format!("language-{lang}"));
                }
                let code = MdNode::element("code", attributes, frame.children);
                self.push(MdNode::element("pre", BTreeMap::new(), vec![code]));
            }
            FrameKind::Image { mut attributes } => {
                let mut alt = String::new();
                frame.children.iter().for_each(|c| c.text_content(&mut alt));
                attributes.insert("alt".into(), alt);
                self.push(MdNode::element("img", attributes, Vec::new()));
            }
            FrameKind::Table => {
                let mut table = Vec::new();
                let mut rows = Vec::new();
                for child in frame.children {
                    match &child {
                        MdNode::Element { tag, .. } if tag == "thead" => table.push(child),
                        _ => rows.push(child),
                    }
                }
                if !rows.is_empty() {
                    table.push(MdNode::element("tbody", BTreeMap::new(), rows));
                }
                self.alignments.clear();
                self.push(MdNode::element("table", BTreeMap::new(), table));
            }
            FrameKind::TableHead => {
                let row = MdNode::element("tr", BTreeMap::new(), frame.children);
                self.push(MdNode::element("thead", BTreeMap::new(), vec![row]));
            }
        }
        Ok(())
    }
}

fn attrs<const N: usize>(pairs: [(&str, String); N]) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}

fn align_attr(alignment: Alignment) -> Option<&'static str> {
    match alignment {
        Alignment::None => None,
        Alignment::Left => Some("left"),
        Alignment::Center => Some("center"),
        Alignment::Right => Some("right"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

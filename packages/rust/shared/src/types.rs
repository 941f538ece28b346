//! Output model: the structural document tree, frontmatter, and the record
//! handed back to the content pipeline.

use std::collections::BTreeMap;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// The universal tree unit consumed by the downstream renderer.
///
/// Serializes as `{"type":"element","tag":..,"props":{..},"children":[..]}`,
/// `{"type":"text","value":..}` or `{"type":"root","children":[..]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Root {
        #[serde(default)]
        children: Vec<Node>,
    },
    Element {
        tag: String,
        #[serde(rename = "props", default)]
        attributes: BTreeMap<String, String>,
        #[serde(default)]
        children: Vec<Node>,
    },
    Text {
        value: String,
    },
}

impl Node {
    /// An element with no attributes and no children.
    pub fn element(tag: impl Into<String>) -> Self {
        Self::Element {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }

    pub fn root(children: Vec<Node>) -> Self {
        Self::Root { children }
    }

    /// Builder: set an attribute. No-op on text nodes and roots.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Self::Element { attributes, .. } = &mut self {
            attributes.insert(name.into(), value.into());
        }
        self
    }

    /// Builder: set the `class` attribute.
    pub fn with_class(self, class: impl Into<String>) -> Self {
        self.with_attr("class", class)
    }

    /// Builder: replace the children. No-op on text nodes.
    pub fn with_children(mut self, nodes: Vec<Node>) -> Self {
        match &mut self {
            Self::Root { children } | Self::Element { children, .. } => *children = nodes,
            Self::Text { .. } => {}
        }
        self
    }

    /// Child nodes (empty for text nodes).
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Root { children } | Self::Element { children, .. } => children,
            Self::Text { .. } => &[],
        }
    }

    /// Element tag name, if this is an element.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Attribute value, if this is an element carrying `name`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            Self::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            _ => None,
        }
    }

    pub fn class(&self) -> Option<&str> {
        self.attr("class")
    }

    /// Concatenated text of all descendant text nodes, in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text { value } => out.push_str(value),
            _ => self.children().iter().for_each(|c| c.collect_text(out)),
        }
    }
}

// ---------------------------------------------------------------------------
// Frontmatter
// ---------------------------------------------------------------------------

/// Document-level metadata lifted from leading YAML blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frontmatter(pub Map<String, Value>);

impl Frontmatter {
    /// Fold `other` into `self`; keys in `other` overwrite existing ones.
    pub fn merge(&mut self, other: Frontmatter) {
        for (key, value) in other.0 {
            self.0.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Map<String, Value>> for Frontmatter {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// ---------------------------------------------------------------------------
// ParsedContent
// ---------------------------------------------------------------------------

/// Record fields that frontmatter keys can never override.
pub const RESERVED_KEYS: [&str; 3] = ["id", "type", "body"];

/// The `type` field of a [`ParsedContent`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Json,
    Markdown,
}

/// The `body` field of a [`ParsedContent`] record.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Either `{}` or a JSON value passed through verbatim.
    Json(Value),
    /// The root of the compiled notebook tree.
    Tree(Node),
}

impl Serialize for Body {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Json(value) => value.serialize(serializer),
            Self::Tree(node) => node.serialize(serializer),
        }
    }
}

/// The record returned to the content pipeline for one source unit.
///
/// Serializes as `{ ...frontmatter, id, type, body }`: frontmatter keys sit at
/// the top level next to the reserved fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedContent {
    pub id: String,
    pub body: Body,
    pub frontmatter: Frontmatter,
}

impl ParsedContent {
    /// `{ id, type: "json", body: {} }`.
    pub fn empty_json(id: impl Into<String>) -> Self {
        Self::json(id, Value::Object(Map::new()))
    }

    pub fn json(id: impl Into<String>, body: Value) -> Self {
        Self {
            id: id.into(),
            body: Body::Json(body),
            frontmatter: Frontmatter::default(),
        }
    }

    pub fn markdown(id: impl Into<String>, root: Node, frontmatter: Frontmatter) -> Self {
        Self {
            id: id.into(),
            body: Body::Tree(root),
            frontmatter,
        }
    }

    pub fn content_type(&self) -> ContentType {
        match self.body {
            Body::Json(_) => ContentType::Json,
            Body::Tree(_) => ContentType::Markdown,
        }
    }

    /// The compiled tree, when this is a markdown record.
    pub fn tree(&self) -> Option<&Node> {
        match &self.body {
            Body::Tree(node) => Some(node),
            Body::Json(_) => None,
        }
    }
}

impl Serialize for ParsedContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let extra = self
            .frontmatter
            .0
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()));

        let mut map = serializer.serialize_map(None)?;
        for (key, value) in extra {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("type", &self.content_type())?;
        map.serialize_entry("body", &self.body)?;
        map.end()
    }
}

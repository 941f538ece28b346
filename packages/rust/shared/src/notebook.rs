//! Input model for `.ipynb` documents.
//!
//! Deserialization is deliberately forgiving: any field with an unexpected
//! JSON shape reads as absent, and a malformed cell reads as [`Cell::Other`].
//! Nothing in this module can fail on well-formed JSON.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// MIME key for HTML fragments in an output bundle.
pub const MIME_HTML: &str = "text/html";

/// MIME key for plain text in an output bundle.
pub const MIME_PLAIN: &str = "text/plain";

// ---------------------------------------------------------------------------
// TextLines
// ---------------------------------------------------------------------------

/// A notebook "multiline string": either a list of fragments or one string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextLines(pub Vec<String>);

impl TextLines {
    /// Join the fragments with `sep`, leaving each fragment untouched.
    pub fn join(&self, sep: &str) -> String {
        self.0.join(sep)
    }

    /// Concatenate the fragments without a separator.
    pub fn concat(&self) -> String {
        self.0.concat()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<&str>> for TextLines {
    fn from(lines: Vec<&str>) -> Self {
        Self(lines.into_iter().map(String::from).collect())
    }
}

impl<'de> Deserialize<'de> for TextLines {
    fn deserialize<D: Deserializer<'de>>(de: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(de)?;
        let lines = match value {
            Value::Array(items) => items.into_iter().map(fragment_text).collect(),
            Value::Null => Vec::new(),
            other => vec![fragment_text(other)],
        };
        Ok(Self(lines))
    }
}

/// Stringify one fragment the way a JS `Array.join` would.
fn fragment_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Notebook / Cell / Output
// ---------------------------------------------------------------------------

/// An ordered sequence of cells. Position is the only identity a cell has.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Notebook {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub cells: Vec<Cell>,
}

impl Notebook {
    /// Read a notebook from an already-parsed JSON value.
    ///
    /// Non-object values (arrays, for instance) yield a notebook without cells.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(_) => Self::deserialize(value).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "unreadable notebook object, treating as empty");
                Self::default()
            }),
            _ => Self::default(),
        }
    }
}

/// One notebook cell, classified by its `cell_type`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawCell")]
pub enum Cell {
    /// Prose compiled through the markdown pipeline.
    Markdown { source: TextLines },
    /// Source code plus its captured outputs, in execution order.
    Code {
        source: TextLines,
        outputs: Vec<Output>,
    },
    /// Missing or unrecognized `cell_type` (e.g. `raw`).
    #[default]
    Other,
}

#[derive(Deserialize)]
struct RawCell {
    #[serde(default, deserialize_with = "lenient")]
    cell_type: Option<String>,
    #[serde(default)]
    source: TextLines,
    #[serde(default, deserialize_with = "lenient_seq")]
    outputs: Vec<Output>,
}

impl From<RawCell> for Cell {
    fn from(raw: RawCell) -> Self {
        match raw.cell_type.as_deref() {
            Some("markdown") => Cell::Markdown { source: raw.source },
            Some("code") => Cell::Code {
                source: raw.source,
                outputs: raw.outputs,
            },
            _ => Cell::Other,
        }
    }
}

/// A captured execution result attached to a code cell.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Output {
    /// `display_data`, `execute_result`, `stream`, ... (informational only).
    #[serde(default, deserialize_with = "lenient")]
    pub output_type: Option<String>,
    /// MIME bundle: MIME type to text fragments.
    #[serde(default, deserialize_with = "lenient")]
    pub data: BTreeMap<String, TextLines>,
}

impl Output {
    /// Concatenated fragments for `mime`, or an empty string when absent.
    pub fn mime_text(&self, mime: &str) -> String {
        self.data.get(mime).map(TextLines::concat).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Lenient field helpers
// ---------------------------------------------------------------------------

/// Deserialize `T`, falling back to `T::default()` when the shape is wrong.
fn lenient<'de, D, T>(de: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(de)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Deserialize a sequence element by element; bad elements become defaults,
/// a non-array becomes an empty sequence.
fn lenient_seq<'de, D, T>(de: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(de)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cells_classified_by_type() {
        let nb: Notebook = serde_json::from_value(json!({
            "cells": [
                { "cell_type": "markdown", "source": ["# Title"] },
                { "cell_type": "code", "source": ["print(1)"], "outputs": [] },
                { "cell_type": "raw", "source": ["raw"] },
                { "source": ["no type"] }
            ]
        }))
        .expect("deserialize");

        assert_eq!(nb.cells.len(), 4);
        assert!(matches!(nb.cells[0], Cell::Markdown { .. }));
        assert!(matches!(nb.cells[1], Cell::Code { .. }));
        assert_eq!(nb.cells[2], Cell::Other);
        assert_eq!(nb.cells[3], Cell::Other);
    }

    #[test]
    fn source_accepts_string_or_lines() {
        let nb = Notebook::from_value(&json!({
            "cells": [
                { "cell_type": "code", "source": "x = 1\ny = 2" },
                { "cell_type": "code", "source": ["a\n", "b"] }
            ]
        }));

        let Cell::Code { source, .. } = &nb.cells[0] else {
            panic!("expected code cell");
        };
        assert_eq!(source.join("\n"), "x = 1\ny = 2");

        let Cell::Code { source, .. } = &nb.cells[1] else {
            panic!("expected code cell");
        };
        // Lines already ending in a newline are joined verbatim.
        assert_eq!(source.join("\n"), "a\n\nb");
    }

    #[test]
    fn wrong_shapes_read_as_absent() {
        let nb = Notebook::from_value(&json!({ "cells": "not a list" }));
        assert!(nb.cells.is_empty());

        let nb = Notebook::from_value(&json!({
            "cells": [
                42,
                { "cell_type": 7, "source": ["x"] },
                { "cell_type": "code", "source": ["x"], "outputs": { "bad": true } }
            ]
        }));
        assert_eq!(nb.cells.len(), 3);
        assert_eq!(nb.cells[0], Cell::Other);
        assert_eq!(nb.cells[1], Cell::Other);
        let Cell::Code { outputs, .. } = &nb.cells[2] else {
            panic!("expected code cell");
        };
        assert!(outputs.is_empty());
    }

    #[test]
    fn non_object_notebook_is_empty() {
        assert!(Notebook::from_value(&json!([1, 2, 3])).cells.is_empty());
        assert!(Notebook::from_value(&json!({})).cells.is_empty());
    }

    #[test]
    fn output_mime_text_concatenates() {
        let output: Output = serde_json::from_value(json!({
            "output_type": "execute_result",
            "data": {
                "text/plain": ["line 1\n", "line 2"],
                "text/html": "<b>x</b>"
            }
        }))
        .expect("deserialize");

        assert_eq!(output.output_type.as_deref(), Some("execute_result"));
        assert_eq!(output.mime_text(MIME_PLAIN), "line 1\nline 2");
        assert_eq!(output.mime_text(MIME_HTML), "<b>x</b>");
        assert_eq!(output.mime_text("image/png"), "");
    }

    #[test]
    fn output_without_data_is_empty() {
        let output: Output = serde_json::from_value(json!({
            "output_type": "stream",
            "name": "stdout",
            "text": ["hello"]
        }))
        .expect("deserialize");

        assert!(output.data.is_empty());
        assert_eq!(output.mime_text(MIME_PLAIN), "");
    }
}

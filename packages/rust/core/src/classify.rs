//! Decides how a raw content value is processed.

use serde_json::Value;
use tracing::warn;

use nbcontent_shared::Notebook;

/// Processing path for one content value.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    /// Absent, scalar, null, or unparseable text: `{ type: "json", body: {} }`.
    EmptyJson,
    /// Textual JSON, passed through without notebook semantics.
    Json(Value),
    /// A structured notebook object, to be walked.
    Notebook(Notebook),
}

/// Classify `content` for the source unit `id`.
///
/// Never fails; malformed text is logged and degrades to [`Classified::EmptyJson`].
pub fn classify(id: &str, content: Option<&Value>) -> Classified {
    match content {
        None | Some(Value::Null | Value::Bool(_) | Value::Number(_)) => Classified::EmptyJson,
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Null) => Classified::EmptyJson,
            Ok(value) => Classified::Json(value),
            Err(e) => {
                warn!(id, error = %e, "content is not valid JSON, returning empty body");
                Classified::EmptyJson
            }
        },
        Some(value @ (Value::Object(_) | Value::Array(_))) => {
            Classified::Notebook(Notebook::from_value(value))
        }
    }
}

//! Documents and search results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A document submitted for indexing.
///
/// Identity is `(namespace, id)`: re-indexing the same id in the same
/// namespace overwrites the stored vector and payload. The `context` map is
/// opaque to the index; callers use it to carry structured metadata so
/// nothing ever needs to be re-parsed out of `text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Caller-supplied or generated id, unique within a namespace.
    pub id: String,
    /// The text that gets embedded.
    pub text: String,
    /// Opaque structured metadata stored alongside the vector.
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl Document {
    /// Create a document with an empty context.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            context: Map::new(),
        }
    }

    /// Attach a context entry.
    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }
}

/// A single search result.
///
/// `score` is cosine similarity between the query and the stored document,
/// clamped to `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// The document id.
    pub id: String,
    /// The stored document text.
    pub text: String,
    /// Similarity score in `[0, 1]`, higher is more similar.
    pub score: f32,
    /// The document's stored context.
    #[serde(default)]
    pub context: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_builder() {
        let doc = Document::new("d1", "some text")
            .with_context("kind", Value::String("note".to_string()));

        assert_eq!(doc.id, "d1");
        assert_eq!(doc.context.get("kind"), Some(&Value::String("note".into())));
    }

    #[test]
    fn test_document_context_defaults_empty() {
        let doc: Document = serde_json::from_str(r#"{"id":"a","text":"b"}"#).unwrap();
        assert!(doc.context.is_empty());
    }
}

//! Tool descriptors.
//!
//! Tools register with the assistant's tool registry and are indexed as
//! plain text documents so they can be retrieved semantically. The
//! structured fields are carried in the document context, so retrieval
//! resolves a hit back to its descriptor by id without re-parsing text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::document::Document;

/// A tool available to the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool name, e.g. `get_time`.
    pub name: String,
    /// One-sentence description shown to the LLM.
    pub description: String,
    /// Grouping category, e.g. `system` or `windows`.
    #[serde(default)]
    pub category: String,
    /// JSON-schema-like parameter map.
    #[serde(default = "empty_object")]
    pub parameters: Value,
    /// Lexical fallback keywords for near-miss semantic search.
    #[serde(default)]
    pub keywords: Vec<String>,
}

fn empty_object() -> Value {
    json!({})
}

impl ToolDescriptor {
    /// Create a descriptor with no parameters or keywords.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category: String::new(),
            parameters: empty_object(),
            keywords: Vec::new(),
        }
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the parameter schema.
    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set the fallback keywords.
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    /// The text that gets embedded for this tool.
    pub fn embedding_text(&self) -> String {
        let mut text = format!("{}: {}", self.name, self.description);
        if !self.category.is_empty() {
            text.push_str(&format!("\nCategory: {}", self.category));
        }
        if !self.keywords.is_empty() {
            text.push_str(&format!("\nKeywords: {}", self.keywords.join(", ")));
        }
        text
    }

    /// Convert to an indexable document.
    ///
    /// The id is the tool name; description, category, parameters and
    /// keywords go into the context map so the diff on re-index and the
    /// hit-to-descriptor resolution never touch the embedded text.
    pub fn to_document(&self) -> Document {
        let mut context = Map::new();
        context.insert("description".into(), Value::String(self.description.clone()));
        context.insert("category".into(), Value::String(self.category.clone()));
        context.insert("parameters".into(), self.parameters.clone());
        context.insert(
            "keywords".into(),
            Value::Array(self.keywords.iter().cloned().map(Value::String).collect()),
        );
        Document {
            id: self.name.clone(),
            text: self.embedding_text(),
            context,
        }
    }

    /// Whether an already-indexed context map still matches this descriptor.
    ///
    /// Used for diff-based re-indexing: an unchanged tool is not re-embedded.
    pub fn matches_context(&self, context: &Map<String, Value>) -> bool {
        context.get("description").and_then(Value::as_str) == Some(self.description.as_str())
            && context.get("parameters") == Some(&self.parameters)
            && context
                .get("keywords")
                .and_then(Value::as_array)
                .is_some_and(|kw| {
                    kw.iter().map(|v| v.as_str().unwrap_or_default()).eq(self
                        .keywords
                        .iter()
                        .map(String::as_str))
                })
    }

    /// Lexical keyword match against a user query.
    ///
    /// Catches tools whose semantic score falls below the search threshold:
    /// a keyword matches when it appears as a whole token of the query (or,
    /// for multi-word keywords, as a phrase).
    pub fn matches_query(&self, query: &str) -> bool {
        let query_lc = query.to_lowercase();
        let tokens: Vec<&str> = query_lc
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        self.keywords.iter().any(|kw| {
            let kw_lc = kw.to_lowercase();
            if kw_lc.contains(' ') {
                query_lc.contains(&kw_lc)
            } else {
                tokens.contains(&kw_lc.as_str())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_time_tool() -> ToolDescriptor {
        ToolDescriptor::new("get_time", "Get the current time")
            .with_category("system")
            .with_keywords(vec!["time".into(), "clock".into()])
    }

    #[test]
    fn test_embedding_text_leads_with_name() {
        let text = get_time_tool().embedding_text();
        assert!(text.starts_with("get_time: Get the current time"));
        assert!(text.contains("Keywords: time, clock"));
    }

    #[test]
    fn test_keyword_match_whole_token() {
        let tool = get_time_tool();
        assert!(tool.matches_query("what time is it"));
        assert!(tool.matches_query("Check the CLOCK please"));
        // "time" must be a whole token, not a substring
        assert!(!tool.matches_query("sometimes things happen"));
    }

    #[test]
    fn test_keyword_match_phrase() {
        let tool = ToolDescriptor::new("web_search", "Search the web")
            .with_keywords(vec!["look up".into()]);
        assert!(tool.matches_query("can you look up rust traits"));
        assert!(!tool.matches_query("look at this"));
    }

    #[test]
    fn test_to_document_carries_structured_context() {
        let tool = get_time_tool().with_parameters(json!({"timezone": {"type": "string"}}));
        let doc = tool.to_document();

        assert_eq!(doc.id, "get_time");
        assert_eq!(
            doc.context.get("parameters"),
            Some(&json!({"timezone": {"type": "string"}}))
        );
        assert!(tool.matches_context(&doc.context));
    }

    #[test]
    fn test_matches_context_detects_change() {
        let tool = get_time_tool();
        let mut context = tool.to_document().context;

        let mut changed = tool.clone();
        changed.description = "Get the current time and date".into();
        assert!(!changed.matches_context(&context));

        context.insert("keywords".into(), json!(["time"]));
        assert!(!tool.matches_context(&context));
    }
}

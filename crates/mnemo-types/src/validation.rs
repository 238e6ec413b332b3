//! Boundary validation for documents and namespaces.
//!
//! The retrieval client validates payloads before any network call, so a
//! malformed document fails fast with a descriptive error instead of
//! wasting a round trip.

use crate::document::Document;
use crate::tool::ToolDescriptor;

/// Maximum document id length.
pub const MAX_ID_LEN: usize = 256;

/// Maximum embeddable text length in bytes.
pub const MAX_TEXT_LEN: usize = 64 * 1024;

/// Maximum namespace name length.
pub const MAX_NAMESPACE_LEN: usize = 64;

/// Validation failures for retrieval payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Document id is empty.
    #[error("document id is empty")]
    EmptyId,

    /// Document id exceeds the length limit.
    #[error("document id is {0} chars, max is {MAX_ID_LEN}")]
    IdTooLong(usize),

    /// Document text is empty.
    #[error("document text is empty")]
    EmptyText,

    /// Document text exceeds the length limit.
    #[error("document text is {0} bytes, max is {MAX_TEXT_LEN}")]
    TextTooLong(usize),

    /// Namespace name is empty or malformed.
    #[error("invalid namespace {0:?}: must be 1-{MAX_NAMESPACE_LEN} chars of [a-z0-9_]")]
    InvalidNamespace(String),

    /// Two tools in one registry snapshot share a name.
    #[error("duplicate tool name {0:?}")]
    DuplicateTool(String),
}

/// Validate a namespace name: `[a-z0-9_]{1,64}`.
pub fn validate_namespace(namespace: &str) -> Result<(), ValidationError> {
    let ok = !namespace.is_empty()
        && namespace.len() <= MAX_NAMESPACE_LEN
        && namespace
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(ValidationError::InvalidNamespace(namespace.to_string()))
    }
}

/// Validate a document before it is sent for indexing.
pub fn validate_document(doc: &Document) -> Result<(), ValidationError> {
    if doc.id.is_empty() {
        return Err(ValidationError::EmptyId);
    }
    if doc.id.chars().count() > MAX_ID_LEN {
        return Err(ValidationError::IdTooLong(doc.id.chars().count()));
    }
    if doc.text.trim().is_empty() {
        return Err(ValidationError::EmptyText);
    }
    if doc.text.len() > MAX_TEXT_LEN {
        return Err(ValidationError::TextTooLong(doc.text.len()));
    }
    Ok(())
}

/// Validate a registry snapshot: every tool valid, names unique.
pub fn validate_tools(tools: &[ToolDescriptor]) -> Result<(), ValidationError> {
    let mut seen = std::collections::HashSet::new();
    for tool in tools {
        if !seen.insert(tool.name.as_str()) {
            return Err(ValidationError::DuplicateTool(tool.name.clone()));
        }
        validate_document(&tool.to_document())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_rules() {
        assert!(validate_namespace("tools").is_ok());
        assert!(validate_namespace("llm_memories").is_ok());
        assert!(validate_namespace("ns2").is_ok());

        assert!(validate_namespace("").is_err());
        assert!(validate_namespace("Tools").is_err());
        assert!(validate_namespace("a b").is_err());
        assert!(validate_namespace(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_document_limits() {
        assert!(validate_document(&Document::new("a", "text")).is_ok());
        assert_eq!(
            validate_document(&Document::new("", "text")),
            Err(ValidationError::EmptyId)
        );
        assert_eq!(
            validate_document(&Document::new("a", "   ")),
            Err(ValidationError::EmptyText)
        );
        assert!(matches!(
            validate_document(&Document::new("a", "x".repeat(MAX_TEXT_LEN + 1))),
            Err(ValidationError::TextTooLong(_))
        ));
    }

    #[test]
    fn test_duplicate_tool_names_rejected() {
        let tools = vec![
            ToolDescriptor::new("get_time", "Get the time"),
            ToolDescriptor::new("get_time", "Get the time again"),
        ];
        assert_eq!(
            validate_tools(&tools),
            Err(ValidationError::DuplicateTool("get_time".into()))
        );
    }
}

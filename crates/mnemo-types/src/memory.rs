//! Conversation memories.
//!
//! A [`MemoryDocument`] is one remembered item: a conversation turn, a fact
//! about the user, or something the assistant explicitly chose to keep. The
//! [`MemoryKind`] in its metadata routes it to a namespace at index time;
//! `importance` and `timestamp` feed the read-time relevance boost and do
//! not affect storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::Document;
use crate::namespace;

/// What kind of memory this is; decides the target namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// A memory the assistant explicitly decided to keep.
    LlmMemory,
    /// A fact about the user.
    UserInfo,
    /// General world knowledge.
    WorldFact,
    /// A short-lived fact expected to expire.
    VolatileInfo,
    /// An ordinary conversation turn.
    #[default]
    ConversationTurn,
}

impl MemoryKind {
    /// The namespace this kind of memory is stored in.
    pub fn namespace(self) -> &'static str {
        match self {
            Self::LlmMemory => namespace::LLM_MEMORIES,
            Self::UserInfo => namespace::USER_INFO,
            Self::WorldFact => namespace::WORLD_FACTS,
            Self::VolatileInfo => namespace::VOLATILE_INFO,
            Self::ConversationTurn => namespace::CONVERSATION_HISTORY,
        }
    }

    /// The kind stored in a given namespace, if it is a memory namespace.
    pub fn from_namespace(ns: &str) -> Option<Self> {
        match ns {
            namespace::LLM_MEMORIES => Some(Self::LlmMemory),
            namespace::USER_INFO => Some(Self::UserInfo),
            namespace::WORLD_FACTS => Some(Self::WorldFact),
            namespace::VOLATILE_INFO => Some(Self::VolatileInfo),
            namespace::CONVERSATION_HISTORY => Some(Self::ConversationTurn),
            _ => None,
        }
    }
}

/// Importance assigned when the memory was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Low,
    #[default]
    Normal,
    High,
}

/// Classification metadata for a memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MemoryMetadata {
    /// Kind, used for namespace routing.
    #[serde(rename = "type", default)]
    pub kind: MemoryKind,
    /// Importance, used for the read-time relevance boost.
    #[serde(default)]
    pub importance: Importance,
    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Structured context stored alongside a memory's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MemoryContext {
    /// When the memory was created. Stamped at index time when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Conversation the memory came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// The assistant's response in the originating turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Whether the memory expires.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_volatile: bool,
    /// Expiry for volatile memories; expired entries are filtered at read
    /// time, the index itself never evicts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Classification metadata.
    #[serde(default)]
    pub metadata: MemoryMetadata,
    /// Anything else the caller wants to carry along.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MemoryContext {
    /// Whether this memory is volatile and already expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.is_volatile && self.expires_at.is_some_and(|at| at < now)
    }
}

/// One memory to index or a memory recovered from a search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryDocument {
    /// Unique id within the target namespace.
    pub id: String,
    /// The embeddable text.
    pub text: String,
    /// Structured context.
    #[serde(default)]
    pub context: MemoryContext,
}

impl MemoryDocument {
    /// Create a memory with a fresh random id and default context.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: crate::new_id(),
            text: text.into(),
            context: MemoryContext::default(),
        }
    }

    /// Set the kind.
    pub fn with_kind(mut self, kind: MemoryKind) -> Self {
        self.context.metadata.kind = kind;
        self
    }

    /// Set the importance.
    pub fn with_importance(mut self, importance: Importance) -> Self {
        self.context.metadata.importance = importance;
        self
    }

    /// Set the creation timestamp.
    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.context.timestamp = Some(at);
        self
    }

    /// Mark volatile with an expiry.
    pub fn with_expiry(mut self, at: DateTime<Utc>) -> Self {
        self.context.is_volatile = true;
        self.context.expires_at = Some(at);
        self
    }

    /// The namespace this memory routes to.
    pub fn namespace(&self) -> &'static str {
        self.context.metadata.kind.namespace()
    }

    /// Convert to an indexable document, serializing the context map.
    pub fn to_document(&self) -> Document {
        let context = match serde_json::to_value(&self.context) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Document {
            id: self.id.clone(),
            text: self.text.clone(),
            context,
        }
    }

    /// Recover the structured context from a search hit's context map.
    pub fn context_from_hit(context: &Map<String, Value>) -> MemoryContext {
        serde_json::from_value(Value::Object(context.clone())).unwrap_or_default()
    }
}

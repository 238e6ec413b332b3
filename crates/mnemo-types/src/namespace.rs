//! Well-known namespaces and protection rules.
//!
//! A namespace is an independently searchable and clearable partition of
//! the index, created implicitly on first write. Search never crosses
//! namespace boundaries.

/// Indexed tool descriptions.
pub const TOOLS: &str = "tools";

/// Raw conversation turns.
pub const CONVERSATION_HISTORY: &str = "conversation_history";

/// Memories the assistant explicitly decided to keep.
pub const LLM_MEMORIES: &str = "llm_memories";

/// Facts about the user.
pub const USER_INFO: &str = "user_info";

/// General world knowledge picked up in conversation.
pub const WORLD_FACTS: &str = "world_facts";

/// Short-lived facts carrying an expiry in their context.
pub const VOLATILE_INFO: &str = "volatile_info";

/// All namespaces holding conversation memories, in search order.
pub const MEMORY_NAMESPACES: &[&str] = &[
    LLM_MEMORIES,
    USER_INFO,
    WORLD_FACTS,
    VOLATILE_INFO,
    CONVERSATION_HISTORY,
];

/// Whether a namespace is protected from the client's clear operation.
///
/// `llm_memories` holds deliberately saved memories; clearing it through
/// the ordinary clear path would be unrecoverable data loss, so the client
/// treats it as a warned no-op.
pub fn is_protected(namespace: &str) -> bool {
    namespace == LLM_MEMORIES
}

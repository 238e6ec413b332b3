//! Read-time relevance scoring for memory search results.
//!
//! Raw cosine scores are boosted by recency and importance, then clamped
//! back into `[0, 1]`. Boosting happens at read time only; nothing about
//! storage changes.

use chrono::{DateTime, Duration, Utc};

use mnemo_types::{Importance, namespace};

/// Multiplier for memories younger than the recency window.
pub const RECENCY_BOOST: f32 = 1.2;

/// Recency window in hours.
pub const RECENCY_WINDOW_HOURS: i64 = 24;

/// Multiplier for high-importance memories.
pub const IMPORTANCE_BOOST: f32 = 1.3;

/// Minimum raw score accepted from a namespace.
///
/// Conversation history is noisy, so it gets a higher floor than the
/// curated namespaces.
pub fn min_score_for(ns: &str) -> f32 {
    match ns {
        namespace::LLM_MEMORIES => 0.25,
        namespace::USER_INFO | namespace::WORLD_FACTS | namespace::VOLATILE_INFO => 0.3,
        namespace::CONVERSATION_HISTORY => 0.35,
        _ => 0.25,
    }
}

/// Boosted relevance: `min(1.0, score × recency × importance)`.
///
/// A memory with no timestamp gets no recency boost.
pub fn relevance(
    score: f32,
    timestamp: Option<DateTime<Utc>>,
    importance: Importance,
    now: DateTime<Utc>,
) -> f32 {
    let recency = match timestamp {
        Some(at) if now.signed_duration_since(at) < Duration::hours(RECENCY_WINDOW_HOURS) => {
            RECENCY_BOOST
        }
        _ => 1.0,
    };
    let importance = match importance {
        Importance::High => IMPORTANCE_BOOST,
        _ => 1.0,
    };
    (score * recency * importance).clamp(0.0, 1.0)
}

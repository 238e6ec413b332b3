//! Token-budgeted prompt assembly.
//!
//! The assembler merges the system instructions, matched tools, relevant
//! memories, and conversation history into a message list that always fits
//! the provider's context window. Budgeting order:
//!
//! 1. reserve system + current user text + a fixed safety buffer
//! 2. memories get a fixed fraction of what remains, emitted by category
//!    group until the fraction would be exceeded
//! 3. history fills the rest, newest-first, with at most one truncated
//!    message at the cut point
//!
//! The final message order is `[system, user, history oldest→newest]`:
//! the new user message sits ahead of the history it chronologically
//! follows. Downstream formatting relies on this layout, so it is kept
//! as-is rather than reordered.

use chrono::{DateTime, Utc};
use tracing::debug;

use mnemo_client::{ScoredMemory, ToolSearchBundle};
use mnemo_types::{ChatMessage, MemoryKind};

use crate::estimator::{HeuristicEstimator, TokenEstimator};
use crate::provider::Provider;

/// Default safety buffer reserved out of every budget.
pub const DEFAULT_SAFETY_BUFFER: usize = 200;

/// Default fraction of the context budget granted to memories.
pub const DEFAULT_MEMORY_FRACTION: f32 = 0.3;

/// Marker appended to a message truncated at the budget boundary.
pub const TRUNCATION_MARKER: &str = " …[truncated]";

/// Assembly configuration.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Target provider; bounds the window and picks the estimator ratio.
    pub provider: Provider,
    /// User-configured token limit; the effective limit is
    /// `min(this, provider ceiling)`.
    pub max_context_tokens: usize,
    /// Tokens held back from every budget.
    pub safety_buffer: usize,
    /// Fraction of the context budget granted to memories.
    pub memory_fraction: f32,
}

impl AssemblerConfig {
    /// Create a config for a provider with a user token limit.
    pub fn new(provider: Provider, max_context_tokens: usize) -> Self {
        Self {
            provider,
            max_context_tokens,
            safety_buffer: DEFAULT_SAFETY_BUFFER,
            memory_fraction: DEFAULT_MEMORY_FRACTION,
        }
    }

    /// Effective token limit.
    pub fn effective_max_tokens(&self) -> usize {
        self.max_context_tokens.min(self.provider.context_ceiling())
    }
}

/// The assembled, budget-checked prompt.
#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    /// `[system, user, history oldest→newest]`.
    pub messages: Vec<ChatMessage>,
    /// Estimated total tokens across all messages.
    pub estimated_tokens: usize,
    /// The effective limit the assembly was budgeted against.
    pub max_tokens: usize,
}

/// Provider-adapted payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderPayload {
    /// Structured chat messages, passed through unchanged.
    Chat(Vec<ChatMessage>),
    /// Single concatenated prompt for providers without chat format.
    Text(String),
}

/// Builds token-budgeted prompts.
pub struct PromptAssembler {
    config: AssemblerConfig,
    estimator: Box<dyn TokenEstimator>,
}

impl PromptAssembler {
    /// Create an assembler with the heuristic estimator for the provider.
    pub fn new(config: AssemblerConfig) -> Self {
        let estimator = Box::new(HeuristicEstimator::for_provider(config.provider));
        Self { config, estimator }
    }

    /// Swap in a different token estimator.
    pub fn with_estimator(mut self, estimator: Box<dyn TokenEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Estimated tokens for a text, using the configured estimator.
    pub fn estimate(&self, text: &str) -> usize {
        self.estimator.estimate(text)
    }

    /// Assemble the prompt.
    ///
    /// `memories` is the already-ranked output of the retrieval client;
    /// pass `None` when the memory service is unavailable. `now` is
    /// injected so assembly is deterministic under test.
    pub fn assemble(
        &self,
        user_text: &str,
        tools: &ToolSearchBundle,
        memories: Option<&[ScoredMemory]>,
        history: &[ChatMessage],
        now: DateTime<Utc>,
    ) -> AssembledPrompt {
        let max_tokens = self.config.effective_max_tokens();

        let base_system = self.build_system_message(tools, now);

        // Reserve system + user + safety buffer; the rest is context budget.
        let reserved = self.estimate(&base_system)
            + self.estimate(user_text)
            + self.config.safety_buffer;
        let context_budget = max_tokens.saturating_sub(reserved);

        // Memories take a fixed fraction of the context budget.
        let memory_budget =
            (context_budget as f32 * self.config.memory_fraction).floor() as usize;
        let (memory_section, memory_used) = match memories {
            Some(memories) if !memories.is_empty() => {
                self.build_memory_section(memories, memory_budget, now)
            }
            _ => (String::new(), 0),
        };

        let system = if memory_section.is_empty() {
            base_system
        } else {
            format!("{base_system}\n\n{memory_section}")
        };

        // History fills whatever the memories left over.
        let history_budget = context_budget.saturating_sub(memory_used);
        let history_messages = self.fit_history(history, history_budget);

        let mut messages = Vec::with_capacity(2 + history_messages.len());
        messages.push(ChatMessage::system(system));
        messages.push(ChatMessage::user(user_text));
        messages.extend(history_messages);

        let estimated_tokens = messages.iter().map(|m| self.estimate(&m.content)).sum();

        debug!(
            max_tokens,
            estimated_tokens,
            history_in = history.len(),
            history_kept = messages.len() - 2,
            "assembled prompt"
        );

        AssembledPrompt {
            messages,
            estimated_tokens,
            max_tokens,
        }
    }

    /// Collapse to a flat prompt for providers without chat support.
    pub fn format_for_provider(&self, messages: &[ChatMessage]) -> ProviderPayload {
        if self.config.provider.supports_chat_messages() {
            return ProviderPayload::Chat(messages.to_vec());
        }

        let mut text = String::new();
        for message in messages {
            text.push_str(message.role.label());
            text.push_str(": ");
            text.push_str(&message.content);
            text.push_str("\n\n");
        }
        text.push_str("Assistant:");
        ProviderPayload::Text(text)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Section builders
    // ─────────────────────────────────────────────────────────────────────────

    fn build_system_message(&self, tools: &ToolSearchBundle, now: DateTime<Utc>) -> String {
        let mut sections = vec![
            "You are a desktop assistant. Be concise and helpful.".to_string(),
        ];

        if !tools.raw_prompt.is_empty() {
            sections.push(tools.raw_prompt.clone());
            sections.push(
                "Deciding when to use a tool:\n\
                 - Use a tool when the request needs live system state, desktop control, \
                 or information you cannot know (current time, open windows, web content).\n\
                 - Answer directly for general knowledge, conversation, and anything the \
                 context already covers.\n\
                 - Never invent tool names or arguments not listed above."
                    .to_string(),
            );
        }

        sections.push(format!("Current time: {}", now.to_rfc3339()));
        sections.join("\n\n")
    }

    /// Build the memory section, greedily by category group, never
    /// exceeding `budget` estimated tokens. Returns the section and the
    /// tokens it consumed.
    fn build_memory_section(
        &self,
        memories: &[ScoredMemory],
        budget: usize,
        now: DateTime<Utc>,
    ) -> (String, usize) {
        // Drop expired volatiles here too: retrieval filtered at read time,
        // but the assembler may run later with a cached list.
        let mut live: Vec<&ScoredMemory> = memories
            .iter()
            .filter(|m| !m.context.is_expired(now))
            .collect();
        live.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));

        // Every piece is costed with its joining newline, so the estimate
        // of the concatenated section never exceeds the sum of the pieces.
        let mut used = self.estimate("\n\n# Memory");
        if used >= budget {
            return (String::new(), 0);
        }

        let mut lines = vec!["# Memory".to_string()];
        let mut wrote_any = false;

        'groups: for (category, header) in MEMORY_GROUPS {
            let group: Vec<&&ScoredMemory> = live
                .iter()
                .filter(|m| category_of(m.context.metadata.kind) == *category)
                .collect();
            if group.is_empty() {
                continue;
            }

            let header_cost = self.estimate(&format!("\n{header}"));
            if used + header_cost > budget {
                break;
            }
            let mut wrote_header = false;

            for memory in group {
                let line = format!("- {}", memory.text);
                let line_cost = self.estimate(&format!("\n{line}"));
                if !wrote_header {
                    if used + header_cost + line_cost > budget {
                        break 'groups;
                    }
                    lines.push(header.to_string());
                    used += header_cost;
                    wrote_header = true;
                }
                if used + line_cost > budget {
                    break 'groups;
                }
                lines.push(line);
                used += line_cost;
                wrote_any = true;
            }
        }

        if !wrote_any {
            return (String::new(), 0);
        }
        (lines.join("\n"), used)
    }

    /// Walk history newest-first, keeping whole messages that fit. The
    /// first message that does not fit may be truncated — once — when a
    /// meaningful amount of budget remains. Output is oldest-first.
    fn fit_history(&self, history: &[ChatMessage], budget: usize) -> Vec<ChatMessage> {
        let mut kept: Vec<ChatMessage> = Vec::new();
        let mut used = 0usize;

        for message in history.iter().rev() {
            let cost = self.estimate(&message.content);
            if used + cost <= budget {
                kept.push(message.clone());
                used += cost;
                continue;
            }

            let remaining = budget.saturating_sub(used);
            if remaining > self.config.safety_buffer {
                if let Some(truncated) = self.truncate_to_fit(&message.content, remaining) {
                    kept.push(ChatMessage {
                        role: message.role,
                        content: truncated,
                    });
                }
            }
            break;
        }

        kept.reverse();
        kept
    }

    /// Shrink `content` until `content + marker` fits in `remaining`
    /// estimated tokens. Returns `None` when nothing meaningful fits.
    fn truncate_to_fit(&self, content: &str, remaining: usize) -> Option<String> {
        let marker_cost = self.estimate(TRUNCATION_MARKER);
        if remaining <= marker_cost {
            return None;
        }

        // Proportional first guess, then shrink until the estimate agrees.
        let total_cost = self.estimate(content).max(1);
        let mut keep = content.len() * remaining / (total_cost + 1);
        keep = keep.min(content.len());

        loop {
            while keep > 0 && !content.is_char_boundary(keep) {
                keep -= 1;
            }
            if keep == 0 {
                return None;
            }
            let candidate = format!("{}{}", &content[..keep], TRUNCATION_MARKER);
            if self.estimate(&candidate) <= remaining {
                return Some(candidate);
            }
            keep = keep.saturating_sub(keep / 4 + 1);
        }
    }
}

/// Memory grouping for prompt emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemoryCategory {
    Personal,
    Volatile,
    Facts,
    History,
}

const MEMORY_GROUPS: &[(MemoryCategory, &str)] = &[
    (MemoryCategory::Personal, "## About the user"),
    (MemoryCategory::Volatile, "## Time-sensitive"),
    (MemoryCategory::Facts, "## Relevant facts"),
    (MemoryCategory::History, "## From earlier conversations"),
];

fn category_of(kind: MemoryKind) -> MemoryCategory {
    match kind {
        MemoryKind::UserInfo => MemoryCategory::Personal,
        MemoryKind::VolatileInfo => MemoryCategory::Volatile,
        MemoryKind::LlmMemory | MemoryKind::WorldFact => MemoryCategory::Facts,
        MemoryKind::ConversationTurn => MemoryCategory::History,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! LLM provider constants.
//!
//! Context ceilings are fixed constants reflecting known context-window
//! sizes; the chars-per-token ratios feed the heuristic estimator. Neither
//! is exact — the assembler treats them as budget inputs, not truth.

use serde::{Deserialize, Serialize};

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Anthropic,
    OpenAi,
    Gemini,
    /// Locally hosted via Ollama.
    Ollama,
    /// Locally hosted llama.cpp server.
    LlamaCpp,
}

impl Provider {
    /// Hard context-window ceiling in tokens.
    pub fn context_ceiling(self) -> usize {
        match self {
            Self::Anthropic => 200_000,
            Self::OpenAi => 128_000,
            Self::Gemini => 1_000_000,
            Self::Ollama => 8_192,
            Self::LlamaCpp => 4_096,
        }
    }

    /// Approximate characters per token for this provider's tokenizer.
    pub fn chars_per_token(self) -> f32 {
        match self {
            Self::Anthropic => 3.3,
            _ => 4.0,
        }
    }

    /// Whether the provider accepts a structured multi-message chat.
    ///
    /// The locally hosted backends take one flat prompt string instead.
    pub fn supports_chat_messages(self) -> bool {
        !matches!(self, Self::Ollama | Self::LlamaCpp)
    }

    /// Stable name, e.g. for CLI parsing.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
            Self::LlamaCpp => "llamacpp",
        }
    }

    /// Parse a provider name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "anthropic" => Some(Self::Anthropic),
            "openai" => Some(Self::OpenAi),
            "gemini" => Some(Self::Gemini),
            "ollama" => Some(Self::Ollama),
            "llamacpp" => Some(Self::LlamaCpp),
            _ => None,
        }
    }
}

//! Token-budgeted prompt assembly for mnemo.
//!
//! Takes the retrieval client's output — matched tools and ranked
//! memories — plus conversation history, and produces a message list that
//! provably fits the target provider's context window:
//!
//! ```text
//! query ─▶ tools bundle ──┐
//!          memories ──────┼─▶ PromptAssembler ─▶ [system, user, history]
//!          history ───────┘        │
//!                                  └─ format_for_provider (chat | flat text)
//! ```
//!
//! Token counting is a swappable [`TokenEstimator`]; the default heuristic
//! uses a provider-specific chars-per-token ratio with a flat 10%
//! overhead.

pub mod assembler;
pub mod estimator;
pub mod provider;

pub use assembler::{
    AssembledPrompt, AssemblerConfig, DEFAULT_MEMORY_FRACTION, DEFAULT_SAFETY_BUFFER,
    PromptAssembler, ProviderPayload, TRUNCATION_MARKER,
};
pub use estimator::{ESTIMATE_OVERHEAD, HeuristicEstimator, TokenEstimator};
pub use provider::Provider;

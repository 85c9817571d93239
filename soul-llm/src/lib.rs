//! # soul-llm — LLM-Backed Belief Evaluation for SOUL
//!
//! Realises the engine's pluggable belief evaluator against an LLM
//! backend:
//!   - **Ollama** (local, recommended default)
//!   - **OpenAI-compatible API** (also works with Anthropic, Together, etc.)
//!   - **None** — every call fails, the adapter degrades to neutral
//!
//! The evaluator contract is synchronous — it returns both emotion
//! deltas and belief impacts before control returns to the engine — so
//! this crate speaks blocking HTTP. Callers that need async evaluation
//! wrap the call site; the engine never surfaces a pending state.
//!
//! The adapter never lets a flaky model corrupt engine state: on any
//! transport, timeout, or parse failure it logs a warning and returns
//! the neutral evaluation, and it drops any belief index the model
//! fabricated.

pub mod client;
pub mod error;
pub mod evaluator;
pub mod prompt;
pub mod types;

pub use client::{LlmClient, LlmProvider};
pub use error::LlmError;
pub use evaluator::LlmEvaluator;
pub use types::{LlmRequest, LlmResponse, WireEvaluation};

//! Error types for the SOUL core library.

use thiserror::Error;

/// Top-level error type for all SOUL operations.
///
/// The `Unknown*` and `InvalidBeliefIndex` variants are programmer errors:
/// they fail loudly at the call site and are never coerced or retried.
#[derive(Error, Debug)]
pub enum SoulError {
    /// Interaction name not present in the registry's catalogue.
    #[error("Unknown interaction: {0}")]
    UnknownInteraction(String),

    /// Emotion label did not parse.
    #[error("Unknown emotion: {0}")]
    UnknownEmotion(String),

    /// Personality label did not parse.
    #[error("Unknown personality: {0}")]
    UnknownPersonality(String),

    /// Situation name not present in the registry's catalogue.
    #[error("Unknown situation: {0}")]
    UnknownSituation(String),

    /// Topic name not present in the registry's catalogue.
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    /// A belief index points outside the character's belief sequence.
    #[error("Invalid belief index {index} (character has {count} beliefs)")]
    InvalidBeliefIndex {
        /// The offending index.
        index: usize,
        /// How many beliefs the character holds.
        count: usize,
    },

    /// `evaluate` was called with no evaluator backend installed.
    #[error("No belief evaluator configured")]
    EvaluatorNotConfigured,

    /// An operation requires a layer that was never initialised on the
    /// character.
    #[error("Layer not initialized: {0}")]
    LayerNotInitialized(&'static str),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, SoulError>;

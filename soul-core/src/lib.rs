//! # SOUL Core Library
//!
//! Deterministic inner-life layer for non-player characters in
//! interactive narrative systems. Given interactions, scene
//! descriptions, and conversation text, it maintains queryable state
//! describing what a character feels, what they believe, what they
//! outwardly present, and how these have drifted over time — structured
//! signals for a downstream prompt builder or animation driver, never
//! dialogue itself.
//!
//! Every character is a [`Character`] bundle of six layered stores:
//!
//! - **Emotions** — eight clamped scalar affects with a single-pass
//!   cross-effect cascade and personality scaling
//! - **History** — EMA baselines with reference-reset shift detection
//!   (hedonic adaptation; Brickman & Campbell, 1971)
//! - **Presentation** — situation-and-person-masked facade with strain
//!   (surface acting; Hochschild, 1983)
//! - **Beliefs** — text+tag belief store with a pluggable evaluator
//! - **Erosion** — hidden pressure, tipping points, threshold hardening
//!   (inoculation; McGuire, 1964)
//! - **Triggers** — word-boundary keyword reactions with cooldowns and
//!   desensitisation (habituation; Thompson & Spencer, 1966)
//!
//! ## Determinism Contract
//!
//! Every formula is an ordinary multiply-add chain iterated in the
//! canonical [`Emotion::ALL`] order; given the same inputs and the same
//! registries, every operation reproduces bit-identical state. Time
//! enters only through an injected clock; the engine never reads the
//! wall clock on its own.
//!
//! ## Threading
//!
//! Operations on one character must be serialised by the host. Different
//! characters are independent; the shared [`Registry`] is immutable
//! after build and safe to share freely.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod belief;
pub mod character;
pub mod config;
pub mod emotion;
pub mod erosion;
pub mod error;
pub mod history;
pub mod persistence;
pub mod presentation;
pub mod registry;
pub mod trigger;
pub mod types;

pub use belief::{Belief, BeliefEvaluator, BeliefImpact, BeliefStore, Evaluation, KeywordEvaluator};
pub use character::{Character, CharacterBuilder, PostHook, TurnReport};
pub use config::SoulConfig;
pub use emotion::PreHook;
pub use erosion::{Direction, ErosionState, TippingEvent};
pub use error::{Result, SoulError};
pub use history::{EmotionSnapshot, HistoryState, ShiftRecord};
pub use persistence::{CharacterRecord, SqliteStore};
pub use presentation::PresentationState;
pub use registry::{Registry, RegistryBuilder, SituationSpec, TopicSpec};
pub use trigger::{FiredTopic, Sensitivity, TriggerState};
pub use types::{
    CharacterId, Emotion, EmotionDeltas, EmotionVector, PersonId, Personality, TimeSource,
    Timestamp,
};

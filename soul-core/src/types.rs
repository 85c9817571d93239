//! Core type definitions for the SOUL engine.
//!
//! All state types are serializable; the shared registries and the injected
//! clock are the only pieces of a character that are not.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SoulError;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Unique identifier for a character owned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterId(pub Uuid);

impl CharacterId {
    /// Create a new random character ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CharacterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a person a character may share a situation with.
///
/// People are opaque to the engine; they exist only as keys in the
/// presentation layer's per-person modifier table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonId(pub Uuid);

impl PersonId {
    /// Create a new random person ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PersonId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Monotonic numeric timestamp. Units are caller-defined (game ticks,
/// seconds, turns) — the engine only ever subtracts and compares them.
pub type Timestamp = f64;

/// Injected time source. The engine never reads wall-clock time itself;
/// the host supplies a parameterless, monotonically non-decreasing clock.
pub type TimeSource = Arc<dyn Fn() -> Timestamp + Send + Sync>;

/// A clock frozen at zero, for characters that never consult time-based
/// layers (or tests that drive time explicitly).
#[must_use]
pub fn zero_clock() -> TimeSource {
    Arc::new(|| 0.0)
}

// ---------------------------------------------------------------------------
// Emotions
// ---------------------------------------------------------------------------

/// The eight core emotions, in canonical order.
///
/// The declaration order *is* the engine's iteration order: every sparse
/// map is materialised against [`Emotion::ALL`] before summing, so all
/// floating-point accumulation is reproducible.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    /// General positive affect.
    Happiness,
    /// Hostile arousal.
    Anger,
    /// Perceived threat.
    Fear,
    /// Openness toward others.
    Trust,
    /// Physical and mental reserves.
    Energy,
    /// Felt social isolation.
    Loneliness,
    /// Diffuse unease.
    Anxiety,
    /// Belief in one's own competence.
    Confidence,
}

impl Emotion {
    /// All emotions in canonical order.
    pub const ALL: [Emotion; 8] = [
        Emotion::Happiness,
        Emotion::Anger,
        Emotion::Fear,
        Emotion::Trust,
        Emotion::Energy,
        Emotion::Loneliness,
        Emotion::Anxiety,
        Emotion::Confidence,
    ];

    /// Lowercase label, matching the serialized form.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Emotion::Happiness => "happiness",
            Emotion::Anger => "anger",
            Emotion::Fear => "fear",
            Emotion::Trust => "trust",
            Emotion::Energy => "energy",
            Emotion::Loneliness => "loneliness",
            Emotion::Anxiety => "anxiety",
            Emotion::Confidence => "confidence",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Emotion {
    type Err = SoulError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Emotion::ALL
            .iter()
            .copied()
            .find(|e| e.label() == s)
            .ok_or_else(|| SoulError::UnknownEmotion(s.to_string()))
    }
}

/// Clamp a core-emotion or pressure value to [-1, 1].
#[must_use]
pub(crate) fn clamp_signed(value: f32) -> f32 {
    value.clamp(-1.0, 1.0)
}

/// Clamp a strength-like value to [0, 1].
#[must_use]
pub(crate) fn clamp_unit(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Dense vector of all eight emotion values, each clamped to [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct EmotionVector([f32; 8]);

impl EmotionVector {
    /// All-zero (neutral) vector.
    #[must_use]
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Read one emotion value.
    #[must_use]
    pub fn get(&self, emotion: Emotion) -> f32 {
        self.0[emotion.index()]
    }

    /// Write one emotion value, clamping to [-1, 1].
    pub fn set(&mut self, emotion: Emotion, value: f32) {
        self.0[emotion.index()] = clamp_signed(value);
    }

    /// Add a delta to one emotion, clamping, and return the change that
    /// actually landed (zero once the value is saturated).
    pub fn add_clamped(&mut self, emotion: Emotion, delta: f32) -> f32 {
        let old = self.get(emotion);
        let new = clamp_signed(old + delta);
        self.0[emotion.index()] = new;
        new - old
    }

    /// Iterate `(emotion, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f32)> + '_ {
        Emotion::ALL.iter().map(move |&e| (e, self.get(e)))
    }
}

impl std::ops::Index<Emotion> for EmotionVector {
    type Output = f32;

    fn index(&self, emotion: Emotion) -> &f32 {
        &self.0[emotion.index()]
    }
}

/// Sparse emotion-to-delta mapping.
///
/// Backed by a `BTreeMap` keyed on [`Emotion`], whose `Ord` follows the
/// declaration order — iteration is always canonical.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmotionDeltas(BTreeMap<Emotion, f32>);

impl EmotionDeltas {
    /// Empty delta set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(emotion, delta)` pairs.
    #[must_use]
    pub fn from_pairs(pairs: &[(Emotion, f32)]) -> Self {
        let mut deltas = Self::new();
        for &(e, d) in pairs {
            deltas.set(e, d);
        }
        deltas
    }

    /// Delta for one emotion (0.0 when absent).
    #[must_use]
    pub fn get(&self, emotion: Emotion) -> f32 {
        self.0.get(&emotion).copied().unwrap_or(0.0)
    }

    /// Set the delta for one emotion.
    pub fn set(&mut self, emotion: Emotion, delta: f32) {
        self.0.insert(emotion, delta);
    }

    /// Accumulate onto the delta for one emotion.
    pub fn add(&mut self, emotion: Emotion, delta: f32) {
        *self.0.entry(emotion).or_insert(0.0) += delta;
    }

    /// Whether no deltas are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate `(emotion, delta)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f32)> + '_ {
        self.0.iter().map(|(&e, &d)| (e, d))
    }

    /// Every delta multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f32) -> Self {
        Self(self.0.iter().map(|(&e, &d)| (e, d * factor)).collect())
    }

    /// Sum of absolute deltas — the total magnitude of the set.
    #[must_use]
    pub fn magnitude(&self) -> f32 {
        self.0.values().map(|d| d.abs()).sum()
    }
}

// ---------------------------------------------------------------------------
// Personality
// ---------------------------------------------------------------------------

/// Immutable personality tag, fixed at character construction.
///
/// Indexes the registry's per-emotion multiplier table (how strongly
/// interactions land) and masking-ability table (how capably the
/// character fakes a presented state).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    /// Unremarkable baseline — every multiplier 1.0.
    #[default]
    Default,
    /// Amplified fear and anxiety, dampened confidence.
    Worrier,
    /// Amplified anger, dulled fear.
    Hothead,
    /// Dampened reactions across the board, excellent masking.
    Stoic,
    /// Amplified loneliness swings and warmth.
    Social,
}

impl Personality {
    /// All personalities.
    pub const ALL: [Personality; 5] = [
        Personality::Default,
        Personality::Worrier,
        Personality::Hothead,
        Personality::Stoic,
        Personality::Social,
    ];

    /// Lowercase label, matching the serialized form.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Personality::Default => "default",
            Personality::Worrier => "worrier",
            Personality::Hothead => "hothead",
            Personality::Stoic => "stoic",
            Personality::Social => "social",
        }
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Personality {
    type Err = SoulError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Personality::ALL
            .iter()
            .copied()
            .find(|p| p.label() == s)
            .ok_or_else(|| SoulError::UnknownPersonality(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emotion_vector_clamps_on_write() {
        let mut v = EmotionVector::neutral();
        v.set(Emotion::Fear, 3.0);
        assert!((v.get(Emotion::Fear) - 1.0).abs() < f32::EPSILON);
        v.set(Emotion::Fear, -3.0);
        assert!((v.get(Emotion::Fear) + 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn add_clamped_reports_actual_change() {
        let mut v = EmotionVector::neutral();
        v.set(Emotion::Happiness, 0.9);
        let actual = v.add_clamped(Emotion::Happiness, 0.5);
        assert!((actual - 0.1).abs() < 1e-6);
        assert!((v.get(Emotion::Happiness) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn deltas_iterate_in_canonical_order() {
        let mut d = EmotionDeltas::new();
        d.set(Emotion::Confidence, 0.1);
        d.set(Emotion::Happiness, 0.2);
        d.set(Emotion::Fear, 0.3);
        let order: Vec<Emotion> = d.iter().map(|(e, _)| e).collect();
        assert_eq!(
            order,
            vec![Emotion::Happiness, Emotion::Fear, Emotion::Confidence]
        );
    }

    #[test]
    fn emotion_parses_from_label() {
        for e in Emotion::ALL {
            assert_eq!(e.label().parse::<Emotion>().expect("parse"), e);
        }
        assert!("serenity".parse::<Emotion>().is_err());
    }

    #[test]
    fn personality_parses_from_label() {
        for p in Personality::ALL {
            assert_eq!(p.label().parse::<Personality>().expect("parse"), p);
        }
        assert!("melancholic".parse::<Personality>().is_err());
    }
}

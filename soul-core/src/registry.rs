//! Shared catalogues: interactions, cross-effects, personality tables,
//! situations, and trigger topics.
//!
//! A [`Registry`] is built once via [`RegistryBuilder`] — pre-populated
//! with the shipped defaults and extensible before `build()` — and is
//! immutable afterwards. Characters hold it behind an `Arc`; there are no
//! process globals. Topics keep their registration order so trigger scans
//! are reproducible.

use std::collections::{BTreeMap, HashMap};

use crate::error::{Result, SoulError};
use crate::types::{Emotion, EmotionDeltas, Personality};

/// A situation's per-emotion pull: the value it pushes the emotion toward
/// and how hard it pushes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SituationModifier {
    /// Value the situation pushes the emotion toward.
    pub bias: f32,
    /// How forcefully it pushes, in [0, 1].
    pub strength: f32,
}

/// A named situation: the set of emotions it modifies.
///
/// Emotions not listed pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct SituationSpec {
    /// Per-emotion pulls, in canonical emotion order.
    pub modifiers: BTreeMap<Emotion, SituationModifier>,
}

impl SituationSpec {
    /// Build from `(emotion, bias, strength)` triples.
    #[must_use]
    pub fn from_triples(triples: &[(Emotion, f32, f32)]) -> Self {
        let mut modifiers = BTreeMap::new();
        for &(e, bias, strength) in triples {
            modifiers.insert(e, SituationModifier { bias, strength });
        }
        Self { modifiers }
    }
}

/// A named trigger topic: the keywords that fire it and the emotion
/// deltas it applies by default.
#[derive(Debug, Clone)]
pub struct TopicSpec {
    /// Keywords matched with word-boundary semantics, lowercase.
    pub keywords: Vec<String>,
    /// Deltas applied when the topic fires (before per-character
    /// overrides and sensitivity scaling).
    pub deltas: EmotionDeltas,
}

/// Immutable-after-build catalogue bundle shared by all characters.
#[derive(Debug)]
pub struct Registry {
    interactions: HashMap<String, EmotionDeltas>,
    cross_effects: BTreeMap<Emotion, EmotionDeltas>,
    multipliers: HashMap<Personality, BTreeMap<Emotion, f32>>,
    masking: HashMap<Personality, f32>,
    situations: HashMap<String, SituationSpec>,
    topic_order: Vec<String>,
    topics: HashMap<String, TopicSpec>,
}

impl Registry {
    /// Start a builder pre-populated with the shipped catalogues.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::with_defaults()
    }

    /// Base deltas for a named interaction.
    ///
    /// # Errors
    /// `UnknownInteraction` when the name is not catalogued.
    pub fn interaction(&self, name: &str) -> Result<&EmotionDeltas> {
        self.interactions
            .get(name)
            .ok_or_else(|| SoulError::UnknownInteraction(name.to_string()))
    }

    /// Cross-effect factors radiating from `source`, if any.
    #[must_use]
    pub fn cross_effects(&self, source: Emotion) -> Option<&EmotionDeltas> {
        self.cross_effects.get(&source)
    }

    /// Personality multiplier for one emotion (1.0 when unspecified).
    #[must_use]
    pub fn multiplier(&self, personality: Personality, emotion: Emotion) -> f32 {
        self.multipliers
            .get(&personality)
            .and_then(|m| m.get(&emotion))
            .copied()
            .unwrap_or(1.0)
    }

    /// Masking ability for a personality, in [0, 1].
    #[must_use]
    pub fn masking(&self, personality: Personality) -> f32 {
        self.masking.get(&personality).copied().unwrap_or(0.5)
    }

    /// Situation spec by name.
    ///
    /// # Errors
    /// `UnknownSituation` when the name is not catalogued.
    pub fn situation(&self, name: &str) -> Result<&SituationSpec> {
        self.situations
            .get(name)
            .ok_or_else(|| SoulError::UnknownSituation(name.to_string()))
    }

    /// Topic spec by name.
    ///
    /// # Errors
    /// `UnknownTopic` when the name is not catalogued.
    pub fn topic(&self, name: &str) -> Result<&TopicSpec> {
        self.topics
            .get(name)
            .ok_or_else(|| SoulError::UnknownTopic(name.to_string()))
    }

    /// Iterate `(name, spec)` topic pairs in registration order.
    pub fn topics(&self) -> impl Iterator<Item = (&str, &TopicSpec)> + '_ {
        self.topic_order
            .iter()
            .filter_map(move |name| self.topics.get(name).map(|t| (name.as_str(), t)))
    }
}

/// Builder for [`Registry`]. Mutation is only safe before the first
/// character is constructed; `build()` enforces that by consuming the
/// builder and producing an immutable value.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    interactions: HashMap<String, EmotionDeltas>,
    cross_effects: BTreeMap<Emotion, EmotionDeltas>,
    multipliers: HashMap<Personality, BTreeMap<Emotion, f32>>,
    masking: HashMap<Personality, f32>,
    situations: HashMap<String, SituationSpec>,
    topic_order: Vec<String>,
    topics: HashMap<String, TopicSpec>,
}

impl RegistryBuilder {
    /// An empty builder with no catalogues at all (tests, exotic hosts).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A builder pre-populated with the shipped interaction, cross-effect,
    /// personality, situation, and topic catalogues.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn with_defaults() -> Self {
        use Emotion::{
            Anger, Anxiety, Confidence, Energy, Fear, Happiness, Loneliness, Trust,
        };

        let mut builder = Self::empty();

        // Interaction catalogue.
        builder = builder
            .interaction(
                "social",
                EmotionDeltas::from_pairs(&[
                    (Happiness, 0.15),
                    (Loneliness, -0.25),
                    (Trust, 0.10),
                    (Energy, -0.05),
                ]),
            )
            .interaction(
                "conflict",
                EmotionDeltas::from_pairs(&[
                    (Anger, 0.30),
                    (Trust, -0.15),
                    (Happiness, -0.15),
                    (Energy, -0.10),
                    (Anxiety, 0.10),
                ]),
            )
            .interaction(
                "achievement",
                EmotionDeltas::from_pairs(&[
                    (Happiness, 0.25),
                    (Confidence, 0.30),
                    (Energy, 0.10),
                    (Anxiety, -0.10),
                ]),
            )
            .interaction(
                "loss",
                EmotionDeltas::from_pairs(&[
                    (Happiness, -0.30),
                    (Loneliness, 0.20),
                    (Energy, -0.15),
                    (Trust, -0.05),
                ]),
            )
            .interaction(
                "rest",
                EmotionDeltas::from_pairs(&[
                    (Energy, 0.30),
                    (Anxiety, -0.15),
                    (Anger, -0.10),
                ]),
            )
            .interaction(
                "threat",
                EmotionDeltas::from_pairs(&[
                    (Fear, 0.35),
                    (Anxiety, 0.25),
                    (Anger, 0.10),
                    (Trust, -0.10),
                    (Energy, 0.05),
                ]),
            );

        // Cross-effects. Factors stay small (|factor| <= 0.3) so a single
        // pass over the base deltas is already bounded.
        builder = builder
            .cross_effect(Fear, Anxiety, 0.3)
            .cross_effect(Fear, Confidence, -0.2)
            .cross_effect(Fear, Trust, -0.1)
            .cross_effect(Anger, Happiness, -0.2)
            .cross_effect(Anger, Trust, -0.15)
            .cross_effect(Anger, Energy, 0.1)
            .cross_effect(Happiness, Energy, 0.2)
            .cross_effect(Happiness, Anxiety, -0.15)
            .cross_effect(Happiness, Confidence, 0.1)
            .cross_effect(Loneliness, Happiness, -0.2)
            .cross_effect(Loneliness, Anxiety, 0.1)
            .cross_effect(Trust, Anxiety, -0.1)
            .cross_effect(Confidence, Anxiety, -0.2)
            .cross_effect(Confidence, Fear, -0.1)
            .cross_effect(Anxiety, Energy, -0.1)
            .cross_effect(Anxiety, Happiness, -0.1);

        // Personality multipliers (unlisted pairs default to 1.0).
        builder = builder
            .personality_multiplier(Personality::Worrier, Fear, 1.5)
            .personality_multiplier(Personality::Worrier, Anxiety, 1.6)
            .personality_multiplier(Personality::Worrier, Happiness, 0.8)
            .personality_multiplier(Personality::Worrier, Confidence, 0.7)
            .personality_multiplier(Personality::Hothead, Anger, 1.6)
            .personality_multiplier(Personality::Hothead, Fear, 0.7)
            .personality_multiplier(Personality::Hothead, Anxiety, 0.8)
            .personality_multiplier(Personality::Hothead, Energy, 1.2)
            .personality_multiplier(Personality::Stoic, Anger, 0.5)
            .personality_multiplier(Personality::Stoic, Fear, 0.5)
            .personality_multiplier(Personality::Stoic, Happiness, 0.7)
            .personality_multiplier(Personality::Stoic, Anxiety, 0.4)
            .personality_multiplier(Personality::Stoic, Loneliness, 0.8)
            .personality_multiplier(Personality::Social, Loneliness, 1.4)
            .personality_multiplier(Personality::Social, Happiness, 1.2)
            .personality_multiplier(Personality::Social, Trust, 1.2)
            .personality_multiplier(Personality::Social, Energy, 1.1);

        // Masking ability.
        builder = builder
            .masking_ability(Personality::Default, 0.5)
            .masking_ability(Personality::Stoic, 0.9)
            .masking_ability(Personality::Hothead, 0.2)
            .masking_ability(Personality::Worrier, 0.3)
            .masking_ability(Personality::Social, 0.6);

        // Situation catalogue.
        builder = builder
            .situation(
                "loud_party",
                SituationSpec::from_triples(&[
                    (Happiness, 0.5, 0.4),
                    (Energy, 0.3, 0.3),
                ]),
            )
            .situation(
                "quiet_library",
                SituationSpec::from_triples(&[
                    (Anxiety, -0.1, 0.2),
                    (Energy, -0.2, 0.3),
                ]),
            )
            .situation(
                "formal_audience",
                SituationSpec::from_triples(&[
                    (Anger, -0.4, 0.6),
                    (Fear, -0.2, 0.5),
                ]),
            )
            .situation(
                "funeral",
                SituationSpec::from_triples(&[
                    (Happiness, -0.4, 0.7),
                    (Energy, -0.3, 0.5),
                ]),
            );

        // Topic registry.
        builder = builder
            .topic(
                "father",
                &["father", "dad", "papa"],
                EmotionDeltas::from_pairs(&[
                    (Happiness, -0.1),
                    (Loneliness, 0.1),
                    (Anxiety, 0.15),
                ]),
            )
            .topic(
                "abandonment",
                &["abandoned", "left me", "walked out"],
                EmotionDeltas::from_pairs(&[
                    (Loneliness, 0.2),
                    (Fear, 0.1),
                    (Trust, -0.1),
                ]),
            )
            .topic(
                "war",
                &["war", "battle", "soldiers"],
                EmotionDeltas::from_pairs(&[
                    (Fear, 0.2),
                    (Anxiety, 0.15),
                    (Energy, 0.05),
                ]),
            )
            .topic(
                "betrayal",
                &["betrayed", "lied to", "deceived"],
                EmotionDeltas::from_pairs(&[
                    (Anger, 0.2),
                    (Trust, -0.2),
                    (Anxiety, 0.1),
                ]),
            )
            .topic(
                "death",
                &["died", "funeral", "grave"],
                EmotionDeltas::from_pairs(&[
                    (Happiness, -0.15),
                    (Fear, 0.1),
                    (Loneliness, 0.1),
                ]),
            );

        builder
    }

    /// Add or replace an interaction.
    #[must_use]
    pub fn interaction(mut self, name: &str, deltas: EmotionDeltas) -> Self {
        self.interactions.insert(name.to_string(), deltas);
        self
    }

    /// Add or replace one cross-effect factor.
    #[must_use]
    pub fn cross_effect(mut self, source: Emotion, target: Emotion, factor: f32) -> Self {
        self.cross_effects
            .entry(source)
            .or_default()
            .set(target, factor);
        self
    }

    /// Set one personality multiplier.
    #[must_use]
    pub fn personality_multiplier(
        mut self,
        personality: Personality,
        emotion: Emotion,
        factor: f32,
    ) -> Self {
        self.multipliers
            .entry(personality)
            .or_default()
            .insert(emotion, factor);
        self
    }

    /// Set a personality's masking ability, clamped to [0, 1].
    #[must_use]
    pub fn masking_ability(mut self, personality: Personality, ability: f32) -> Self {
        self.masking
            .insert(personality, ability.clamp(0.0, 1.0));
        self
    }

    /// Add or replace a situation.
    #[must_use]
    pub fn situation(mut self, name: &str, spec: SituationSpec) -> Self {
        self.situations.insert(name.to_string(), spec);
        self
    }

    /// Add or replace a topic. Keywords are lowercased on entry; the
    /// topic keeps its first registration position in scan order.
    #[must_use]
    pub fn topic(mut self, name: &str, keywords: &[&str], deltas: EmotionDeltas) -> Self {
        if !self.topics.contains_key(name) {
            self.topic_order.push(name.to_string());
        }
        self.topics.insert(
            name.to_string(),
            TopicSpec {
                keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
                deltas,
            },
        );
        self
    }

    /// Freeze the catalogues into an immutable [`Registry`].
    #[must_use]
    pub fn build(self) -> Registry {
        Registry {
            interactions: self.interactions,
            cross_effects: self.cross_effects,
            multipliers: self.multipliers,
            masking: self.masking,
            situations: self.situations,
            topic_order: self.topic_order,
            topics: self.topics,
        }
    }
}

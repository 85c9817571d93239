//! Presented emotions — situational masking and its strain.
//!
//! What a character shows is not what they feel. While a situation is
//! active, each listed emotion is lerped from its core value toward the
//! situation's bias, weighted by the situation's strength and the
//! personality's masking ability — surface acting in Hochschild's (1983)
//! sense. The gap between felt and shown is exposed as *masking strain*.
//!
//! The presented vector is a derived cache: it is recomputed whenever
//! the situation changes or a core emotion changes while a situation is
//! active, and it is never a source of truth.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::config::PresentationTuning;
use crate::registry::Registry;
use crate::types::{clamp_unit, Emotion, EmotionVector, PersonId, Personality};

/// One person's pull on one presented emotion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonModifier {
    /// Added to the situation's bias for this emotion.
    pub bias: f32,
    /// Competes (by max) with the situation's strength.
    pub strength: f32,
}

/// Per-character presentation state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PresentationState {
    active_situation: Option<String>,
    /// Derived cache, rebuilt on demand — not persisted.
    #[serde(skip)]
    presented: Option<EmotionVector>,
    person_modifiers: HashMap<PersonId, BTreeMap<Emotion, PersonModifier>>,
    present: Vec<PersonId>,
}

impl PresentationState {
    /// Fresh state with no active situation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the active situation, if any.
    #[must_use]
    pub fn active_situation(&self) -> Option<&str> {
        self.active_situation.as_deref()
    }

    /// People currently sharing the situation.
    #[must_use]
    pub fn present(&self) -> &[PersonId] {
        &self.present
    }

    /// Register (or replace) one person's modifier on one emotion.
    pub fn set_person_modifier(
        &mut self,
        person: PersonId,
        emotion: Emotion,
        bias: f32,
        strength: f32,
    ) {
        self.person_modifiers.entry(person).or_default().insert(
            emotion,
            PersonModifier {
                bias,
                strength: clamp_unit(strength),
            },
        );
    }

    /// Enter a situation with the given people present. The caller has
    /// already validated the name against the registry.
    pub fn enter(
        &mut self,
        situation: &str,
        people: &[PersonId],
        core: &EmotionVector,
        personality: Personality,
        registry: &Registry,
    ) {
        self.active_situation = Some(situation.to_string());
        self.present = people.to_vec();
        self.recompute(core, personality, registry);
    }

    /// Leave the current situation; the facade drops, people disperse.
    pub fn leave(&mut self) {
        self.active_situation = None;
        self.present.clear();
        self.presented = None;
    }

    /// Rebuild the presented vector from core + situation + people.
    ///
    /// `presented[e] = clamp(core[e] + (bias[e] - core[e]) * strength[e] * masking)`
    ///
    /// Person modifiers stack asymmetrically: biases add (directional
    /// pressure composes), strengths take the max (effort is dominated
    /// by the single strongest source). A person modifier may target an
    /// emotion the situation does not list; it composes onto a zero
    /// bias, zero strength base.
    pub fn recompute(
        &mut self,
        core: &EmotionVector,
        personality: Personality,
        registry: &Registry,
    ) {
        let Some(name) = self.active_situation.as_deref() else {
            self.presented = None;
            return;
        };
        let Ok(spec) = registry.situation(name) else {
            self.presented = None;
            return;
        };
        let masking = registry.masking(personality);

        let mut effective: BTreeMap<Emotion, (f32, f32)> = spec
            .modifiers
            .iter()
            .map(|(&e, m)| (e, (m.bias, m.strength)))
            .collect();
        for person in &self.present {
            if let Some(mods) = self.person_modifiers.get(person) {
                for (&e, m) in mods {
                    let entry = effective.entry(e).or_insert((0.0, 0.0));
                    entry.0 += m.bias;
                    entry.1 = entry.1.max(m.strength);
                }
            }
        }

        let mut presented = *core;
        for (e, (bias, strength)) in effective {
            let value = core.get(e) + (bias - core.get(e)) * strength * masking;
            presented.set(e, value);
        }
        self.presented = Some(presented);
    }

    /// The outward-facing emotion vector. Identical to core when no
    /// situation is active.
    #[must_use]
    pub fn perceived(&self, core: &EmotionVector) -> EmotionVector {
        self.presented.unwrap_or(*core)
    }

    /// Mean felt-vs-shown gap, normalised so an average gap of
    /// `tuning.strain_normalizer` saturates at 1. Zero with no active
    /// situation.
    #[must_use]
    pub fn masking_strain(&self, core: &EmotionVector, tuning: &PresentationTuning) -> f32 {
        let Some(presented) = &self.presented else {
            return 0.0;
        };
        let gap_sum: f32 = Emotion::ALL
            .iter()
            .map(|&e| (core.get(e) - presented.get(e)).abs())
            .sum();
        let mean = gap_sum / Emotion::ALL.len() as f32;
        clamp_unit(mean / tuning.strain_normalizer)
    }
}

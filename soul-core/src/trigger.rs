//! Keyword triggers — fast, surface-level reactions to text.
//!
//! Topics are scanned with word-boundary semantics so "father" never
//! fires inside "grandfather". Each firing routes deltas through the
//! hook-less nudge path, then starts a turn-based cooldown. Characters
//! with a configured sensitivity desensitise a little on every firing —
//! habituation in the Thompson & Spencer (1966) sense — down to a floor
//! that is never crossed.

use std::collections::HashMap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::emotion::nudge;
use crate::error::{Result, SoulError};
use crate::registry::Registry;
use crate::types::{EmotionDeltas, EmotionVector, Personality};

/// Per-character sensitivity to one topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sensitivity {
    /// Deltas that replace the topic's defaults, if set.
    pub override_deltas: Option<EmotionDeltas>,
    /// Current reaction scale. Never drops below `min_intensity`.
    pub intensity: f32,
    /// Intensity lost per firing.
    pub desensitize_rate: f32,
    /// Floor for intensity.
    pub min_intensity: f32,
    /// How many times the topic has fired for this character.
    pub times_triggered: u32,
}

impl Sensitivity {
    /// A sensitivity with the given starting intensity, loss per firing,
    /// and floor. Intensity is raised to the floor if below it.
    #[must_use]
    pub fn new(intensity: f32, desensitize_rate: f32, min_intensity: f32) -> Self {
        Self {
            override_deltas: None,
            intensity: intensity.max(min_intensity),
            desensitize_rate,
            min_intensity,
            times_triggered: 0,
        }
    }

    /// Replace the topic's default deltas for this character.
    #[must_use]
    pub fn with_override(mut self, deltas: EmotionDeltas) -> Self {
        self.override_deltas = Some(deltas);
        self
    }
}

/// A topic that fired, with the deltas that actually landed after
/// sensitivity and personality scaling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiredTopic {
    /// Topic name.
    pub topic: String,
    /// Post-clamp applied deltas, one entry per delta the topic carries.
    pub applied: EmotionDeltas,
}

/// Per-character trigger state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerState {
    sensitivities: HashMap<String, Sensitivity>,
    cooldowns: HashMap<String, u32>,
    /// Turns a topic stays silent after firing.
    pub cooldown_turns: u32,
}

impl TriggerState {
    /// Fresh state with the given sensitivity overrides and cooldown span.
    #[must_use]
    pub fn new(sensitivities: HashMap<String, Sensitivity>, cooldown_turns: u32) -> Self {
        Self {
            sensitivities,
            cooldowns: HashMap::new(),
            cooldown_turns,
        }
    }

    /// Sensitivity for a topic, if configured.
    #[must_use]
    pub fn sensitivity(&self, topic: &str) -> Option<&Sensitivity> {
        self.sensitivities.get(topic)
    }

    /// Remaining cooldown turns for a topic (zero when ready).
    #[must_use]
    pub fn cooldown(&self, topic: &str) -> u32 {
        self.cooldowns.get(topic).copied().unwrap_or(0)
    }

    /// Advance one conversational turn: every positive cooldown drops by
    /// one, zeroes stay put.
    pub fn advance_turn(&mut self) {
        for remaining in self.cooldowns.values_mut() {
            *remaining = remaining.saturating_sub(1);
        }
    }

    /// Configured sensitivities ranked by current intensity, highest
    /// first (name breaks ties for reproducibility).
    #[must_use]
    pub fn sensitive_topics(&self) -> Vec<(String, f32)> {
        let mut topics: Vec<(String, f32)> = self
            .sensitivities
            .iter()
            .map(|(name, s)| (name.clone(), s.intensity))
            .collect();
        topics.sort_by(|a, b| {
            OrderedFloat(b.1)
                .cmp(&OrderedFloat(a.1))
                .then_with(|| a.0.cmp(&b.0))
        });
        topics
    }
}

/// Whether `keyword` occurs in `haystack` bounded by non-word characters
/// on both sides. Both inputs must already be lowercase. A word
/// character is alphanumeric or underscore; multi-word keywords match as
/// a literal substring between boundaries.
#[must_use]
pub(crate) fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    if keyword.is_empty() {
        return false;
    }
    let mut search_from = 0;
    while let Some(offset) = haystack[search_from..].find(keyword) {
        let start = search_from + offset;
        let end = start + keyword.len();
        let left_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !is_word_char(c));
        let right_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !is_word_char(c));
        if left_ok && right_ok {
            return true;
        }
        // Step past this occurrence and keep scanning.
        search_from = start + keyword.chars().next().map_or(1, char::len_utf8);
    }
    false
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn fire(
    state: &mut TriggerState,
    registry: &Registry,
    emotions: &mut EmotionVector,
    personality: Personality,
    topic: &str,
) -> FiredTopic {
    let spec_deltas = registry
        .topic(topic)
        .map(|spec| spec.deltas.clone())
        .unwrap_or_default();

    let (deltas, intensity) = match state.sensitivities.get(topic) {
        Some(s) => (
            s.override_deltas.clone().unwrap_or(spec_deltas),
            s.intensity,
        ),
        None => (spec_deltas, 1.0),
    };

    let mut applied = EmotionDeltas::new();
    for (emotion, delta) in deltas.iter() {
        applied.set(
            emotion,
            nudge(emotions, registry, personality, emotion, delta * intensity),
        );
    }

    if let Some(s) = state.sensitivities.get_mut(topic) {
        s.times_triggered += 1;
        s.intensity = (s.intensity - s.desensitize_rate).max(s.min_intensity);
    }
    state.cooldowns.insert(topic.to_string(), state.cooldown_turns);

    FiredTopic {
        topic: topic.to_string(),
        applied,
    }
}

/// Scan `text` against every topic not on cooldown, firing each topic on
/// its first keyword hit. Topics are visited in registration order, so
/// the fired list is reproducible.
pub fn process_text(
    state: &mut TriggerState,
    registry: &Registry,
    emotions: &mut EmotionVector,
    personality: Personality,
    text: &str,
) -> Vec<FiredTopic> {
    let lowered = text.to_lowercase();
    let ready: Vec<String> = registry
        .topics()
        .filter(|(name, spec)| {
            state.cooldown(name) == 0
                && spec
                    .keywords
                    .iter()
                    .any(|k| contains_keyword(&lowered, k))
        })
        .map(|(name, _)| name.to_string())
        .collect();

    ready
        .iter()
        .map(|name| fire(state, registry, emotions, personality, name))
        .collect()
}

/// Fire a topic directly, bypassing the keyword scan but honouring the
/// cooldown. Returns `None` when the topic is cooling down.
///
/// # Errors
/// `UnknownTopic` when the name is not catalogued.
pub fn trigger_topic(
    state: &mut TriggerState,
    registry: &Registry,
    emotions: &mut EmotionVector,
    personality: Personality,
    topic: &str,
) -> Result<Option<FiredTopic>> {
    if registry.topic(topic).is_err() {
        return Err(SoulError::UnknownTopic(topic.to_string()));
    }
    if state.cooldown(topic) > 0 {
        return Ok(None);
    }
    Ok(Some(fire(state, registry, emotions, personality, topic)))
}

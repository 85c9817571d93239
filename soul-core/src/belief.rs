//! Beliefs — what a character holds true, and how hard it is to move.
//!
//! Belief text is opaque to the engine; tags are the only part the
//! default evaluator reads. Beliefs live in an ordered sequence and are
//! addressed by stable index — never reordered — so impact tables built
//! against old indices stay valid for the character's lifetime.
//!
//! Gradual change goes through the erosion layer; discontinuous change
//! goes through [`BeliefStore::apply_shock`], gated by inertia. A belief
//! that has been shaken once cracks slightly (its inertia drops), an
//! engine-side echo of dissonance reduction (Festinger, 1957).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::erosion::{Direction, ErosionState};
use crate::error::{Result, SoulError};
use crate::types::{clamp_unit, Emotion, EmotionDeltas, EmotionVector};

/// How much a shock weakens inertia once it lands.
const SHOCK_CRACK: f32 = 0.05;

/// A single held belief with its hidden erosion state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Belief {
    /// Natural-language statement of the belief. Opaque to the engine.
    pub text: String,
    /// Conviction, in [0, 1].
    pub strength: f32,
    /// Resistance to discontinuous change, in [0, 1].
    pub inertia: f32,
    /// Short symbolic labels used for filtering and by the default
    /// keyword evaluator.
    pub tags: Vec<String>,
    /// Hidden accumulated-pressure state.
    pub erosion: ErosionState,
}

impl Belief {
    /// Create a belief with default erosion state. Strength and inertia
    /// are clamped to [0, 1].
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        strength: f32,
        inertia: f32,
        tags: Vec<String>,
    ) -> Self {
        Self {
            text: text.into(),
            strength: clamp_unit(strength),
            inertia: clamp_unit(inertia),
            tags,
            erosion: ErosionState::default(),
        }
    }

    /// Whether the belief carries the given tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Evaluator verdict on one belief for one scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeliefImpact {
    /// The scene contradicted the belief.
    Challenged,
    /// The scene confirmed the belief.
    Reinforced,
    /// The scene did not bear on the belief.
    Neutral,
}

/// The two outputs of a belief evaluation: emotion deltas to route
/// through nudge, and per-belief impact verdicts keyed by stable index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Evaluation {
    /// Sparse emotion deltas, accumulated across beliefs.
    pub emotion_deltas: EmotionDeltas,
    /// Impact per belief index. Neutral entries may be omitted.
    pub impacts: BTreeMap<usize, BeliefImpact>,
}

impl Evaluation {
    /// A no-op evaluation: nothing felt, nothing judged.
    #[must_use]
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Reject fabricated belief indices.
    ///
    /// # Errors
    /// `InvalidBeliefIndex` when any impact key is out of range.
    pub fn validate(&self, belief_count: usize) -> Result<()> {
        if let Some(&index) = self.impacts.keys().find(|&&i| i >= belief_count) {
            return Err(SoulError::InvalidBeliefIndex {
                index,
                count: belief_count,
            });
        }
        Ok(())
    }
}

/// The pluggable reasoning backend.
///
/// Receives the raw belief records, the current core emotions, and the
/// raw scene/conversation text; returns an [`Evaluation`]. The contract
/// is synchronous — both outputs are produced before control returns.
/// Backend failures are the implementor's to translate: return
/// [`Evaluation::neutral`] or panic-free garbage-in handling, never a
/// partial state.
pub trait BeliefEvaluator: Send + Sync {
    /// Judge every belief against the scene and conversation.
    fn evaluate(
        &self,
        beliefs: &[Belief],
        emotions: &EmotionVector,
        scene: &str,
        conversation: &str,
    ) -> Evaluation;
}

/// Ordered, stable-index belief store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeliefStore {
    beliefs: Vec<Belief>,
}

impl BeliefStore {
    /// Store seeded with an initial belief list.
    #[must_use]
    pub fn new(beliefs: Vec<Belief>) -> Self {
        Self { beliefs }
    }

    /// Append a belief, returning its stable index.
    pub fn add(&mut self, belief: Belief) -> usize {
        self.beliefs.push(belief);
        self.beliefs.len() - 1
    }

    /// All beliefs in index order.
    #[must_use]
    pub fn beliefs(&self) -> &[Belief] {
        &self.beliefs
    }

    /// Number of beliefs held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.beliefs.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.beliefs.is_empty()
    }

    /// Belief by index.
    ///
    /// # Errors
    /// `InvalidBeliefIndex` when out of range.
    pub fn belief(&self, index: usize) -> Result<&Belief> {
        self.beliefs
            .get(index)
            .ok_or(SoulError::InvalidBeliefIndex {
                index,
                count: self.beliefs.len(),
            })
    }

    pub(crate) fn belief_mut(&mut self, index: usize) -> Result<&mut Belief> {
        let count = self.beliefs.len();
        self.beliefs
            .get_mut(index)
            .ok_or(SoulError::InvalidBeliefIndex { index, count })
    }

    /// Beliefs carrying a tag, with their stable indices.
    #[must_use]
    pub fn with_tag(&self, tag: &str) -> Vec<(usize, &Belief)> {
        self.beliefs
            .iter()
            .enumerate()
            .filter(|(_, b)| b.has_tag(tag))
            .collect()
    }

    /// Scripted discontinuous update, gated by inertia.
    ///
    /// With `threshold = 1 - inertia`: a magnitude at or below the
    /// threshold is absorbed (returns `false`); anything stronger moves
    /// strength by the excess, cracks inertia by 0.05, and zeroes the
    /// belief's erosion pressure — the jolt consumes whatever gradual
    /// pressure had been building.
    ///
    /// # Errors
    /// `InvalidBeliefIndex` when out of range.
    pub fn apply_shock(
        &mut self,
        index: usize,
        direction: Direction,
        magnitude: f32,
    ) -> Result<bool> {
        let belief = self.belief_mut(index)?;
        let magnitude = clamp_unit(magnitude);
        let threshold = 1.0 - belief.inertia;
        if magnitude <= threshold {
            return Ok(false);
        }
        belief.strength =
            clamp_unit(belief.strength + direction.signum() * (magnitude - threshold));
        belief.inertia = clamp_unit(belief.inertia - SHOCK_CRACK);
        belief.erosion.pressure = 0.0;
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Default keyword evaluator
// ---------------------------------------------------------------------------

/// Challenge/reinforce keyword clusters for one tag.
#[derive(Debug, Clone, Default)]
pub struct TagCluster {
    /// Substrings that read as contradicting the tag.
    pub challenge: Vec<String>,
    /// Substrings that read as confirming the tag.
    pub reinforce: Vec<String>,
}

/// Deterministic evaluator that stands in for an LLM backend.
///
/// Scans the lowercased concatenation of scene and conversation for
/// substrings from per-tag keyword clusters. For each belief, the first
/// of its tags with any match decides the impact; within a cluster,
/// challenge keywords are consulted before reinforce keywords.
#[derive(Debug, Clone)]
pub struct KeywordEvaluator {
    clusters: BTreeMap<String, TagCluster>,
}

impl KeywordEvaluator {
    /// Evaluator with no clusters — every evaluation is neutral.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            clusters: BTreeMap::new(),
        }
    }

    /// Add or replace the cluster for a tag.
    #[must_use]
    pub fn with_cluster(mut self, tag: &str, challenge: &[&str], reinforce: &[&str]) -> Self {
        self.clusters.insert(
            tag.to_string(),
            TagCluster {
                challenge: challenge.iter().map(|k| k.to_lowercase()).collect(),
                reinforce: reinforce.iter().map(|k| k.to_lowercase()).collect(),
            },
        );
        self
    }

    fn judge(&self, belief: &Belief, haystack: &str) -> BeliefImpact {
        for tag in &belief.tags {
            let Some(cluster) = self.clusters.get(tag) else {
                continue;
            };
            if cluster.challenge.iter().any(|k| haystack.contains(k.as_str())) {
                return BeliefImpact::Challenged;
            }
            if cluster.reinforce.iter().any(|k| haystack.contains(k.as_str())) {
                return BeliefImpact::Reinforced;
            }
        }
        BeliefImpact::Neutral
    }
}

impl Default for KeywordEvaluator {
    fn default() -> Self {
        Self::empty()
            .with_cluster(
                "safety",
                &["danger", "attack", "bandits", "threatened", "unsafe"],
                &["safe", "protected", "guarded", "secure"],
            )
            .with_cluster(
                "family",
                &["disowned", "estranged", "cast out"],
                &["family", "kin", "reunion"],
            )
            .with_cluster(
                "trust",
                &["betrayed", "lied", "deceived", "cheated"],
                &["loyal", "honest", "kept their word"],
            )
            .with_cluster(
                "faith",
                &["forsaken", "heresy", "godless"],
                &["blessed", "prayer", "miracle"],
            )
            .with_cluster(
                "self_worth",
                &["worthless", "failure", "useless"],
                &["proud", "praised", "admired"],
            )
            .with_cluster(
                "order",
                &["chaos", "riot", "lawless"],
                &["law", "order", "justice"],
            )
    }
}

impl BeliefEvaluator for KeywordEvaluator {
    fn evaluate(
        &self,
        beliefs: &[Belief],
        _emotions: &EmotionVector,
        scene: &str,
        conversation: &str,
    ) -> Evaluation {
        let haystack = format!("{scene} {conversation}").to_lowercase();
        let mut evaluation = Evaluation::neutral();

        for (index, belief) in beliefs.iter().enumerate() {
            let impact = self.judge(belief, &haystack);
            let s = belief.strength;
            match impact {
                BeliefImpact::Challenged => {
                    evaluation.emotion_deltas.add(Emotion::Anxiety, 0.1 * s);
                    evaluation.emotion_deltas.add(Emotion::Fear, 0.05 * s);
                    evaluation.emotion_deltas.add(Emotion::Anger, 0.03 * s);
                    evaluation.emotion_deltas.add(Emotion::Happiness, -0.05 * s);
                    evaluation.impacts.insert(index, impact);
                }
                BeliefImpact::Reinforced => {
                    evaluation.emotion_deltas.add(Emotion::Happiness, 0.05 * s);
                    evaluation.emotion_deltas.add(Emotion::Confidence, 0.05 * s);
                    evaluation.emotion_deltas.add(Emotion::Anxiety, -0.025 * s);
                    evaluation.impacts.insert(index, impact);
                }
                BeliefImpact::Neutral => {}
            }
        }
        evaluation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn village_belief() -> Belief {
        Belief::new(
            "The village is safe",
            0.8,
            0.6,
            vec!["safety".to_string()],
        )
    }

    #[test]
    fn new_belief_clamps_strength_and_inertia() {
        let b = Belief::new("anything", 1.7, -0.2, vec![]);
        assert!((b.strength - 1.0).abs() < f32::EPSILON);
        assert!(b.inertia.abs() < f32::EPSILON);
    }

    #[test]
    fn weak_shock_is_absorbed() {
        let mut store = BeliefStore::new(vec![village_belief()]);
        let landed = store
            .apply_shock(0, Direction::Weaken, 0.3)
            .expect("valid index");
        assert!(!landed);
        assert!((store.belief(0).expect("belief").strength - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn strong_shock_moves_strength_and_cracks_inertia() {
        let mut store = BeliefStore::new(vec![village_belief()]);
        store.belief_mut(0).expect("belief").erosion.pressure = 0.2;

        let landed = store
            .apply_shock(0, Direction::Weaken, 0.7)
            .expect("valid index");
        assert!(landed);
        let belief = store.belief(0).expect("belief");
        // threshold 0.4; excess 0.3 subtracted from strength.
        assert!((belief.strength - 0.5).abs() < 1e-6);
        assert!((belief.inertia - 0.55).abs() < 1e-6);
        assert!(belief.erosion.pressure.abs() < f32::EPSILON);
    }

    #[test]
    fn shock_on_bad_index_fails_loudly() {
        let mut store = BeliefStore::new(vec![]);
        assert!(store.apply_shock(0, Direction::Weaken, 0.9).is_err());
    }

    #[test]
    fn keyword_evaluator_challenges_on_scene_text() {
        let evaluator = KeywordEvaluator::default();
        let beliefs = vec![village_belief()];
        let eval = evaluator.evaluate(
            &beliefs,
            &EmotionVector::neutral(),
            "Bandits storm the square",
            "Run!",
        );
        assert_eq!(eval.impacts.get(&0), Some(&BeliefImpact::Challenged));
        assert!(eval.emotion_deltas.get(Emotion::Anxiety) > 0.0);
        assert!(eval.emotion_deltas.get(Emotion::Happiness) < 0.0);
    }

    #[test]
    fn keyword_evaluator_reinforces_and_scales_by_strength() {
        let evaluator = KeywordEvaluator::default();
        let beliefs = vec![Belief::new(
            "The guard keeps us safe",
            0.4,
            0.5,
            vec!["safety".to_string()],
        )];
        let eval = evaluator.evaluate(
            &beliefs,
            &EmotionVector::neutral(),
            "The gates are guarded through the night",
            "",
        );
        assert_eq!(eval.impacts.get(&0), Some(&BeliefImpact::Reinforced));
        assert!((eval.emotion_deltas.get(Emotion::Happiness) - 0.02).abs() < 1e-6);
    }

    #[test]
    fn untagged_belief_stays_neutral() {
        let evaluator = KeywordEvaluator::default();
        let beliefs = vec![Belief::new("The moon is a lantern", 0.9, 0.9, vec![])];
        let eval = evaluator.evaluate(
            &beliefs,
            &EmotionVector::neutral(),
            "Bandits attack under a blessed moon",
            "",
        );
        assert!(eval.impacts.is_empty());
        assert!(eval.emotion_deltas.is_empty());
    }

    #[test]
    fn validation_rejects_fabricated_indices() {
        let mut eval = Evaluation::neutral();
        eval.impacts.insert(3, BeliefImpact::Challenged);
        assert!(eval.validate(2).is_err());
        assert!(eval.validate(4).is_ok());
    }
}

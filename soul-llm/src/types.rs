//! Request, response, and wire-schema types for LLM evaluation.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use soul_core::{BeliefImpact, Emotion, Evaluation};

/// A request to the LLM.
#[derive(Debug, Clone, Serialize)]
pub struct LlmRequest {
    /// System prompt (evaluator rules, output schema).
    pub system: String,
    /// User prompt (beliefs, emotions, scene, conversation).
    pub user: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Temperature. Evaluation wants determinism, so default to 0.0.
    pub temperature: f32,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl LlmRequest {
    /// A new evaluation request with deterministic sampling defaults.
    #[must_use]
    pub fn evaluation(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens: 300,
            temperature: 0.0,
            timeout_ms: 5000,
        }
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// A response from the LLM.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The generated text.
    pub text: String,
    /// Latency in milliseconds.
    pub latency_ms: u64,
    /// Which model was used.
    pub model: String,
}

/// The structured output the model must return.
///
/// ```json
/// {
///   "emotion_deltas": { "anxiety": 0.1, "happiness": -0.05 },
///   "impacts": { "0": "challenged", "2": "reinforced" }
/// }
/// ```
///
/// Keys are strings because JSON object keys always are; conversion to
/// engine types happens in [`WireEvaluation::into_evaluation`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireEvaluation {
    /// Emotion label → delta.
    #[serde(default)]
    pub emotion_deltas: BTreeMap<String, f32>,
    /// Belief index (as a string) → "challenged" | "reinforced" | "neutral".
    #[serde(default)]
    pub impacts: BTreeMap<String, String>,
}

impl WireEvaluation {
    /// Convert to an engine [`Evaluation`], dropping anything the model
    /// hallucinated: unknown emotion labels, unparseable or
    /// out-of-range belief indices, unknown impact words. Dropped
    /// entries are logged, never forwarded.
    #[must_use]
    pub fn into_evaluation(self, belief_count: usize) -> Evaluation {
        let mut evaluation = Evaluation::neutral();

        for (label, delta) in self.emotion_deltas {
            match Emotion::from_str(&label) {
                Ok(emotion) => evaluation.emotion_deltas.add(emotion, delta),
                Err(_) => warn!(label, "dropping unknown emotion from LLM output"),
            }
        }

        for (key, verdict) in self.impacts {
            let Ok(index) = key.parse::<usize>() else {
                warn!(key, "dropping unparseable belief index from LLM output");
                continue;
            };
            if index >= belief_count {
                warn!(index, belief_count, "dropping fabricated belief index");
                continue;
            }
            let impact = match verdict.as_str() {
                "challenged" => BeliefImpact::Challenged,
                "reinforced" => BeliefImpact::Reinforced,
                "neutral" => continue,
                other => {
                    warn!(verdict = other, "dropping unknown impact verdict");
                    continue;
                }
            };
            evaluation.impacts.insert(index, impact);
        }
        evaluation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_evaluation_parses_and_converts() {
        let json = r#"{
            "emotion_deltas": { "anxiety": 0.1, "happiness": -0.05 },
            "impacts": { "0": "challenged", "1": "reinforced" }
        }"#;
        let wire: WireEvaluation = serde_json::from_str(json).expect("parse");
        let evaluation = wire.into_evaluation(2);

        assert!((evaluation.emotion_deltas.get(Emotion::Anxiety) - 0.1).abs() < 1e-6);
        assert_eq!(evaluation.impacts.get(&0), Some(&BeliefImpact::Challenged));
        assert_eq!(evaluation.impacts.get(&1), Some(&BeliefImpact::Reinforced));
    }

    #[test]
    fn hallucinated_entries_are_dropped() {
        let json = r#"{
            "emotion_deltas": { "smugness": 0.4, "fear": 0.2 },
            "impacts": { "7": "challenged", "zero": "reinforced", "0": "ecstatic" }
        }"#;
        let wire: WireEvaluation = serde_json::from_str(json).expect("parse");
        let evaluation = wire.into_evaluation(2);

        assert_eq!(evaluation.emotion_deltas.len(), 1);
        assert!(evaluation.impacts.is_empty());
        assert!(evaluation.validate(2).is_ok());
    }

    #[test]
    fn neutral_verdicts_are_omitted() {
        let json = r#"{ "impacts": { "0": "neutral" } }"#;
        let wire: WireEvaluation = serde_json::from_str(json).expect("parse");
        let evaluation = wire.into_evaluation(1);
        assert!(evaluation.impacts.is_empty());
    }
}

//! Evaluation Prompt Golden Tests.
//!
//! A curated set of render/parse cases validating that the evaluation
//! templates produce well-formed prompts and that representative model
//! outputs convert cleanly to engine evaluations. Everything here runs
//! offline; no backend is contacted.

use soul_core::{Belief, BeliefImpact, Emotion, EmotionVector};
use soul_llm::prompt;
use soul_llm::WireEvaluation;

/// A golden test case for prompt rendering.
struct GoldenCase {
    /// Human-readable name for the test case.
    name: &'static str,
    /// Beliefs to render.
    beliefs: Vec<Belief>,
    /// Scene text.
    scene: &'static str,
    /// Conversation text.
    conversation: &'static str,
    /// Strings that MUST appear in the rendered prompt.
    prompt_must_contain: Vec<&'static str>,
    /// Strings that MUST NOT appear in the rendered prompt.
    prompt_must_not_contain: Vec<&'static str>,
}

fn golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            name: "guard_belief_under_attack",
            beliefs: vec![Belief::new(
                "The town guard protects us",
                0.9,
                0.6,
                vec!["safety".to_string(), "order".to_string()],
            )],
            scene: "Bandits overrun the market while the guard hides",
            conversation: "Nobody came to help us!",
            prompt_must_contain: vec![
                "0. \"The town guard protects us\"",
                "strength: 0.90",
                "safety, order",
                "Bandits overrun the market",
                "Nobody came to help us!",
            ],
            prompt_must_not_contain: vec![
                "{beliefs_formatted}",
                "{scene}",
                "{conversation}",
            ],
        },
        GoldenCase {
            name: "two_beliefs_numbered_stably",
            beliefs: vec![
                Belief::new("My family loves me", 0.8, 0.7, vec!["family".to_string()]),
                Belief::new("Hard work is rewarded", 0.6, 0.4, vec!["order".to_string()]),
            ],
            scene: "A letter arrives from home",
            conversation: "Your sister asks when you will visit",
            prompt_must_contain: vec![
                "0. \"My family loves me\"",
                "1. \"Hard work is rewarded\"",
            ],
            prompt_must_not_contain: vec!["2. \""],
        },
        GoldenCase {
            name: "no_beliefs_renders_placeholder",
            beliefs: vec![],
            scene: "A quiet evening",
            conversation: "",
            prompt_must_contain: vec!["(none)"],
            prompt_must_not_contain: vec!["0. \""],
        },
    ]
}

#[test]
fn golden_prompts_render_cleanly() {
    for case in golden_cases() {
        let rendered = prompt::evaluation_user_prompt(
            &case.beliefs,
            &EmotionVector::neutral(),
            case.scene,
            case.conversation,
        );
        for expected in &case.prompt_must_contain {
            assert!(
                rendered.contains(expected),
                "[{}] expected {expected:?} in:\n{rendered}",
                case.name
            );
        }
        for forbidden in &case.prompt_must_not_contain {
            assert!(
                !rendered.contains(forbidden),
                "[{}] forbidden {forbidden:?} found in:\n{rendered}",
                case.name
            );
        }
    }
}

#[test]
fn system_prompt_states_the_schema() {
    assert!(prompt::EVALUATION_SYSTEM.contains("emotion_deltas"));
    assert!(prompt::EVALUATION_SYSTEM.contains("impacts"));
    assert!(prompt::EVALUATION_SYSTEM.contains("challenged"));
    for e in Emotion::ALL {
        assert!(
            prompt::EVALUATION_SYSTEM.contains(e.label()),
            "system prompt must list {e}"
        );
    }
}

#[test]
fn emotion_formatting_is_canonical_and_signed() {
    let mut emotions = EmotionVector::neutral();
    emotions.set(Emotion::Fear, 0.5);
    emotions.set(Emotion::Happiness, -0.25);
    let formatted = prompt::format_emotions(&emotions);

    assert!(formatted.contains("fear: +0.50"));
    assert!(formatted.contains("happiness: -0.25"));
    let happiness_pos = formatted.find("happiness").expect("listed");
    let fear_pos = formatted.find("fear").expect("listed");
    assert!(happiness_pos < fear_pos, "canonical order");
}

#[test]
fn representative_model_output_round_trips() {
    // The kind of output the system prompt asks for, verbatim.
    let raw = r#"{
        "emotion_deltas": { "anxiety": 0.12, "fear": 0.05, "happiness": -0.04 },
        "impacts": { "0": "challenged", "1": "neutral" }
    }"#;
    let wire: WireEvaluation = serde_json::from_str(raw).expect("well-formed output parses");
    let evaluation = wire.into_evaluation(2);

    assert_eq!(evaluation.impacts.len(), 1);
    assert_eq!(evaluation.impacts.get(&0), Some(&BeliefImpact::Challenged));
    assert!((evaluation.emotion_deltas.get(Emotion::Anxiety) - 0.12).abs() < 1e-6);
    assert!(evaluation.validate(2).is_ok());
}

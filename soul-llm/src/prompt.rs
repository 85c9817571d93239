//! Prompt templates for belief evaluation.
//!
//! Every prompt is a versioned, testable artifact. The engine passes
//! raw belief records and raw scene/conversation strings; formatting
//! them for a model happens here and nowhere else.

use soul_core::{Belief, Emotion, EmotionVector};

/// System prompt for the evaluation call. The model acts as a judge,
/// not a character, and must return the wire schema verbatim.
pub const EVALUATION_SYSTEM: &str = r#"You judge how a scene bears on a character's beliefs.
You are not the character. You do not write dialogue.

For each numbered belief, decide whether the scene and conversation
challenged it, reinforced it, or did not bear on it. Estimate the
emotional effect on the character as small deltas in [-0.3, 0.3].

Valid emotions: happiness, anger, fear, trust, energy, loneliness,
anxiety, confidence.

Your entire response must be valid JSON in exactly this shape:
{"emotion_deltas": {"<emotion>": <float>, ...},
 "impacts": {"<belief index>": "challenged" | "reinforced" | "neutral", ...}}

Omit neutral impacts if you prefer. Never invent belief indices."#;

/// User prompt for the evaluation call.
pub const EVALUATION_USER: &str = r"The character's beliefs:
{beliefs_formatted}

The character's current emotional state:
{emotions_formatted}

Scene: {scene}
Conversation: {conversation}

Judge each belief and return the JSON.";

/// Simple template interpolation: replaces `{key}` with the value.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

/// Format beliefs as a numbered list the model can index into.
#[must_use]
pub fn format_beliefs(beliefs: &[Belief]) -> String {
    if beliefs.is_empty() {
        return "(none)".to_string();
    }
    beliefs
        .iter()
        .enumerate()
        .map(|(i, b)| {
            format!(
                "{i}. \"{}\" (strength: {:.2}, tags: [{}])",
                b.text,
                b.strength,
                b.tags.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format the emotion vector as one label/value pair per line, in
/// canonical order.
#[must_use]
pub fn format_emotions(emotions: &EmotionVector) -> String {
    Emotion::ALL
        .iter()
        .map(|&e| format!("{e}: {:+.2}", emotions.get(e)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the full user prompt for one evaluation.
#[must_use]
pub fn evaluation_user_prompt(
    beliefs: &[Belief],
    emotions: &EmotionVector,
    scene: &str,
    conversation: &str,
) -> String {
    render_template(
        EVALUATION_USER,
        &[
            ("beliefs_formatted", &format_beliefs(beliefs)),
            ("emotions_formatted", &format_emotions(emotions)),
            ("scene", scene),
            ("conversation", conversation),
        ],
    )
}

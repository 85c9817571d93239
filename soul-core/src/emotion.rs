//! Core emotion pipeline — interactions, cross-effects, personality scaling.
//!
//! An interaction lands in four strictly ordered stages: scale the
//! catalogued base deltas by intensity, let pre-hooks rewrite the base,
//! radiate cross-effects in a single pass, then scale by personality and
//! commit with clamping. Cross-effects are computed from the
//! post-pre-hook base only — never from other cross-effects — which is
//! what bounds the magnitudes without iterating to a fixed point.
//!
//! The sympathetic-shift table is loosely modelled on adjacency in
//! Plutchik's wheel (Plutchik, 1980): fear feeds anxiety, anger sours
//! happiness and trust, confidence suppresses both anxieties.

use crate::error::Result;
use crate::registry::Registry;
use crate::types::{Emotion, EmotionDeltas, EmotionVector, Personality};

/// A pre-hook: receives the current core vector, the interaction name,
/// and the base deltas so far; returns the base deltas to use from here
/// on. Hooks run in registration order, each seeing its predecessor's
/// output.
pub type PreHook =
    Box<dyn Fn(&EmotionVector, &str, EmotionDeltas) -> EmotionDeltas + Send + Sync>;

/// Apply a catalogued interaction to a core emotion vector.
///
/// Returns the dense applied map — the per-emotion deltas after
/// personality scaling but before clamping, so callers can observe
/// saturation. Intensity 0 yields an all-zero map and leaves the vector
/// untouched.
///
/// # Errors
/// `UnknownInteraction` when `name` is not catalogued.
pub fn apply_interaction(
    emotions: &mut EmotionVector,
    registry: &Registry,
    personality: Personality,
    name: &str,
    intensity: f32,
    pre_hooks: &[PreHook],
) -> Result<EmotionDeltas> {
    let catalogued = registry.interaction(name)?;
    let mut base = catalogued.scaled(intensity);

    for hook in pre_hooks {
        base = hook(emotions, name, base);
    }

    // Single-pass cross-effects, sourced from the post-hook base only.
    let mut cross = EmotionDeltas::new();
    for (source, base_delta) in base.iter() {
        if let Some(effects) = registry.cross_effects(source) {
            for (target, factor) in effects.iter() {
                cross.add(target, base_delta * factor);
            }
        }
    }

    let mut applied = EmotionDeltas::new();
    for e in Emotion::ALL {
        let delta = (base.get(e) + cross.get(e)) * registry.multiplier(personality, e);
        applied.set(e, delta);
        emotions.add_clamped(e, delta);
    }
    Ok(applied)
}

/// Nudge a single emotion: personality-scale, add, clamp.
///
/// The surgical tool — skips cross-effects, history, presentation, and
/// hooks. Trigger bursts use it so a flurry of keyword hits does not
/// re-fire shift detection on every hit; aggregated state settles on the
/// next full interaction. Returns the change that actually landed after
/// clamping.
pub fn nudge(
    emotions: &mut EmotionVector,
    registry: &Registry,
    personality: Personality,
    emotion: Emotion,
    delta: f32,
) -> f32 {
    let scaled = delta * registry.multiplier(personality, emotion);
    emotions.add_clamped(emotion, scaled)
}

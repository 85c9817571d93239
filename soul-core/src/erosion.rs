//! Belief erosion — hidden pressure, tipping points, hardening.
//!
//! Every evaluation that bears on a belief leaves a little pressure
//! behind. Pressure decays toward zero with time, and when its magnitude
//! reaches the belief's threshold the belief *tips*: strength shifts,
//! pressure resets, and the threshold hardens by a configurable factor —
//! beliefs that have survived an attack resist the next one, as in
//! attitude-inoculation accounts (McGuire, 1964). The threshold is
//! uncapped upward; since pressure is clamped to [-1, 1], a
//! sufficiently hardened belief simply freezes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::belief::{BeliefImpact, BeliefStore};
use crate::config::ErosionTuning;
use crate::error::Result;
use crate::types::{clamp_signed, clamp_unit, EmotionDeltas, Timestamp};

/// Polarity of a pressure application or shock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Push strength upward (+1).
    Strengthen,
    /// Push strength downward (-1).
    Weaken,
}

impl Direction {
    /// The signed unit factor for this direction.
    #[must_use]
    pub fn signum(self) -> f32 {
        match self {
            Direction::Strengthen => 1.0,
            Direction::Weaken => -1.0,
        }
    }

    /// Direction matching the sign of a pressure value (non-negative
    /// reads as strengthening).
    #[must_use]
    pub fn of_pressure(pressure: f32) -> Self {
        if pressure >= 0.0 {
            Direction::Strengthen
        } else {
            Direction::Weaken
        }
    }
}

/// Hidden erosion state carried by each belief.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErosionState {
    /// Accumulated pressure in [-1, 1]. Positive reinforces, negative
    /// challenges.
    pub pressure: f32,
    /// Pressure magnitude at which the belief tips.
    pub threshold: f32,
    /// Strength change applied on a tip.
    pub shift_amount: f32,
    /// Pressure lost per unit of elapsed time.
    pub decay_rate: f32,
    /// When decay last ran for this belief.
    pub last_event_time: Timestamp,
}

impl Default for ErosionState {
    fn default() -> Self {
        Self {
            pressure: 0.0,
            threshold: 0.3,
            shift_amount: 0.1,
            decay_rate: 0.01,
            last_event_time: 0.0,
        }
    }
}

impl ErosionState {
    /// Erosion state seeded from engine tuning, anchored at `now`.
    #[must_use]
    pub fn from_tuning(tuning: &ErosionTuning, now: Timestamp) -> Self {
        Self {
            pressure: 0.0,
            threshold: tuning.default_threshold,
            shift_amount: tuning.shift_amount,
            decay_rate: tuning.decay_rate,
            last_event_time: now,
        }
    }

    /// How close the belief is to tipping, in [0, 1].
    #[must_use]
    pub fn tipping_proximity(&self) -> f32 {
        if self.threshold <= 0.0 {
            return 1.0;
        }
        (self.pressure.abs() / self.threshold).min(1.0)
    }
}

/// Record of one tipping event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TippingEvent {
    /// Stable index of the belief that tipped.
    pub belief_index: usize,
    /// Which way strength moved.
    pub direction: Direction,
    /// Strength before the tip.
    pub old_strength: f32,
    /// Strength after the tip.
    pub new_strength: f32,
}

/// Accumulate pressure on one belief, clamped to [-1, 1].
///
/// `amount` is a non-negative magnitude; `direction` supplies the sign.
///
/// # Errors
/// `InvalidBeliefIndex` when out of range.
pub fn apply_pressure(
    store: &mut BeliefStore,
    index: usize,
    direction: Direction,
    amount: f32,
) -> Result<()> {
    let belief = store.belief_mut(index)?;
    belief.erosion.pressure =
        clamp_signed(belief.erosion.pressure + direction.signum() * amount.abs());
    Ok(())
}

/// Tip the belief if pressure has reached its threshold.
///
/// On a tip: strength shifts by `shift_amount` in the pressure's
/// direction, pressure resets to zero, and the threshold is multiplied
/// by `hardening_factor`.
///
/// # Errors
/// `InvalidBeliefIndex` when out of range.
pub fn check_tipping_point(
    store: &mut BeliefStore,
    index: usize,
    hardening_factor: f32,
) -> Result<Option<TippingEvent>> {
    let belief = store.belief_mut(index)?;
    if belief.erosion.pressure.abs() < belief.erosion.threshold {
        return Ok(None);
    }

    let direction = Direction::of_pressure(belief.erosion.pressure);
    let old_strength = belief.strength;
    belief.strength =
        clamp_unit(belief.strength + direction.signum() * belief.erosion.shift_amount);
    belief.erosion.pressure = 0.0;
    belief.erosion.threshold *= hardening_factor;

    debug!(
        belief_index = index,
        old_strength,
        new_strength = belief.strength,
        threshold = belief.erosion.threshold,
        "belief tipped"
    );

    Ok(Some(TippingEvent {
        belief_index: index,
        direction,
        old_strength,
        new_strength: belief.strength,
    }))
}

/// Decay one belief's pressure toward zero for the elapsed time, never
/// crossing sign, and stamp the decay time. A call with an unchanged
/// clock is a no-op.
///
/// # Errors
/// `InvalidBeliefIndex` when out of range.
pub fn tick(store: &mut BeliefStore, index: usize, now: Timestamp) -> Result<()> {
    let belief = store.belief_mut(index)?;
    let dt = (now - belief.erosion.last_event_time).max(0.0);
    if dt > 0.0 {
        let loss = belief.erosion.decay_rate * dt as f32;
        let magnitude = (belief.erosion.pressure.abs() - loss).max(0.0);
        belief.erosion.pressure = belief.erosion.pressure.signum() * magnitude;
    }
    belief.erosion.last_event_time = now;
    Ok(())
}

/// Feed one evaluation's impacts into erosion.
///
/// The pressure contributed by a single evaluation is derived from the
/// total delta magnitude and capped
/// (`amount = min(max_pressure_step, magnitude * pressure_scale)`), so a
/// neutral, zero-delta evaluation costs nothing. After each pressure
/// application the belief is checked for tipping; all tipping events are
/// returned in impact order.
///
/// # Errors
/// `InvalidBeliefIndex` when an impact names a belief out of range.
pub fn process_evaluation(
    store: &mut BeliefStore,
    impacts: &BTreeMap<usize, BeliefImpact>,
    emotion_deltas: &EmotionDeltas,
    tuning: &ErosionTuning,
) -> Result<Vec<TippingEvent>> {
    let amount =
        (emotion_deltas.magnitude() * tuning.pressure_scale).min(tuning.max_pressure_step);
    let mut events = Vec::new();

    for (&index, &impact) in impacts {
        let direction = match impact {
            BeliefImpact::Challenged => Direction::Weaken,
            BeliefImpact::Reinforced => Direction::Strengthen,
            BeliefImpact::Neutral => continue,
        };
        apply_pressure(store, index, direction, amount)?;
        if let Some(event) = check_tipping_point(store, index, tuning.hardening_factor)? {
            events.push(event);
        }
    }
    Ok(events)
}

//! Emotional history — EMA baselines, shift detection, snapshots.
//!
//! Baselines track the long-run value of each emotion with an
//! exponential moving average, an engine-side analogue of hedonic
//! adaptation (Brickman & Campbell, 1971): momentary spikes wash out,
//! sustained states become the new normal. A *shift* is recorded only
//! when a baseline has drifted past a threshold from its last recorded
//! reference, and recording re-anchors the reference — so a continuously
//! drifting baseline logs one shift per plateau, not one per update.

use serde::{Deserialize, Serialize};

use crate::types::{Emotion, EmotionVector, Timestamp};

/// A recorded baseline shift: a sustained change that crossed the
/// detection threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftRecord {
    /// When the shift was detected.
    pub timestamp: Timestamp,
    /// Which emotion drifted.
    pub emotion: Emotion,
    /// The reference baseline the drift was measured against.
    pub from: f32,
    /// The baseline value at detection.
    pub to: f32,
    /// Label of the operation that completed the drift.
    pub cause: String,
}

impl ShiftRecord {
    /// Magnitude of the shift.
    #[must_use]
    pub fn magnitude(&self) -> f32 {
        (self.to - self.from).abs()
    }
}

/// An explicit labelled capture of the full emotion vector, for
/// designer-driven narrative checkpoints. Independent of shifts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionSnapshot {
    /// When the snapshot was taken.
    pub timestamp: Timestamp,
    /// Designer-supplied label.
    pub label: String,
    /// The full emotion vector at that moment.
    pub emotions: EmotionVector,
}

/// Per-character history state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryState {
    /// EMA smoothing factor.
    pub alpha: f32,
    /// Drift distance that triggers a shift record.
    pub shift_threshold: f32,
    baselines: EmotionVector,
    reference: EmotionVector,
    shifts: Vec<ShiftRecord>,
    snapshots: Vec<EmotionSnapshot>,
}

impl HistoryState {
    /// Initialise history with baselines and references anchored at the
    /// character's current emotions.
    #[must_use]
    pub fn new(initial: &EmotionVector, alpha: f32, shift_threshold: f32) -> Self {
        Self {
            alpha,
            shift_threshold,
            baselines: *initial,
            reference: *initial,
            shifts: Vec::new(),
            snapshots: Vec::new(),
        }
    }

    /// Current baseline for one emotion.
    #[must_use]
    pub fn baseline(&self, emotion: Emotion) -> f32 {
        self.baselines.get(emotion)
    }

    /// All recorded shifts, oldest first.
    #[must_use]
    pub fn shifts(&self) -> &[ShiftRecord] {
        &self.shifts
    }

    /// All snapshots, oldest first.
    #[must_use]
    pub fn snapshots(&self) -> &[EmotionSnapshot] {
        &self.snapshots
    }

    /// Fold the current emotion vector into the baselines, then record a
    /// shift for every emotion whose baseline has drifted past the
    /// threshold from its reference (re-anchoring the reference).
    pub fn update(&mut self, current: &EmotionVector, cause: &str, now: Timestamp) {
        for e in Emotion::ALL {
            let smoothed =
                self.alpha * current.get(e) + (1.0 - self.alpha) * self.baselines.get(e);
            self.baselines.set(e, smoothed);
        }
        for e in Emotion::ALL {
            let baseline = self.baselines.get(e);
            let reference = self.reference.get(e);
            if (baseline - reference).abs() > self.shift_threshold {
                self.shifts.push(ShiftRecord {
                    timestamp: now,
                    emotion: e,
                    from: reference,
                    to: baseline,
                    cause: cause.to_string(),
                });
                self.reference.set(e, baseline);
            }
        }
    }

    /// Capture the full emotion vector under a label.
    pub fn take_snapshot(&mut self, emotions: &EmotionVector, timestamp: Timestamp, label: &str) {
        self.snapshots.push(EmotionSnapshot {
            timestamp,
            label: label.to_string(),
            emotions: *emotions,
        });
    }

    /// Most recent shift recorded for one emotion, if any.
    #[must_use]
    pub fn find_shift(&self, emotion: Emotion) -> Option<&ShiftRecord> {
        self.shifts.iter().rev().find(|s| s.emotion == emotion)
    }

    /// Shifts large enough to narrate, oldest first.
    #[must_use]
    pub fn narrative_shifts(&self, threshold: f32) -> Vec<&ShiftRecord> {
        self.shifts
            .iter()
            .filter(|s| s.magnitude() >= threshold)
            .collect()
    }
}

//! Configuration for the SOUL engine, loadable from TOML.

use serde::{Deserialize, Serialize};

/// Top-level engine tuning. Every field has a shipped default, so an
/// empty TOML document yields a fully usable configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SoulConfig {
    /// History layer tuning.
    #[serde(default)]
    pub history: HistoryTuning,
    /// Presentation layer tuning.
    #[serde(default)]
    pub presentation: PresentationTuning,
    /// Belief-erosion tuning.
    #[serde(default)]
    pub erosion: ErosionTuning,
    /// Trigger layer tuning.
    #[serde(default)]
    pub triggers: TriggerTuning,
}

impl SoulConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `SoulError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::SoulError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

/// History-layer tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryTuning {
    /// EMA smoothing factor for baselines. 0.05 gives roughly a
    /// twenty-update memory horizon.
    #[serde(default = "default_ema_alpha")]
    pub ema_alpha: f32,
    /// How far a baseline must drift from its reference before a shift
    /// is recorded (and the reference re-anchored).
    #[serde(default = "default_shift_threshold")]
    pub shift_threshold: f32,
}

impl Default for HistoryTuning {
    fn default() -> Self {
        Self {
            ema_alpha: 0.05,
            shift_threshold: 0.3,
        }
    }
}

/// Presentation-layer tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentationTuning {
    /// Mean core-vs-presented gap that maps to maximum masking strain.
    #[serde(default = "default_strain_normalizer")]
    pub strain_normalizer: f32,
}

impl Default for PresentationTuning {
    fn default() -> Self {
        Self {
            strain_normalizer: 0.5,
        }
    }
}

/// Belief-erosion tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErosionTuning {
    /// Starting tipping threshold for new beliefs.
    #[serde(default = "default_erosion_threshold")]
    pub default_threshold: f32,
    /// Strength change applied when a belief tips.
    #[serde(default = "default_shift_amount")]
    pub shift_amount: f32,
    /// Pressure lost per unit of elapsed time.
    #[serde(default = "default_decay_rate")]
    pub decay_rate: f32,
    /// Threshold multiplier applied after each tipping event. Uncapped:
    /// pressure's [-1, 1] clamp means a repeatedly tipped belief
    /// eventually freezes.
    #[serde(default = "default_hardening_factor")]
    pub hardening_factor: f32,
    /// Ceiling on the pressure contributed by a single evaluation.
    #[serde(default = "default_max_pressure_step")]
    pub max_pressure_step: f32,
    /// Scale from an evaluation's total delta magnitude to pressure.
    #[serde(default = "default_pressure_scale")]
    pub pressure_scale: f32,
}

impl Default for ErosionTuning {
    fn default() -> Self {
        Self {
            default_threshold: 0.3,
            shift_amount: 0.1,
            decay_rate: 0.01,
            hardening_factor: 1.1,
            max_pressure_step: 0.15,
            pressure_scale: 0.3,
        }
    }
}

/// Trigger-layer tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerTuning {
    /// Turns a topic stays silent after firing.
    #[serde(default = "default_cooldown_turns")]
    pub cooldown_turns: u32,
}

impl Default for TriggerTuning {
    fn default() -> Self {
        Self { cooldown_turns: 3 }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_ema_alpha() -> f32 {
    0.05
}
fn default_shift_threshold() -> f32 {
    0.3
}
fn default_strain_normalizer() -> f32 {
    0.5
}
fn default_erosion_threshold() -> f32 {
    0.3
}
fn default_shift_amount() -> f32 {
    0.1
}
fn default_decay_rate() -> f32 {
    0.01
}
fn default_hardening_factor() -> f32 {
    1.1
}
fn default_max_pressure_step() -> f32 {
    0.15
}
fn default_pressure_scale() -> f32 {
    0.3
}
fn default_cooldown_turns() -> u32 {
    3
}

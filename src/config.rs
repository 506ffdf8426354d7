//! Empirical tuning constants.
//!
//! The bundle packing density, the visual-perception multiplier, and the bowl
//! depth ratio have no derivation behind them; they were fitted by eye. They
//! live here rather than inline in the formulas so the host can recalibrate
//! them by passing a JSON object to [`crate::engine::Estimator::new`]. Missing
//! keys keep their defaults.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

pub const DEFAULT_GRAMS_PER_SQUARE_INCH: f64 = 32.0;
pub const DEFAULT_VISUAL_MULTIPLIER: f64 = 1.6;
pub const DEFAULT_BOWL_DEPTH_RATIO: f64 = 0.6;
pub const DEFAULT_STRAND_COUNT: u32 = 25;
pub const DEFAULT_STRAND_SEED: u64 = 0x5EED_BA57A;

/// Error returned by [`Tuning::from_json`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The input is not a JSON object with the expected keys.
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    /// A ratio or density is zero, negative, or NaN.
    #[error("tuning value `{0}` must be a positive number")]
    NonPositive(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tuning {
    /// Dry mass of a packed long-pasta bundle per square inch of cross-section.
    pub grams_per_square_inch: f64,
    /// Strands leave air gaps, so a bowl looks fuller than its volume ratio.
    pub visual_multiplier: f64,
    /// Bowl depth as a fraction of its radius.
    pub bowl_depth_ratio: f64,
    /// Decorative strokes painted over the pasta in the result view.
    pub strand_count: u32,
    pub strand_seed: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            grams_per_square_inch: DEFAULT_GRAMS_PER_SQUARE_INCH,
            visual_multiplier: DEFAULT_VISUAL_MULTIPLIER,
            bowl_depth_ratio: DEFAULT_BOWL_DEPTH_RATIO,
            strand_count: DEFAULT_STRAND_COUNT,
            strand_seed: DEFAULT_STRAND_SEED,
        }
    }
}

impl Tuning {
    /// Parse overrides from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON or unknown keys and
    /// [`ConfigError::NonPositive`] when a ratio is not strictly positive.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let tuning: Self = serde_json::from_str(raw)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Check that every ratio is strictly positive.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NonPositive`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("grams_per_square_inch", self.grams_per_square_inch),
            ("visual_multiplier", self.visual_multiplier),
            ("bowl_depth_ratio", self.bowl_depth_ratio),
        ];
        for (name, value) in fields {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::NonPositive(name));
            }
        }
        Ok(())
    }
}

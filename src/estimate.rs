//! Bundle mass and bowl fill formulas.
//!
//! The estimate runs in two stages. The physical stage compares the cooked
//! pasta volume against a cylinder approximating the bowl. The perceptual
//! stage scales that ratio by [`Tuning::visual_multiplier`] because strands
//! pack loosely and leave visible air between them. Both stages are pure.

#[cfg(test)]
#[path = "estimate_test.rs"]
mod estimate_test;

use std::f64::consts::PI;

use serde::Serialize;

use crate::config::Tuning;
use crate::consts::{CUBIC_CM_PER_CUBIC_INCH, GRAMS_PER_OUNCE, OVERFLOW_THRESHOLD_PCT};
use crate::pasta::PastaKind;
use crate::session::{MassUnit, RawAmount};

/// Error returned when an estimate cannot be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EstimateError {
    /// No pasta kind has been chosen yet.
    #[error("no pasta kind selected")]
    MissingSelection,
}

/// Dry mass in grams of a bundle with the given cross-section diameter.
#[must_use]
pub fn bundle_mass_grams(diameter_in: f64, grams_per_square_inch: f64) -> f64 {
    let radius = diameter_in / 2.0;
    PI * radius * radius * grams_per_square_inch
}

/// Clamp a fill percentage to `[0, 100]`. NaN reads as empty.
#[must_use]
pub fn clamp_fill(pct: f64) -> f64 {
    if pct.is_nan() { 0.0 } else { pct.clamp(0.0, 100.0) }
}

/// Whether a fill percentage should show the overflow warning.
#[must_use]
pub fn overflows(fill_pct: f64) -> bool {
    fill_pct > OVERFLOW_THRESHOLD_PCT
}

/// Intermediate and final values of one fill estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    pub raw_grams: f64,
    pub cooked_grams: f64,
    pub bowl_volume_in3: f64,
    pub pasta_volume_in3: f64,
    /// Physical volume ratio before the perceptual multiplier, unclamped.
    pub raw_fill_pct: f64,
    /// Visual fill, clamped to `[0, 100]`.
    pub fill_pct: f64,
}

impl Estimate {
    #[must_use]
    pub fn compute(kind: PastaKind, bowl_diameter_in: f64, raw_mass: f64, unit: MassUnit, tuning: &Tuning) -> Self {
        let raw_grams = unit.to_grams(raw_mass);
        let cooked_grams = raw_grams * kind.expansion();

        let radius = bowl_diameter_in / 2.0;
        let depth = radius * tuning.bowl_depth_ratio;
        let bowl_volume_in3 = PI * radius * radius * depth;

        let pasta_volume_in3 = cooked_grams / kind.density() / CUBIC_CM_PER_CUBIC_INCH;

        let (raw_fill_pct, fill_pct) = if bowl_volume_in3 > 0.0 {
            let raw = pasta_volume_in3 / bowl_volume_in3 * 100.0;
            (raw, clamp_fill(raw * tuning.visual_multiplier))
        } else if pasta_volume_in3 > 0.0 {
            (f64::INFINITY, 100.0)
        } else {
            (0.0, 0.0)
        };

        Self { raw_grams, cooked_grams, bowl_volume_in3, pasta_volume_in3, raw_fill_pct, fill_pct }
    }

    #[must_use]
    pub fn overflows(&self) -> bool {
        overflows(self.fill_pct)
    }
}

/// Visual fill percentage for `raw_mass` (in `unit`) of `kind` in a bowl.
#[must_use]
pub fn estimate_fill(kind: PastaKind, bowl_diameter_in: f64, raw_mass: f64, unit: MassUnit, tuning: &Tuning) -> f64 {
    Estimate::compute(kind, bowl_diameter_in, raw_mass, unit, tuning).fill_pct
}

/// Display-ready figures for the result step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateSummary {
    pub pasta_name: String,
    pub bowl_diameter_in: f64,
    pub raw_amount: String,
    pub cooked_amount: String,
    pub expansion_note: String,
    pub fill_pct: f64,
    pub fill_label: String,
    pub overflow: bool,
}

impl EstimateSummary {
    #[must_use]
    pub fn new(kind: PastaKind, bowl_diameter_in: f64, raw: RawAmount, estimate: &Estimate) -> Self {
        let cooked_amount = match raw.unit {
            MassUnit::Grams => format!("{:.0} grams", estimate.cooked_grams),
            MassUnit::Ounces => format!("{:.1} ounces", estimate.cooked_grams / GRAMS_PER_OUNCE),
        };
        Self {
            pasta_name: kind.name().to_owned(),
            bowl_diameter_in,
            raw_amount: raw.to_string(),
            cooked_amount,
            expansion_note: format!("This pasta expands {}x when cooked", kind.expansion()),
            fill_pct: estimate.fill_pct,
            fill_label: format!("{:.0}", estimate.fill_pct),
            overflow: estimate.overflows(),
        }
    }
}

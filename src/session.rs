//! Session state: everything the user has chosen or measured so far.
//!
//! One [`Session`] lives for one pass through the steps. It is mutated in
//! place by every control and reset to defaults on start-over. Clamped fields
//! are private so every write goes through its clamp.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::Tuning;
use crate::consts::{
    BOWL_DIAMETER_MAX_IN, BOWL_DIAMETER_MIN_IN, BUNDLE_DIAMETER_MAX_IN, BUNDLE_DIAMETER_MIN_IN,
    DEFAULT_BOWL_DIAMETER_IN, DEFAULT_BUNDLE_DIAMETER_IN, DEFAULT_REFERENCE_LINE_PX, GRAMS_PER_OUNCE,
    REFERENCE_LENGTH_IN, REFERENCE_LINE_MAX_FRACTION, REFERENCE_LINE_MIN_PX,
};
use crate::estimate::{self, Estimate, EstimateError};
use crate::pasta::PastaKind;

/// Error returned when parsing a [`MassUnit`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitError {
    #[error("unknown mass unit: {0}")]
    Unknown(String),
}

/// Display unit for pasta mass. Diameters are always inches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MassUnit {
    #[default]
    Grams,
    Ounces,
}

impl MassUnit {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Grams => "grams",
            Self::Ounces => "ounces",
        }
    }

    #[must_use]
    pub fn to_grams(self, amount: f64) -> f64 {
        match self {
            Self::Grams => amount,
            Self::Ounces => amount * GRAMS_PER_OUNCE,
        }
    }

    #[must_use]
    pub fn grams_to_unit(self, grams: f64) -> f64 {
        match self {
            Self::Grams => grams,
            Self::Ounces => grams / GRAMS_PER_OUNCE,
        }
    }
}

impl FromStr for MassUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grams" => Ok(Self::Grams),
            "ounces" => Ok(Self::Ounces),
            other => Err(UnitError::Unknown(other.to_owned())),
        }
    }
}

/// Raw pasta amount as a whole number in its unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RawAmount {
    pub value: u32,
    pub unit: MassUnit,
}

impl RawAmount {
    #[must_use]
    pub fn grams(self) -> f64 {
        self.unit.to_grams(f64::from(self.value))
    }
}

impl fmt::Display for RawAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit.label())
    }
}

/// Clamp a reference line length for a canvas of `canvas_width` pixels.
///
/// The lower bound wins when the canvas is too narrow for both to hold.
#[must_use]
pub fn clamp_reference_line(length_px: f64, canvas_width: f64) -> f64 {
    length_px
        .min(canvas_width * REFERENCE_LINE_MAX_FRACTION)
        .max(REFERENCE_LINE_MIN_PX)
}

#[must_use]
pub fn clamp_bundle_diameter(diameter_in: f64) -> f64 {
    diameter_in.clamp(BUNDLE_DIAMETER_MIN_IN, BUNDLE_DIAMETER_MAX_IN)
}

/// Bindable view of the session for the host form UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub pasta: Option<PastaKind>,
    pub bowl_diameter_in: f64,
    pub raw_amount: RawAmount,
    pub unit: MassUnit,
    pub reference_line_px: f64,
    pub bundle_diameter_in: f64,
    pub left_handed: bool,
    pub fill_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub pasta: Option<PastaKind>,
    pub unit: MassUnit,
    /// Draw the bundle circle right of the bowl centre instead of left.
    /// Cosmetic only; no formula reads it.
    pub left_handed: bool,
    bowl_diameter_in: f64,
    reference_line_px: f64,
    bundle_diameter_in: f64,
    fill_pct: Option<f64>,
    tuning: Tuning,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Tuning::default())
    }
}

impl Session {
    #[must_use]
    pub fn new(tuning: Tuning) -> Self {
        Self {
            pasta: None,
            unit: MassUnit::Grams,
            left_handed: false,
            bowl_diameter_in: DEFAULT_BOWL_DIAMETER_IN,
            reference_line_px: DEFAULT_REFERENCE_LINE_PX,
            bundle_diameter_in: DEFAULT_BUNDLE_DIAMETER_IN,
            fill_pct: None,
            tuning,
        }
    }

    /// Restore every field to its default. Tuning survives.
    pub fn reset(&mut self) {
        *self = Self::new(self.tuning);
    }

    #[must_use]
    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    // --- Bowl ---

    #[must_use]
    pub fn bowl_diameter_in(&self) -> f64 {
        self.bowl_diameter_in
    }

    /// Set the bowl diameter from the slider or a preset. Non-finite input is ignored.
    pub fn set_bowl_diameter_in(&mut self, diameter_in: f64) -> f64 {
        if diameter_in.is_finite() {
            self.bowl_diameter_in = diameter_in.clamp(BOWL_DIAMETER_MIN_IN, BOWL_DIAMETER_MAX_IN);
        }
        self.bowl_diameter_in
    }

    /// Apply a preset bowl size as-is. Presets may lie outside the slider
    /// range; non-finite or non-positive sizes are ignored.
    pub fn set_bowl_preset_in(&mut self, diameter_in: f64) -> f64 {
        if diameter_in.is_finite() && diameter_in > 0.0 {
            self.bowl_diameter_in = diameter_in;
        }
        self.bowl_diameter_in
    }

    // --- Reference line ---

    #[must_use]
    pub fn reference_line_px(&self) -> f64 {
        self.reference_line_px
    }

    /// Store a dragged reference line length, clamped for the given canvas.
    pub fn set_reference_line_px(&mut self, length_px: f64, canvas_width: f64) -> f64 {
        if length_px.is_finite() {
            self.reference_line_px = clamp_reference_line(length_px, canvas_width);
        }
        self.reference_line_px
    }

    /// Canvas pixels per physical inch, derived from the reference line.
    #[must_use]
    pub fn pixels_per_inch(&self) -> f64 {
        self.reference_line_px / REFERENCE_LENGTH_IN
    }

    // --- Bundle ---

    #[must_use]
    pub fn bundle_diameter_in(&self) -> f64 {
        self.bundle_diameter_in
    }

    /// Set the bundle diameter from the slider or a drag. Non-finite input is ignored.
    pub fn set_bundle_diameter_in(&mut self, diameter_in: f64) -> f64 {
        if diameter_in.is_finite() {
            self.bundle_diameter_in = clamp_bundle_diameter(diameter_in);
        }
        self.bundle_diameter_in
    }

    #[must_use]
    pub fn bundle_mass_grams(&self) -> f64 {
        estimate::bundle_mass_grams(self.bundle_diameter_in, self.tuning.grams_per_square_inch)
    }

    /// The bundle's dry mass, rounded to a whole number in the active unit.
    /// Display only; estimates use [`Session::bundle_mass_grams`].
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn raw_amount(&self) -> RawAmount {
        let in_unit = self.unit.grams_to_unit(self.bundle_mass_grams()).round().max(1.0);
        RawAmount { value: in_unit as u32, unit: self.unit }
    }

    // --- Estimate ---

    #[must_use]
    pub fn fill_pct(&self) -> Option<f64> {
        self.fill_pct
    }

    /// Run the fill estimate and remember the result.
    ///
    /// # Errors
    ///
    /// Returns [`EstimateError::MissingSelection`] when no pasta is chosen.
    pub fn estimate(&mut self) -> Result<Estimate, EstimateError> {
        let kind = self.pasta.ok_or(EstimateError::MissingSelection)?;
        // The rounded display amount never feeds the estimate.
        let grams = self.bundle_mass_grams();
        let result = Estimate::compute(kind, self.bowl_diameter_in, grams, MassUnit::Grams, &self.tuning);
        self.fill_pct = Some(result.fill_pct);
        Ok(result)
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            pasta: self.pasta,
            bowl_diameter_in: self.bowl_diameter_in,
            raw_amount: self.raw_amount(),
            unit: self.unit,
            reference_line_px: self.reference_line_px,
            bundle_diameter_in: self.bundle_diameter_in,
            left_handed: self.left_handed,
            fill_pct: self.fill_pct,
        }
    }
}

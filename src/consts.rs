//! Shared numeric constants for the estimator crate.

// ── Calibration ─────────────────────────────────────────────────

/// Physical length of the reference strand, in inches.
pub const REFERENCE_LENGTH_IN: f64 = 10.0;

/// Reference line length in canvas pixels for a fresh session.
pub const DEFAULT_REFERENCE_LINE_PX: f64 = 500.0;

/// Shortest reference line a drag can produce, in canvas pixels.
pub const REFERENCE_LINE_MIN_PX: f64 = 100.0;

/// Longest reference line a drag can produce, as a fraction of canvas width.
pub const REFERENCE_LINE_MAX_FRACTION: f64 = 0.95;

// ── Session defaults and bounds ─────────────────────────────────

pub const DEFAULT_BOWL_DIAMETER_IN: f64 = 8.0;
pub const BOWL_DIAMETER_MIN_IN: f64 = 4.0;
pub const BOWL_DIAMETER_MAX_IN: f64 = 14.0;

pub const DEFAULT_BUNDLE_DIAMETER_IN: f64 = 1.0;
pub const BUNDLE_DIAMETER_MIN_IN: f64 = 0.25;
pub const BUNDLE_DIAMETER_MAX_IN: f64 = 6.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Canvas-space grab slop in pixels for line endpoints and circle edges.
pub const GRAB_RADIUS_PX: f64 = 30.0;

/// Radius of the filled grab markers drawn on handles.
pub const HANDLE_MARKER_RADIUS_PX: f64 = 15.0;

/// Bundle circle centre sits this fraction of the bowl radius off the bowl centre.
pub const BUNDLE_OFFSET_FRACTION: f64 = 0.5;

// ── Units ───────────────────────────────────────────────────────

pub const GRAMS_PER_OUNCE: f64 = 28.35;

/// 1 in³ = 16.387 cm³.
pub const CUBIC_CM_PER_CUBIC_INCH: f64 = 16.387;

// ── Result view ─────────────────────────────────────────────────

/// Fill percentages strictly above this show the overflow warning.
pub const OVERFLOW_THRESHOLD_PCT: f64 = 90.0;

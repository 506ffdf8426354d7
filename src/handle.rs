//! Overlay layout and the two draggable calibration handles.
//!
//! Both handles follow the same shape: a hit-test decides whether a press
//! grabs them, an extractor turns a canvas point into a raw value, and the
//! value is clamped to a fixed range. [`CalibratedHandle`] captures that shape
//! so [`crate::input::Drag`] can drive either one.
//!
//! Handles are rebuilt from the session for every event. They borrow nothing
//! and hold no drag state.

#[cfg(test)]
#[path = "handle_test.rs"]
mod handle_test;

use crate::consts::{
    BUNDLE_DIAMETER_MAX_IN, BUNDLE_DIAMETER_MIN_IN, BUNDLE_OFFSET_FRACTION, GRAB_RADIUS_PX,
    REFERENCE_LINE_MAX_FRACTION, REFERENCE_LINE_MIN_PX,
};
use crate::session::Session;
use crate::viewport::{CanvasSize, Point};

/// A draggable overlay element whose position encodes one calibrated value.
pub trait CalibratedHandle {
    /// Whether a press at `pt` grabs this handle.
    fn hit_test(&self, pt: Point) -> bool;

    /// Raw value implied by a pointer at `pt`, before clamping.
    fn extract(&self, pt: Point) -> f64;

    /// Inclusive `(min, max)` range for the value.
    fn bounds(&self) -> (f64, f64);

    /// Canvas pixels per unit of value.
    fn scale(&self) -> f64;

    /// Clamped value for a pointer at `pt`. The lower bound wins if the range
    /// is inverted.
    fn value_at(&self, pt: Point) -> f64 {
        let (lo, hi) = self.bounds();
        self.extract(pt).min(hi).max(lo)
    }

    fn pixels_for(&self, value: f64) -> f64 {
        value * self.scale()
    }
}

// =============================================================
// Reference line
// =============================================================

/// Horizontal reference line centred on the canvas; its length in pixels is
/// the calibrated value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceLineHandle {
    pub center: Point,
    pub length_px: f64,
    pub canvas_width: f64,
}

impl ReferenceLineHandle {
    #[must_use]
    pub fn endpoints(&self) -> (Point, Point) {
        let half = self.length_px / 2.0;
        (
            Point::new(self.center.x - half, self.center.y),
            Point::new(self.center.x + half, self.center.y),
        )
    }
}

impl CalibratedHandle for ReferenceLineHandle {
    fn hit_test(&self, pt: Point) -> bool {
        let (start, end) = self.endpoints();
        pt.distance_to(start) < GRAB_RADIUS_PX || pt.distance_to(end) < GRAB_RADIUS_PX
    }

    // Symmetric about the centre: either endpoint can be dragged.
    fn extract(&self, pt: Point) -> f64 {
        2.0 * (pt.x - self.center.x).abs()
    }

    fn bounds(&self) -> (f64, f64) {
        (REFERENCE_LINE_MIN_PX, self.canvas_width * REFERENCE_LINE_MAX_FRACTION)
    }

    fn scale(&self) -> f64 {
        1.0
    }
}

// =============================================================
// Bundle circle
// =============================================================

/// Circle whose diameter in inches is the calibrated value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BundleCircleHandle {
    pub center: Point,
    pub diameter_in: f64,
    pub pixels_per_inch: f64,
}

impl BundleCircleHandle {
    #[must_use]
    pub fn radius_px(&self) -> f64 {
        self.pixels_for(self.diameter_in) / 2.0
    }

    /// Grab disc drawn on the right edge of the circle.
    #[must_use]
    pub fn grip(&self) -> Point {
        Point::new(self.center.x + self.radius_px(), self.center.y)
    }
}

impl CalibratedHandle for BundleCircleHandle {
    fn hit_test(&self, pt: Point) -> bool {
        let dist = pt.distance_to(self.center);
        let radius = self.radius_px();
        dist < radius || (dist - radius).abs() < GRAB_RADIUS_PX
    }

    fn extract(&self, pt: Point) -> f64 {
        if self.pixels_per_inch > 0.0 {
            2.0 * pt.distance_to(self.center) / self.pixels_per_inch
        } else {
            self.diameter_in
        }
    }

    fn bounds(&self) -> (f64, f64) {
        (BUNDLE_DIAMETER_MIN_IN, BUNDLE_DIAMETER_MAX_IN)
    }

    fn scale(&self) -> f64 {
        self.pixels_per_inch
    }
}

// =============================================================
// Layout
// =============================================================

/// Canvas-space geometry shared by the painters and the hit-testers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayLayout {
    pub canvas: CanvasSize,
    pub center: Point,
    pub pixels_per_inch: f64,
    pub bowl_diameter_in: f64,
    pub bowl_radius_px: f64,
    pub reference_line_px: f64,
    pub bundle_center: Point,
    pub bundle_diameter_in: f64,
}

impl OverlayLayout {
    #[must_use]
    pub fn new(session: &Session, canvas: CanvasSize) -> Self {
        let center = canvas.center();
        let pixels_per_inch = session.pixels_per_inch();
        let bowl_diameter_in = session.bowl_diameter_in();
        let bowl_radius_px = bowl_diameter_in / 2.0 * pixels_per_inch;

        let offset = bowl_radius_px * BUNDLE_OFFSET_FRACTION;
        let bundle_x = if session.left_handed { center.x + offset } else { center.x - offset };

        Self {
            canvas,
            center,
            pixels_per_inch,
            bowl_diameter_in,
            bowl_radius_px,
            reference_line_px: session.reference_line_px(),
            bundle_center: Point::new(bundle_x, center.y),
            bundle_diameter_in: session.bundle_diameter_in(),
        }
    }

    #[must_use]
    pub fn reference_handle(&self) -> ReferenceLineHandle {
        ReferenceLineHandle {
            center: self.center,
            length_px: self.reference_line_px,
            canvas_width: self.canvas.width,
        }
    }

    #[must_use]
    pub fn bundle_handle(&self) -> BundleCircleHandle {
        BundleCircleHandle {
            center: self.bundle_center,
            diameter_in: self.bundle_diameter_in,
            pixels_per_inch: self.pixels_per_inch,
        }
    }
}

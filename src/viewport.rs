#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use serde::Serialize;

/// A point in either client (CSS) or canvas pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Pixel dimensions of a canvas backing store.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn center(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Maps client coordinates onto a canvas whose CSS box may be scaled.
///
/// `left`/`top`/`display_*` come from the element's bounding rect; `canvas`
/// is its backing-store size. The two axes scale independently.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasMapping {
    pub left: f64,
    pub top: f64,
    pub display_width: f64,
    pub display_height: f64,
    pub canvas: CanvasSize,
}

impl CanvasMapping {
    #[must_use]
    pub fn scale_x(&self) -> f64 {
        axis_scale(self.canvas.width, self.display_width)
    }

    #[must_use]
    pub fn scale_y(&self) -> f64 {
        axis_scale(self.canvas.height, self.display_height)
    }

    /// Convert a client-space point to canvas pixels.
    #[must_use]
    pub fn to_canvas(&self, client: Point) -> Point {
        Point {
            x: (client.x - self.left) * self.scale_x(),
            y: (client.y - self.top) * self.scale_y(),
        }
    }
}

/// A collapsed (zero-size) element maps 1:1 rather than dividing by zero.
fn axis_scale(canvas: f64, display: f64) -> f64 {
    if display > 0.0 { canvas / display } else { 1.0 }
}

// =============================================================
// Canvas sizing
// =============================================================

/// Widest square the calibration canvas takes without a camera.
const STATIC_CANVAS_MAX_PX: f64 = 400.0;

/// Horizontal padding reserved around the result canvas.
const RESULT_CANVAS_PADDING_PX: f64 = 40.0;

/// Result canvas height as a fraction of its width (side view is wide).
const RESULT_CANVAS_ASPECT: f64 = 0.8;

/// Calibration canvas: the video frame size, or a square fitting the container.
#[must_use]
pub fn calibration_canvas_size(video: Option<CanvasSize>, container_width: f64) -> CanvasSize {
    match video {
        Some(frame) if frame.width > 0.0 => frame,
        _ => {
            let side = container_width.min(STATIC_CANVAS_MAX_PX).max(0.0);
            CanvasSize::new(side, side)
        }
    }
}

/// Bundle canvas: the video frame size, or the container size.
#[must_use]
pub fn bundle_canvas_size(video: Option<CanvasSize>, container: CanvasSize) -> CanvasSize {
    match video {
        Some(frame) if frame.width > 0.0 => frame,
        _ => container,
    }
}

#[must_use]
pub fn result_canvas_size(container_width: f64) -> CanvasSize {
    let width = (container_width - RESULT_CANVAS_PADDING_PX).min(STATIC_CANVAS_MAX_PX).max(0.0);
    CanvasSize::new(width, width * RESULT_CANVAS_ASPECT)
}

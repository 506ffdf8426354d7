//! Rendering: paints the calibration, bundle, and result views.
//!
//! Painters receive a read-only [`OverlayLayout`] (or canvas size plus fill)
//! and produce pixels through [`Surface`]. They never mutate the session.
//!
//! All fallible surface calls propagate errors via `Result<(), JsValue>`. The
//! caller ([`crate::engine::Estimator`]) logs and drops a failed frame.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::f64::consts::PI;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use wasm_bindgen::JsValue;

use crate::consts::HANDLE_MARKER_RADIUS_PX;
use crate::estimate::overflows;
use crate::handle::OverlayLayout;
use crate::session::RawAmount;
use crate::surface::{Fill, GradientStop, PathOp, Stroke, Surface, TextBaseline, TextStyle};
use crate::viewport::{CanvasSize, Point};

// ── Palette ─────────────────────────────────────────────────────

const BOWL_BLUE: &str = "#00aaff";
const REFERENCE_GREEN: &str = "#00ff00";
const BUNDLE_ORANGE: &str = "#ff6600";
const LABEL_BACKDROP: &str = "rgba(0, 0, 0, 0.8)";
const INK: &str = "#2c3e50";
const PLAIN_BACKGROUND: &str = "#1f1f1f";

const STATIC_BACKGROUND: &str = "#f0f0f0";
const STATIC_GRID: &str = "#ddd";
const STATIC_BOWL_FILL: &str = "rgba(255, 255, 255, 0.9)";
const STATIC_CROSSHAIR: &str = "rgba(0, 0, 0, 0.2)";

const RESULT_BOWL_FILL: &str = "#f8f9fa";
const RESULT_BOWL_STROKE: &str = "#34495e";
const STRAND_INK: &str = "rgba(0, 0, 0, 0.15)";
const WARNING_RED: &str = "#e74c3c";

const PASTA_GRADIENT: [GradientStop<'static>; 3] = [
    GradientStop { offset: 0.0, color: "#f4d03f" },
    GradientStop { offset: 0.5, color: "#f39c12" },
    GradientStop { offset: 1.0, color: "#e67e22" },
];

/// Dash pattern for the bowl outline in canvas pixels.
const BOWL_DASH: [f64; 2] = [10.0, 5.0];

/// Spacing of the static fallback grid in canvas pixels.
const GRID_STEP_PX: f64 = 20.0;

/// Largest bowl diameter the static fallback scales against.
const STATIC_BOWL_SCALE_IN: f64 = 14.0;

/// Static bowl at the scale maximum spans this fraction of the canvas width.
const STATIC_BOWL_MAX_FRACTION: f64 = 0.8;

fn label_style<'a>(color: &'a str, font: &'a str) -> TextStyle<'a> {
    TextStyle { color, font, baseline: TextBaseline::Middle }
}

/// A dark backdrop box with text drawn over it.
fn boxed_label<S: Surface>(
    s: &S,
    text: &str,
    box_origin: Point,
    box_size: CanvasSize,
    text_at: Point,
    style: &TextStyle<'_>,
) -> Result<(), JsValue> {
    s.fill_rect(box_origin, box_size, LABEL_BACKDROP)?;
    s.text(text, text_at, style)
}

// =============================================================
// Calibration view
// =============================================================

/// Draw the live calibration overlay: video frame, bowl circle, reference line.
///
/// # Errors
///
/// Returns `Err` if any surface call fails.
pub fn draw_calibration<S: Surface>(s: &S, video: Option<&S::Video>, layout: &OverlayLayout) -> Result<(), JsValue> {
    let c = layout.center;
    s.clear(layout.canvas)?;
    if let Some(video) = video {
        s.draw_video(video, layout.canvas)?;
    }

    // Bowl behind the reference line.
    s.stroke_circle(c, layout.bowl_radius_px, &Stroke::dashed(BOWL_BLUE, 4.0, &BOWL_DASH))?;
    boxed_label(
        s,
        &format!("BOWL ({}\")", layout.bowl_diameter_in),
        Point::new(c.x - 60.0, c.y - 15.0),
        CanvasSize::new(120.0, 30.0),
        c,
        &label_style(BOWL_BLUE, "bold 16px Arial"),
    )?;

    let (start, end) = layout.reference_handle().endpoints();
    s.stroke_line(start, end, &Stroke::solid(REFERENCE_GREEN, 8.0))?;
    s.fill_circle(start, HANDLE_MARKER_RADIUS_PX, REFERENCE_GREEN)?;
    s.fill_circle(end, HANDLE_MARKER_RADIUS_PX, REFERENCE_GREEN)?;
    boxed_label(
        s,
        "SPAGHETTI (10\")",
        Point::new(c.x - 80.0, c.y - 50.0),
        CanvasSize::new(160.0, 30.0),
        Point::new(c.x, c.y - 35.0),
        &label_style(REFERENCE_GREEN, "bold 18px Arial"),
    )
}

/// Draw the no-camera calibration view: grid, bowl sized relative to 14", label.
///
/// # Errors
///
/// Returns `Err` if any surface call fails.
pub fn draw_static_calibration<S: Surface>(s: &S, size: CanvasSize, bowl_diameter_in: f64) -> Result<(), JsValue> {
    let c = size.center();
    s.clear(size)?;
    s.fill_rect(Point::default(), size, STATIC_BACKGROUND)?;

    let grid = Stroke::solid(STATIC_GRID, 1.0);
    let mut x = 0.0;
    while x < size.width {
        s.stroke_line(Point::new(x, 0.0), Point::new(x, size.height), &grid)?;
        x += GRID_STEP_PX;
    }
    let mut y = 0.0;
    while y < size.height {
        s.stroke_line(Point::new(0.0, y), Point::new(size.width, y), &grid)?;
        y += GRID_STEP_PX;
    }

    let radius = static_bowl_radius(size, bowl_diameter_in);
    s.fill_circle(c, radius, STATIC_BOWL_FILL)?;
    s.stroke_circle(c, radius, &Stroke::solid(INK, 3.0))?;

    let crosshair = Stroke::solid(STATIC_CROSSHAIR, 1.0);
    s.stroke_line(Point::new(c.x - radius, c.y), Point::new(c.x + radius, c.y), &crosshair)?;
    s.stroke_line(Point::new(c.x, c.y - radius), Point::new(c.x, c.y + radius), &crosshair)?;

    let style = TextStyle { color: INK, font: "bold 18px Arial", baseline: TextBaseline::Alphabetic };
    s.text(&format!("{bowl_diameter_in}\""), c, &style)
}

#[must_use]
pub fn static_bowl_radius(size: CanvasSize, bowl_diameter_in: f64) -> f64 {
    let max_radius = size.width * STATIC_BOWL_MAX_FRACTION / 2.0;
    bowl_diameter_in / STATIC_BOWL_SCALE_IN * max_radius
}

// =============================================================
// Bundle view
// =============================================================

/// Draw the bundle-sizing overlay and the live raw amount readout.
///
/// # Errors
///
/// Returns `Err` if any surface call fails.
pub fn draw_bundle<S: Surface>(
    s: &S,
    video: Option<&S::Video>,
    layout: &OverlayLayout,
    raw: RawAmount,
) -> Result<(), JsValue> {
    s.clear(layout.canvas)?;
    match video {
        Some(video) => s.draw_video(video, layout.canvas)?,
        None => s.fill_rect(Point::default(), layout.canvas, PLAIN_BACKGROUND)?,
    }

    s.stroke_circle(layout.center, layout.bowl_radius_px, &Stroke::dashed(BOWL_BLUE, 3.0, &BOWL_DASH))?;

    let bundle = layout.bundle_handle();
    let b = bundle.center;
    s.stroke_circle(b, bundle.radius_px(), &Stroke::solid(BUNDLE_ORANGE, 4.0))?;
    s.fill_circle(bundle.grip(), HANDLE_MARKER_RADIUS_PX, BUNDLE_ORANGE)?;
    boxed_label(
        s,
        &format!("PASTA ({:.1}\")", bundle.diameter_in),
        Point::new(b.x - 70.0, b.y - 15.0),
        CanvasSize::new(140.0, 30.0),
        b,
        &label_style(BUNDLE_ORANGE, "bold 16px Arial"),
    )?;

    let readout_y = layout.canvas.height - 30.0;
    boxed_label(
        s,
        &format!("≈ {raw}"),
        Point::new(layout.center.x - 80.0, readout_y - 15.0),
        CanvasSize::new(160.0, 30.0),
        Point::new(layout.center.x, readout_y),
        &label_style(BUNDLE_ORANGE, "bold 16px Arial"),
    )
}

// =============================================================
// Result view
// =============================================================

/// Inset between the bowl rim and the highest possible pasta surface.
const RIM_CLEARANCE_PX: f64 = 30.0;

/// Strands are only drawn when the pasta is at least this tall.
const MIN_STRAND_FILL_PX: f64 = 20.0;

const WAVE_COUNT: u32 = 5;
const WAVE_AMPLITUDE_PX: f64 = 5.0;

/// Side-profile bowl geometry for a result canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultGeometry {
    pub size: CanvasSize,
    pub center_x: f64,
    pub width: f64,
    pub height: f64,
    pub top: f64,
    pub bottom: f64,
}

impl ResultGeometry {
    #[must_use]
    pub fn new(size: CanvasSize) -> Self {
        let width = size.width * 0.7;
        let height = size.height * 0.6;
        let bottom = size.height * 0.85;
        Self { size, center_x: size.width / 2.0, width, height, top: bottom - height, bottom }
    }

    /// Height of the usable interior below the rim clearance.
    #[must_use]
    pub fn interior_height(&self) -> f64 {
        (self.height - RIM_CLEARANCE_PX).max(0.0)
    }

    /// Pasta height in pixels for a fill percentage.
    #[must_use]
    pub fn fill_height(&self, fill_pct: f64) -> f64 {
        self.interior_height() * (fill_pct.clamp(0.0, 100.0) / 100.0)
    }

    #[must_use]
    pub fn pasta_top(&self, fill_height: f64) -> f64 {
        self.bottom - 10.0 - fill_height
    }

    /// Pasta surface width: the bowl narrows toward the bottom.
    #[must_use]
    pub fn pasta_width(&self, fill_height: f64) -> f64 {
        let interior = self.interior_height();
        let ratio = if interior > 0.0 { fill_height / interior } else { 0.0 };
        self.width * 0.6 + self.width * 0.2 * ratio
    }

    #[must_use]
    pub fn bowl_path(&self) -> Vec<PathOp> {
        let (cx, hw) = (self.center_x, self.width / 2.0);
        let rim_y = self.top + 20.0;
        let base_y = self.bottom - 10.0;
        vec![
            PathOp::MoveTo(Point::new(cx - hw, rim_y)),
            PathOp::QuadTo {
                ctrl: Point::new(cx - hw + 20.0, self.bottom - self.height / 2.0),
                to: Point::new(cx - self.width / 3.0, base_y),
            },
            PathOp::QuadTo { ctrl: Point::new(cx, self.bottom), to: Point::new(cx + self.width / 3.0, base_y) },
            PathOp::QuadTo {
                ctrl: Point::new(cx + hw - 20.0, self.bottom - self.height / 2.0),
                to: Point::new(cx + hw, rim_y),
            },
            PathOp::Close,
        ]
    }

    /// Pasta outline with a wavy top surface, following the bowl's bottom curve.
    #[must_use]
    pub fn pasta_path(&self, fill_height: f64) -> Vec<PathOp> {
        let cx = self.center_x;
        let top = self.pasta_top(fill_height);
        let half = self.pasta_width(fill_height) / 2.0;
        let base_y = self.bottom - 10.0;
        let side_ctrl_y = self.bottom - self.height / 3.0;

        let mut ops = vec![PathOp::MoveTo(Point::new(cx - half, top))];
        for i in 0..=WAVE_COUNT {
            let step = f64::from(i);
            let x = cx - half + 2.0 * half * step / f64::from(WAVE_COUNT);
            ops.push(PathOp::LineTo(Point::new(x, top + (step * PI / 2.0).sin() * WAVE_AMPLITUDE_PX)));
        }
        ops.extend([
            PathOp::LineTo(Point::new(cx + half, top)),
            PathOp::QuadTo { ctrl: Point::new(cx + half + 10.0, side_ctrl_y), to: Point::new(cx + self.width / 3.0, base_y) },
            PathOp::QuadTo { ctrl: Point::new(cx, self.bottom), to: Point::new(cx - self.width / 3.0, base_y) },
            PathOp::QuadTo { ctrl: Point::new(cx - half - 10.0, side_ctrl_y), to: Point::new(cx - half, top) },
            PathOp::Close,
        ]);
        ops
    }
}

/// One decorative strand stroke across the pasta surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strand {
    pub start: Point,
    pub ctrl: Point,
    pub end: Point,
}

/// Deterministic strand strokes for a given fill height.
///
/// Empty when the pasta is too shallow to show texture.
#[must_use]
pub fn strands(geometry: &ResultGeometry, fill_height: f64, count: u32, seed: u64) -> Vec<Strand> {
    if fill_height <= MIN_STRAND_FILL_PX {
        return Vec::new();
    }
    let mut rng = SmallRng::seed_from_u64(seed);
    let cx = geometry.center_x;
    let top = geometry.pasta_top(fill_height);
    let third = geometry.pasta_width(fill_height) / 3.0;

    (0..count)
        .map(|_| {
            let y = top + 10.0 + rng.random_range(0.0..1.0) * (fill_height - 20.0);
            let x_start = cx - third + rng.random_range(0.0..20.0);
            let x_end = cx + third - rng.random_range(0.0..20.0);
            let curve = rng.random_range(-10.0..10.0);
            let sag = rng.random_range(-5.0..5.0);
            Strand {
                start: Point::new(x_start, y),
                ctrl: Point::new(cx + curve, y + sag),
                end: Point::new(x_end, y),
            }
        })
        .collect()
}

/// Strand texture parameters for the result view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrandTexture {
    pub count: u32,
    pub seed: u64,
}

/// Draw the one-shot result view: bowl profile, pasta fill, percentage text.
///
/// # Errors
///
/// Returns `Err` if any surface call fails.
pub fn draw_result<S: Surface>(s: &S, size: CanvasSize, fill_pct: f64, texture: StrandTexture) -> Result<(), JsValue> {
    let g = ResultGeometry::new(size);
    s.clear(size)?;

    let bowl = g.bowl_path();
    s.fill_path(&bowl, &Fill::Solid(RESULT_BOWL_FILL))?;
    s.stroke_path(&bowl, &Stroke::solid(RESULT_BOWL_STROKE, 3.0))?;

    let fill_height = g.fill_height(fill_pct);
    if fill_height > 0.0 {
        let gradient = Fill::Vertical { y0: g.pasta_top(fill_height), y1: g.bottom, stops: &PASTA_GRADIENT };
        s.fill_path(&g.pasta_path(fill_height), &gradient)?;

        let ink = Stroke::solid(STRAND_INK, 2.0);
        for strand in strands(&g, fill_height, texture.count, texture.seed) {
            let ops = [PathOp::MoveTo(strand.start), PathOp::QuadTo { ctrl: strand.ctrl, to: strand.end }];
            s.stroke_path(&ops, &ink)?;
        }
    }

    if fill_pct > 0.0 {
        s.text(
            &format!("{fill_pct:.0}% Full"),
            Point::new(g.center_x, g.top - 30.0),
            &label_style(INK, "bold 28px Arial"),
        )?;
    }

    if overflows(fill_pct) {
        s.text(
            "⚠️ Bowl may overflow!",
            Point::new(g.center_x, g.top - 60.0),
            &label_style(WARNING_RED, "bold 18px Arial"),
        )?;
    }

    Ok(())
}

//! 2D drawing surface.
//!
//! The painters in [`crate::render`] only see the [`Surface`] trait, so they can
//! be exercised against a recording surface in tests. The one production
//! implementation is for [`CanvasRenderingContext2d`], and this file is the
//! only place that calls into it.
//!
//! Every operation sets the full state it needs (colour, width, dash, font)
//! before drawing, so callers never depend on state left by a previous call.

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlVideoElement};

use crate::viewport::{CanvasSize, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextBaseline {
    Alphabetic,
    Middle,
}

impl TextBaseline {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alphabetic => "alphabetic",
            Self::Middle => "middle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke<'a> {
    pub color: &'a str,
    pub width: f64,
    /// Alternating dash and gap lengths; empty for a solid line.
    pub dash: &'a [f64],
}

impl<'a> Stroke<'a> {
    #[must_use]
    pub fn solid(color: &'a str, width: f64) -> Self {
        Self { color, width, dash: &[] }
    }

    #[must_use]
    pub fn dashed(color: &'a str, width: f64, dash: &'a [f64]) -> Self {
        Self { color, width, dash }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop<'a> {
    pub offset: f32,
    pub color: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill<'a> {
    Solid(&'a str),
    /// Top-to-bottom linear gradient between `y0` and `y1`.
    Vertical { y0: f64, y1: f64, stops: &'a [GradientStop<'a>] },
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Text is always centred horizontally on its anchor point.
pub struct TextStyle<'a> {
    pub color: &'a str,
    pub font: &'a str,
    pub baseline: TextBaseline,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathOp {
    MoveTo(Point),
    LineTo(Point),
    QuadTo { ctrl: Point, to: Point },
    /// Straight segment back to the subpath's start.
    Close,
}

/// Anything that can report the size of its current video frame.
pub trait VideoSource {
    /// Frame size in pixels, or `None` before the first frame has decoded.
    fn frame_size(&self) -> Option<CanvasSize>;
}

impl VideoSource for HtmlVideoElement {
    fn frame_size(&self) -> Option<CanvasSize> {
        let (w, h) = (self.video_width(), self.video_height());
        (w > 0 && h > 0).then(|| CanvasSize::new(f64::from(w), f64::from(h)))
    }
}

pub trait Surface {
    type Video: VideoSource;

    /// Clear the whole canvas to transparent.
    fn clear(&self, size: CanvasSize) -> Result<(), JsValue>;

    fn fill_rect(&self, origin: Point, size: CanvasSize, color: &str) -> Result<(), JsValue>;

    fn fill_circle(&self, center: Point, radius: f64, color: &str) -> Result<(), JsValue>;

    fn stroke_circle(&self, center: Point, radius: f64, stroke: &Stroke<'_>) -> Result<(), JsValue>;

    fn stroke_line(&self, from: Point, to: Point, stroke: &Stroke<'_>) -> Result<(), JsValue>;

    fn fill_path(&self, ops: &[PathOp], fill: &Fill<'_>) -> Result<(), JsValue>;

    fn stroke_path(&self, ops: &[PathOp], stroke: &Stroke<'_>) -> Result<(), JsValue>;

    fn text(&self, text: &str, at: Point, style: &TextStyle<'_>) -> Result<(), JsValue>;

    /// Paint the current video frame scaled to `size` at the origin.
    fn draw_video(&self, video: &Self::Video, size: CanvasSize) -> Result<(), JsValue>;
}

// =============================================================
// Canvas2D
// =============================================================

fn apply_stroke(ctx: &CanvasRenderingContext2d, stroke: &Stroke<'_>) -> Result<(), JsValue> {
    ctx.set_stroke_style_str(stroke.color);
    ctx.set_line_width(stroke.width);
    let dash_array = js_sys::Array::new();
    for &segment in stroke.dash {
        dash_array.push(&segment.into());
    }
    ctx.set_line_dash(&dash_array)
}

fn trace_path(ctx: &CanvasRenderingContext2d, ops: &[PathOp]) {
    ctx.begin_path();
    for op in ops {
        match *op {
            PathOp::MoveTo(p) => ctx.move_to(p.x, p.y),
            PathOp::LineTo(p) => ctx.line_to(p.x, p.y),
            PathOp::QuadTo { ctrl, to } => ctx.quadratic_curve_to(ctrl.x, ctrl.y, to.x, to.y),
            PathOp::Close => ctx.close_path(),
        }
    }
}

fn trace_circle(ctx: &CanvasRenderingContext2d, center: Point, radius: f64) -> Result<(), JsValue> {
    ctx.begin_path();
    ctx.arc(center.x, center.y, radius.max(0.0), 0.0, std::f64::consts::TAU)
}

impl Surface for CanvasRenderingContext2d {
    type Video = HtmlVideoElement;

    fn clear(&self, size: CanvasSize) -> Result<(), JsValue> {
        self.clear_rect(0.0, 0.0, size.width, size.height);
        Ok(())
    }

    fn fill_rect(&self, origin: Point, size: CanvasSize, color: &str) -> Result<(), JsValue> {
        self.set_fill_style_str(color);
        CanvasRenderingContext2d::fill_rect(self, origin.x, origin.y, size.width, size.height);
        Ok(())
    }

    fn fill_circle(&self, center: Point, radius: f64, color: &str) -> Result<(), JsValue> {
        trace_circle(self, center, radius)?;
        self.set_fill_style_str(color);
        self.fill();
        Ok(())
    }

    fn stroke_circle(&self, center: Point, radius: f64, stroke: &Stroke<'_>) -> Result<(), JsValue> {
        trace_circle(self, center, radius)?;
        apply_stroke(self, stroke)?;
        self.stroke();
        Ok(())
    }

    fn stroke_line(&self, from: Point, to: Point, stroke: &Stroke<'_>) -> Result<(), JsValue> {
        self.begin_path();
        self.move_to(from.x, from.y);
        self.line_to(to.x, to.y);
        apply_stroke(self, stroke)?;
        self.stroke();
        Ok(())
    }

    fn fill_path(&self, ops: &[PathOp], fill: &Fill<'_>) -> Result<(), JsValue> {
        trace_path(self, ops);
        match *fill {
            Fill::Solid(color) => self.set_fill_style_str(color),
            Fill::Vertical { y0, y1, stops } => {
                let gradient = self.create_linear_gradient(0.0, y0, 0.0, y1);
                for stop in stops {
                    gradient.add_color_stop(stop.offset, stop.color)?;
                }
                self.set_fill_style_canvas_gradient(&gradient);
            }
        }
        self.fill();
        Ok(())
    }

    fn stroke_path(&self, ops: &[PathOp], stroke: &Stroke<'_>) -> Result<(), JsValue> {
        trace_path(self, ops);
        apply_stroke(self, stroke)?;
        self.stroke();
        Ok(())
    }

    fn text(&self, text: &str, at: Point, style: &TextStyle<'_>) -> Result<(), JsValue> {
        self.set_fill_style_str(style.color);
        self.set_font(style.font);
        self.set_text_align("center");
        self.set_text_baseline(style.baseline.as_str());
        self.fill_text(text, at.x, at.y)
    }

    fn draw_video(&self, video: &HtmlVideoElement, size: CanvasSize) -> Result<(), JsValue> {
        self.draw_image_with_html_video_element_and_dw_and_dh(video, 0.0, 0.0, size.width, size.height)
    }
}

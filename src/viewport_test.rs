#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-10;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

fn mapping(left: f64, top: f64, dw: f64, dh: f64, cw: f64, ch: f64) -> CanvasMapping {
    CanvasMapping { left, top, display_width: dw, display_height: dh, canvas: CanvasSize::new(cw, ch) }
}

// --- Point ---

#[test]
fn point_distance() {
    assert!(approx_eq(Point::new(0.0, 0.0).distance_to(Point::new(3.0, 4.0)), 5.0));
}

#[test]
fn point_distance_symmetric() {
    let a = Point::new(-2.0, 7.5);
    let b = Point::new(10.0, 1.0);
    assert!(approx_eq(a.distance_to(b), b.distance_to(a)));
}

#[test]
fn canvas_center() {
    assert_eq!(CanvasSize::new(640.0, 480.0).center(), Point::new(320.0, 240.0));
}

// --- CanvasMapping ---

#[test]
fn mapping_identity() {
    let m = mapping(0.0, 0.0, 400.0, 400.0, 400.0, 400.0);
    assert!(point_approx_eq(m.to_canvas(Point::new(123.0, 45.0)), Point::new(123.0, 45.0)));
}

#[test]
fn mapping_subtracts_offset() {
    let m = mapping(10.0, 20.0, 400.0, 400.0, 400.0, 400.0);
    assert!(point_approx_eq(m.to_canvas(Point::new(110.0, 120.0)), Point::new(100.0, 100.0)));
}

#[test]
fn mapping_scales_up_from_css() {
    // 1280x720 video shown in a 640x360 box.
    let m = mapping(0.0, 0.0, 640.0, 360.0, 1280.0, 720.0);
    assert!(point_approx_eq(m.to_canvas(Point::new(320.0, 180.0)), Point::new(640.0, 360.0)));
}

#[test]
fn mapping_scales_axes_independently() {
    // Stretched box: x scale 2, y scale 4.
    let m = mapping(0.0, 0.0, 320.0, 90.0, 640.0, 360.0);
    assert!(approx_eq(m.scale_x(), 2.0));
    assert!(approx_eq(m.scale_y(), 4.0));
    assert!(point_approx_eq(m.to_canvas(Point::new(10.0, 10.0)), Point::new(20.0, 40.0)));
}

#[test]
fn mapping_offset_then_scale() {
    let m = mapping(50.0, 30.0, 200.0, 100.0, 400.0, 300.0);
    assert!(point_approx_eq(m.to_canvas(Point::new(150.0, 80.0)), Point::new(200.0, 150.0)));
}

#[test]
fn mapping_zero_display_falls_back_to_unit_scale() {
    let m = mapping(0.0, 0.0, 0.0, 0.0, 640.0, 480.0);
    assert_eq!(m.scale_x(), 1.0);
    assert_eq!(m.scale_y(), 1.0);
}

// --- Canvas sizing ---

#[test]
fn calibration_uses_video_size() {
    let size = calibration_canvas_size(Some(CanvasSize::new(1280.0, 720.0)), 360.0);
    assert_eq!(size, CanvasSize::new(1280.0, 720.0));
}

#[test]
fn calibration_without_video_is_square() {
    assert_eq!(calibration_canvas_size(None, 360.0), CanvasSize::new(360.0, 360.0));
}

#[test]
fn calibration_without_video_caps_at_400() {
    assert_eq!(calibration_canvas_size(None, 1024.0), CanvasSize::new(400.0, 400.0));
}

#[test]
fn calibration_ignores_zero_sized_frame() {
    assert_eq!(calibration_canvas_size(Some(CanvasSize::default()), 300.0), CanvasSize::new(300.0, 300.0));
}

#[test]
fn bundle_falls_back_to_container() {
    let container = CanvasSize::new(500.0, 320.0);
    assert_eq!(bundle_canvas_size(None, container), container);
    let video = CanvasSize::new(640.0, 480.0);
    assert_eq!(bundle_canvas_size(Some(video), container), video);
}

#[test]
fn result_size_is_padded_and_wide() {
    assert_eq!(result_canvas_size(300.0), CanvasSize::new(260.0, 208.0));
    assert_eq!(result_canvas_size(1000.0), CanvasSize::new(400.0, 320.0));
}

#[test]
fn result_size_never_negative() {
    assert_eq!(result_canvas_size(10.0), CanvasSize::new(0.0, 0.0));
}

//! Camera-assisted bowl fill estimator.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It walks the
//! user through four steps: pick a pasta, calibrate a 10-inch reference strand
//! and the bowl against the live camera, size the dry pasta bundle, and see how
//! full the bowl will be once the pasta is cooked. The host page only wires DOM
//! events and form widgets to [`engine::Estimator`]; everything that reads or
//! writes measurements lives here.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Step flow, testable [`engine::EstimatorCore`], and the browser-bound [`engine::Estimator`] |
//! | [`session`] | Mutable session state and its derived values |
//! | [`pasta`] | Static pasta catalog |
//! | [`estimate`] | Bundle mass and fill-percentage formulas |
//! | [`config`] | Empirical tuning constants, overridable from JSON |
//! | [`viewport`] | Points, canvas sizing, and display-to-canvas mapping |
//! | [`handle`] | Overlay layout and the calibrated draggable handles |
//! | [`input`] | Drag state machine shared by both handles |
//! | [`surface`] | 2D drawing surface trait and its `Canvas2D` implementation |
//! | [`render`] | Calibration, bundle, and result painters |
//! | [`frame_loop`] | Cancellable per-frame redraw task |
//! | [`camera`] | Camera state and the owned media stream |
//! | [`consts`] | Shared numeric constants (clamps, grab radius, unit factors) |

use wasm_bindgen::prelude::*;

pub mod camera;
pub mod config;
pub mod consts;
pub mod engine;
pub mod estimate;
pub mod frame_loop;
pub mod handle;
pub mod input;
pub mod pasta;
pub mod render;
pub mod session;
pub mod surface;
pub mod viewport;

/// Module entry point: install the panic hook and the console logger.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Debug).is_err() {
        web_sys::console::warn_1(&JsValue::from_str("logger already initialized"));
    }
}

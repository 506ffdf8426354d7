//! Step flow and the browser-facing estimator.
//!
//! [`EstimatorCore`] owns every piece of state that does not need the DOM:
//! the session, the current step, camera state, and both drags. Its methods
//! return [`Action`]s instead of touching the page. [`Estimator`] wraps it
//! with the real canvases, the `<video>` element, the live camera stream, and
//! the frame loop, and applies those actions.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlVideoElement, MouseEvent, TouchEvent};

use crate::camera::{CameraError, CameraState, CameraStream};
use crate::config::Tuning;
use crate::estimate::{EstimateError, EstimateSummary};
use crate::frame_loop::{AnimationFrames, FrameLoop};
use crate::handle::{CalibratedHandle, OverlayLayout};
use crate::input::Drag;
use crate::pasta::{PastaError, PastaKind};
use crate::render::{self, StrandTexture};
use crate::session::{MassUnit, RawAmount, Session, SessionSnapshot};
use crate::surface::VideoSource;
use crate::viewport::{self, CanvasMapping, CanvasSize, Point};

/// The four screens, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    /// Choose the pasta shape.
    #[default]
    SelectPasta,
    /// Size a 10-inch reference line against the camera.
    Calibrate,
    /// Fit the circle or bowl around the dry pasta.
    MeasureBundle,
    /// Show the raw and cooked estimate.
    ShowResult,
}

impl Step {
    /// One-based position, as shown in the step indicator.
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Self::SelectPasta => 1,
            Self::Calibrate => 2,
            Self::MeasureBundle => 3,
            Self::ShowResult => 4,
        }
    }

    /// Steps that show the live camera.
    #[must_use]
    pub fn uses_camera(self) -> bool {
        matches!(self, Self::Calibrate | Self::MeasureBundle)
    }
}

/// A canvas the engine paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    /// Camera feed with the draggable reference line.
    Calibration,
    /// Camera feed with the bundle circle or bowl overlay.
    Bundle,
    /// Static portion diagram on the result step.
    Result,
}

impl View {
    /// Parse the id the host uses for a canvas.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "calibration" => Some(Self::Calibration),
            "bundle" => Some(Self::Bundle),
            "result" => Some(Self::Result),
            _ => None,
        }
    }
}

/// Host-side containers the canvases are sized against, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Containers {
    pub calibration_width: f64,
    pub bundle: CanvasSize,
    pub result_width: f64,
}

impl Default for Containers {
    fn default() -> Self {
        Self { calibration_width: 400.0, bundle: CanvasSize::new(640.0, 480.0), result_width: 440.0 }
    }
}

pub const CURSOR_DEFAULT: &str = "default";
pub const CURSOR_GRAB: &str = "grab";
pub const CURSOR_GRABBING: &str = "grabbing";

/// Actions returned from engine operations for the host to process.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Action {
    /// Repaint the current step's canvas once.
    RenderNeeded,
    /// Start repainting the view every animation frame.
    StartLoop(View),
    /// Cancel the view's animation frame loop.
    StopLoop(View),
    /// Request the rear camera; the ticket identifies this request when it resolves.
    AcquireCamera(u64),
    /// Stop the camera tracks and detach the video element.
    ReleaseCamera,
    /// Replace the camera status line.
    CameraStatus(String),
    /// The visible step changed.
    StepChanged(Step),
    /// Bundle size or its raw amount changed.
    BundleChanged { diameter_in: f64, raw_amount: RawAmount },
    /// A fresh estimate for the result step.
    EstimateReady(EstimateSummary),
    /// Set a canvas's backing size in pixels.
    ResizeCanvas { view: View, size: CanvasSize },
    /// Set the CSS cursor over the active canvas.
    SetCursor(String),
}

/// Bindable view of the whole engine for the host UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub step: Step,
    pub step_number: u8,
    pub can_advance: bool,
    pub camera_status: &'static str,
    pub camera_active: bool,
    pub session: SessionSnapshot,
}

/// Core estimator state: all logic that doesn't depend on the DOM.
///
/// Separated from [`Estimator`] so it can be tested without WASM/browser dependencies.
#[derive(Debug, Clone)]
pub struct EstimatorCore {
    pub session: Session,
    step: Step,
    camera: CameraState,
    reference_drag: Drag,
    bundle_drag: Drag,
    containers: Containers,
    active_loop: Option<View>,
    cursor: &'static str,
    last_bundle: Option<(f64, RawAmount)>,
    camera_ticket: u64,
}

impl Default for EstimatorCore {
    fn default() -> Self {
        Self::new(Tuning::default())
    }
}

impl EstimatorCore {
    #[must_use]
    pub fn new(tuning: Tuning) -> Self {
        Self {
            session: Session::new(tuning),
            step: Step::SelectPasta,
            camera: CameraState::Off,
            reference_drag: Drag::new(),
            bundle_drag: Drag::new(),
            containers: Containers::default(),
            active_loop: None,
            cursor: CURSOR_DEFAULT,
            last_bundle: None,
            camera_ticket: 0,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn step(&self) -> Step {
        self.step
    }

    #[must_use]
    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    #[must_use]
    pub fn active_loop(&self) -> Option<View> {
        self.active_loop
    }

    #[must_use]
    pub fn containers(&self) -> Containers {
        self.containers
    }

    #[must_use]
    pub fn can_advance(&self) -> bool {
        match self.step {
            Step::SelectPasta => self.session.pasta.is_some(),
            Step::Calibrate | Step::MeasureBundle => true,
            Step::ShowResult => false,
        }
    }

    /// Canvas size for `view` given the camera frame and container sizes.
    #[must_use]
    pub fn canvas_size(&self, view: View) -> CanvasSize {
        let frame = self.camera.frame_size();
        match view {
            View::Calibration => viewport::calibration_canvas_size(frame, self.containers.calibration_width),
            View::Bundle => viewport::bundle_canvas_size(frame, self.containers.bundle),
            View::Result => viewport::result_canvas_size(self.containers.result_width),
        }
    }

    #[must_use]
    pub fn layout(&self, view: View) -> OverlayLayout {
        OverlayLayout::new(&self.session, self.canvas_size(view))
    }

    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            step: self.step,
            step_number: self.step.number(),
            can_advance: self.can_advance(),
            camera_status: self.camera.status_message(),
            camera_active: self.camera.is_active(),
            session: self.session.snapshot(),
        }
    }

    // --- Step flow ---

    pub fn select_pasta(&mut self, kind: PastaKind) {
        self.session.pasta = Some(kind);
    }

    /// Select a pasta by catalog id.
    ///
    /// # Errors
    ///
    /// Returns [`PastaError::UnknownKind`] for an id not in the catalog.
    pub fn select_pasta_id(&mut self, id: &str) -> Result<(), PastaError> {
        self.select_pasta(id.parse()?);
        Ok(())
    }

    /// Move to the next step.
    ///
    /// # Errors
    ///
    /// Returns [`EstimateError::MissingSelection`] when leaving the first step,
    /// or computing the estimate, without a pasta kind.
    pub fn advance(&mut self) -> Result<Vec<Action>, EstimateError> {
        match self.step {
            Step::SelectPasta => {
                if self.session.pasta.is_none() {
                    return Err(EstimateError::MissingSelection);
                }
                Ok(self.enter(Step::Calibrate))
            }
            Step::Calibrate => Ok(self.enter(Step::MeasureBundle)),
            Step::MeasureBundle => {
                let estimate = self.session.estimate()?;
                let raw = self.session.raw_amount();
                let Some(kind) = self.session.pasta else {
                    return Err(EstimateError::MissingSelection);
                };
                let summary = EstimateSummary::new(kind, self.session.bowl_diameter_in(), raw, &estimate);
                log::info!("estimate: {:.1}% full ({raw} of {kind})", estimate.fill_pct);

                let mut actions = self.enter(Step::ShowResult);
                actions.insert(0, Action::EstimateReady(summary));
                Ok(actions)
            }
            Step::ShowResult => Ok(Vec::new()),
        }
    }

    /// Start over from any step with a fresh session.
    pub fn reset(&mut self) -> Vec<Action> {
        let mut actions = self.stop_loop();
        actions.extend(self.release_camera());
        self.session.reset();
        self.reference_drag.release();
        self.bundle_drag.release();
        self.last_bundle = None;
        self.cursor = CURSOR_DEFAULT;
        self.step = Step::SelectPasta;
        log::info!("session reset");
        actions.push(Action::CameraStatus(self.camera.status_message().to_owned()));
        actions.push(Action::StepChanged(self.step));
        actions
    }

    fn enter(&mut self, next: Step) -> Vec<Action> {
        log::info!("step {} -> {}", self.step.number(), next.number());
        let mut actions = self.stop_loop();
        if !next.uses_camera() {
            actions.extend(self.release_camera());
        }
        self.reference_drag.release();
        self.bundle_drag.release();
        self.step = next;
        actions.push(Action::StepChanged(next));

        match next {
            Step::SelectPasta => {}
            Step::Calibrate => {
                actions.push(self.resize(View::Calibration));
                actions.push(Action::CameraStatus(self.camera.status_message().to_owned()));
                if self.camera.is_active() {
                    actions.push(self.start_loop(View::Calibration));
                } else {
                    actions.push(Action::RenderNeeded);
                }
            }
            Step::MeasureBundle => {
                actions.push(self.resize(View::Bundle));
                actions.push(self.report_bundle());
                actions.push(self.start_loop(View::Bundle));
            }
            Step::ShowResult => {
                actions.push(self.resize(View::Result));
                actions.push(Action::RenderNeeded);
            }
        }
        actions
    }

    fn resize(&self, view: View) -> Action {
        Action::ResizeCanvas { view, size: self.canvas_size(view) }
    }

    fn start_loop(&mut self, view: View) -> Action {
        self.active_loop = Some(view);
        Action::StartLoop(view)
    }

    fn stop_loop(&mut self) -> Vec<Action> {
        self.active_loop.take().map(Action::StopLoop).into_iter().collect()
    }

    fn release_camera(&mut self) -> Vec<Action> {
        if self.camera == CameraState::Off {
            return Vec::new();
        }
        self.camera.release();
        vec![Action::ReleaseCamera]
    }

    // --- Camera ---

    /// Ask the host to acquire the camera. The returned ticket identifies
    /// this request; only the newest pending ticket may complete.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::AlreadyAcquired`] while a stream is pending or
    /// live, and [`CameraError::NotCalibrating`] outside the calibration step.
    pub fn begin_camera(&mut self) -> Result<Vec<Action>, CameraError> {
        if self.step != Step::Calibrate {
            return Err(CameraError::NotCalibrating);
        }
        self.camera.begin()?;
        self.camera_ticket += 1;
        log::info!("camera requested (ticket {})", self.camera_ticket);
        Ok(vec![
            Action::CameraStatus(self.camera.status_message().to_owned()),
            Action::AcquireCamera(self.camera_ticket),
        ])
    }

    /// Ticket of the most recent camera request.
    #[must_use]
    pub fn camera_ticket(&self) -> u64 {
        self.camera_ticket
    }

    /// Whether a stream for `ticket` is still wanted.
    #[must_use]
    pub fn awaits_camera(&self, ticket: u64) -> bool {
        ticket == self.camera_ticket && self.camera == CameraState::Pending
    }

    /// The stream for `ticket` is live with frames of `frame` pixels.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::NotActive`] when the request was abandoned by a
    /// reset or superseded by a newer one. The caller must drop that stream
    /// without touching the current one.
    pub fn camera_ready(&mut self, ticket: u64, frame: CanvasSize) -> Result<Vec<Action>, CameraError> {
        if !self.awaits_camera(ticket) {
            log::info!("camera ticket {ticket} is stale; dropping its stream");
            return Err(CameraError::NotActive);
        }
        self.camera.activate(frame)?;
        self.fit_reference_line();

        let mut actions = vec![Action::CameraStatus(self.camera.status_message().to_owned())];
        match self.step {
            Step::Calibrate => {
                actions.push(self.resize(View::Calibration));
                actions.extend(self.stop_loop());
                actions.push(self.start_loop(View::Calibration));
            }
            Step::MeasureBundle => actions.push(self.resize(View::Bundle)),
            Step::SelectPasta | Step::ShowResult => {}
        }
        Ok(actions)
    }

    /// The request for `ticket` failed. Stale tickets are ignored.
    pub fn camera_failed(&mut self, ticket: u64, err: CameraError) -> Vec<Action> {
        log::warn!("camera failed: {err}");
        if !self.awaits_camera(ticket) || !self.camera.fail(err) {
            return Vec::new();
        }
        vec![Action::CameraStatus(self.camera.status_message().to_owned()), Action::RenderNeeded]
    }

    /// Keep the reference line inside the live calibration canvas.
    fn fit_reference_line(&mut self) {
        if !self.camera.is_active() {
            return;
        }
        let width = self.canvas_size(View::Calibration).width;
        let length = self.session.reference_line_px();
        self.session.set_reference_line_px(length, width);
    }

    // --- Bindable setters ---

    pub fn set_bowl_diameter(&mut self, diameter_in: f64) -> Vec<Action> {
        self.session.set_bowl_diameter_in(diameter_in);
        vec![Action::RenderNeeded]
    }

    /// Apply a preset button. Presets bypass the slider clamp.
    pub fn set_bowl_preset(&mut self, diameter_in: f64) -> Vec<Action> {
        self.session.set_bowl_preset_in(diameter_in);
        vec![Action::RenderNeeded]
    }

    pub fn set_bundle_diameter(&mut self, diameter_in: f64) -> Vec<Action> {
        self.session.set_bundle_diameter_in(diameter_in);
        vec![self.report_bundle(), Action::RenderNeeded]
    }

    pub fn set_unit(&mut self, unit: MassUnit) -> Vec<Action> {
        self.session.unit = unit;
        vec![self.report_bundle(), Action::RenderNeeded]
    }

    pub fn set_left_handed(&mut self, left_handed: bool) -> Vec<Action> {
        self.session.left_handed = left_handed;
        vec![Action::RenderNeeded]
    }

    /// Record new container sizes and resize the visible canvas.
    pub fn set_containers(&mut self, containers: Containers) -> Vec<Action> {
        self.containers = containers;
        self.fit_reference_line();
        let view = match self.step {
            Step::SelectPasta => return Vec::new(),
            Step::Calibrate => View::Calibration,
            Step::MeasureBundle => View::Bundle,
            Step::ShowResult => View::Result,
        };
        vec![self.resize(view), Action::RenderNeeded]
    }

    fn report_bundle(&mut self) -> Action {
        let diameter_in = self.session.bundle_diameter_in();
        let raw_amount = self.session.raw_amount();
        self.last_bundle = Some((diameter_in, raw_amount));
        Action::BundleChanged { diameter_in, raw_amount }
    }

    /// Per-frame bookkeeping: report the bundle readout when it changed.
    pub fn frame_tick(&mut self, view: View) -> Vec<Action> {
        if view != View::Bundle {
            return Vec::new();
        }
        let current = (self.session.bundle_diameter_in(), self.session.raw_amount());
        if self.last_bundle == Some(current) {
            return Vec::new();
        }
        vec![self.report_bundle()]
    }

    // --- Pointer input ---

    /// Which view accepts overlay drags right now.
    fn drag_view(&self) -> Option<View> {
        if !self.camera.is_active() {
            return None;
        }
        match self.step {
            Step::Calibrate => Some(View::Calibration),
            Step::MeasureBundle => Some(View::Bundle),
            Step::SelectPasta | Step::ShowResult => None,
        }
    }

    fn set_cursor(&mut self, cursor: &'static str) -> Option<Action> {
        if self.cursor == cursor {
            return None;
        }
        self.cursor = cursor;
        Some(Action::SetCursor(cursor.to_owned()))
    }

    /// Pointer pressed at `pt` (canvas pixels) on `view`.
    pub fn on_pointer_down(&mut self, view: View, pt: Point) -> Vec<Action> {
        if self.drag_view() != Some(view) {
            return Vec::new();
        }
        let layout = self.layout(view);
        let grabbed = match view {
            View::Calibration => self.reference_drag.press(&layout.reference_handle(), pt),
            View::Bundle => self.bundle_drag.press(&layout.bundle_handle(), pt),
            View::Result => false,
        };
        if grabbed { self.set_cursor(CURSOR_GRABBING).into_iter().collect() } else { Vec::new() }
    }

    /// Pointer moved to `pt`. Updates the dragged value or the hover cursor.
    pub fn on_pointer_move(&mut self, view: View, pt: Point) -> Vec<Action> {
        if self.drag_view() != Some(view) {
            return Vec::new();
        }
        let layout = self.layout(view);
        match view {
            View::Calibration => {
                let handle = layout.reference_handle();
                if let Some(length) = self.reference_drag.drag(&handle, pt) {
                    self.session.set_reference_line_px(length, layout.canvas.width);
                    return vec![Action::RenderNeeded];
                }
                self.hover(handle.hit_test(pt))
            }
            View::Bundle => {
                let handle = layout.bundle_handle();
                if let Some(diameter) = self.bundle_drag.drag(&handle, pt) {
                    self.session.set_bundle_diameter_in(diameter);
                    return vec![self.report_bundle(), Action::RenderNeeded];
                }
                self.hover(handle.hit_test(pt))
            }
            View::Result => Vec::new(),
        }
    }

    fn hover(&mut self, over_handle: bool) -> Vec<Action> {
        let cursor = if over_handle { CURSOR_GRAB } else { CURSOR_DEFAULT };
        self.set_cursor(cursor).into_iter().collect()
    }

    /// Pointer released anywhere. Ends any drag on `view`.
    pub fn on_pointer_up(&mut self, view: View) -> Vec<Action> {
        let released = match view {
            View::Calibration => self.reference_drag.release(),
            View::Bundle => self.bundle_drag.release(),
            View::Result => false,
        };
        if released { self.set_cursor(CURSOR_GRAB).into_iter().collect() } else { Vec::new() }
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.reference_drag.is_dragging() || self.bundle_drag.is_dragging()
    }
}

// =============================================================
// Browser binding
// =============================================================

struct Canvas {
    element: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl Canvas {
    fn new(element: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = element
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { element, ctx })
    }

    fn size(&self) -> CanvasSize {
        CanvasSize::new(f64::from(self.element.width()), f64::from(self.element.height()))
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn resize(&self, size: CanvasSize) {
        self.element.set_width(size.width.round().max(0.0) as u32);
        self.element.set_height(size.height.round().max(0.0) as u32);
    }

    fn mapping(&self) -> CanvasMapping {
        let rect = self.element.get_bounding_client_rect();
        CanvasMapping {
            left: rect.left(),
            top: rect.top(),
            display_width: rect.width(),
            display_height: rect.height(),
            canvas: self.size(),
        }
    }
}

struct Shared {
    core: RefCell<EstimatorCore>,
    calibration: Canvas,
    bundle: Canvas,
    result: Canvas,
    video: HtmlVideoElement,
    stream: RefCell<Option<CameraStream>>,
    frame_loop: RefCell<Option<FrameLoop<AnimationFrames>>>,
    listener: RefCell<Option<js_sys::Function>>,
}

impl Shared {
    fn canvas(&self, view: View) -> &Canvas {
        match view {
            View::Calibration => &self.calibration,
            View::Bundle => &self.bundle,
            View::Result => &self.result,
        }
    }

    fn apply(self: &Rc<Self>, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::RenderNeeded => self.render(),
                Action::StartLoop(view) => self.start_loop(view),
                Action::StopLoop(_) => {
                    self.frame_loop.borrow_mut().take();
                }
                Action::AcquireCamera(ticket) => self.acquire_camera(ticket),
                Action::ReleaseCamera => {
                    self.stream.borrow_mut().take();
                }
                Action::ResizeCanvas { view, size } => self.canvas(view).resize(size),
                Action::CameraStatus(_)
                | Action::StepChanged(_)
                | Action::BundleChanged { .. }
                | Action::EstimateReady(_)
                | Action::SetCursor(_) => self.emit(&action),
            }
        }
    }

    fn emit(&self, action: &Action) {
        let Some(listener) = self.listener.borrow().clone() else {
            return;
        };
        match serde_json::to_string(action) {
            Ok(json) => {
                if let Err(err) = listener.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                    log::warn!("listener threw: {err:?}");
                }
            }
            Err(err) => log::warn!("failed to serialize action: {err}"),
        }
    }

    fn start_loop(self: &Rc<Self>, view: View) {
        let scheduler = match AnimationFrames::new() {
            Ok(scheduler) => scheduler,
            Err(err) => {
                log::warn!("no animation frames: {err:?}");
                return;
            }
        };
        let weak: Weak<Self> = Rc::downgrade(self);
        let started = FrameLoop::start(scheduler, move || {
            if let Some(shared) = weak.upgrade() {
                shared.render();
                let actions = shared.core.borrow_mut().frame_tick(view);
                shared.apply(actions);
            }
        });
        match started {
            Ok(frame_loop) => *self.frame_loop.borrow_mut() = Some(frame_loop),
            Err(err) => log::warn!("failed to start {view:?} loop: {err:?}"),
        }
    }

    fn acquire_camera(self: &Rc<Self>, ticket: u64) {
        let weak = Rc::downgrade(self);
        let video = self.video.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let wanted = {
                let weak = weak.clone();
                move || weak.upgrade().is_some_and(|shared| shared.core.borrow().awaits_camera(ticket))
            };
            let result = CameraStream::acquire(video, wanted).await;
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let actions = match result {
                Ok(stream) => {
                    let frame = stream.frame_size().unwrap_or_default();
                    let ready = shared.core.borrow_mut().camera_ready(ticket, frame);
                    match ready {
                        Ok(actions) => {
                            *shared.stream.borrow_mut() = Some(stream);
                            actions
                        }
                        Err(err) => {
                            // Only this stream is dropped; the stored one stays attached.
                            log::info!("discarding camera stream: {err}");
                            Vec::new()
                        }
                    }
                }
                Err(err) => shared.core.borrow_mut().camera_failed(ticket, err),
            };
            shared.apply(actions);
        });
    }

    fn render(&self) {
        let core = self.core.borrow();
        let stream = self.stream.borrow();
        let video = stream.as_ref().map(CameraStream::video);
        let drawn = match core.step() {
            Step::SelectPasta => Ok(()),
            Step::Calibrate => {
                let ctx = &self.calibration.ctx;
                match video.filter(|_| core.camera().is_active()) {
                    Some(video) => render::draw_calibration(ctx, Some(video), &core.layout(View::Calibration)),
                    None => render::draw_static_calibration(
                        ctx,
                        core.canvas_size(View::Calibration),
                        core.session.bowl_diameter_in(),
                    ),
                }
            }
            Step::MeasureBundle => render::draw_bundle(
                &self.bundle.ctx,
                video.filter(|_| core.camera().is_active()),
                &core.layout(View::Bundle),
                core.session.raw_amount(),
            ),
            Step::ShowResult => {
                let tuning = core.session.tuning();
                render::draw_result(
                    &self.result.ctx,
                    core.canvas_size(View::Result),
                    core.session.fill_pct().unwrap_or(0.0),
                    StrandTexture { count: tuning.strand_count, seed: tuning.strand_seed },
                )
            }
        };
        if let Err(err) = drawn {
            log::warn!("render failed: {err:?}");
        }
    }

    fn pointer(self: &Rc<Self>, view: View, client: Point, kind: PointerKind) {
        let pt = self.canvas(view).mapping().to_canvas(client);
        let actions = {
            let mut core = self.core.borrow_mut();
            match kind {
                PointerKind::Down => core.on_pointer_down(view, pt),
                PointerKind::Move => core.on_pointer_move(view, pt),
            }
        };
        self.apply(actions);
    }

    fn pointer_up(self: &Rc<Self>, view: View) {
        let actions = self.core.borrow_mut().on_pointer_up(view);
        self.apply(actions);
    }
}

#[derive(Debug, Clone, Copy)]
enum PointerKind {
    Down,
    Move,
}

fn first_touch(event: &TouchEvent) -> Option<Point> {
    event.touches().get(0).map(|t| Point::new(f64::from(t.client_x()), f64::from(t.client_y())))
}

fn js_err(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn view(id: &str) -> Result<View, JsValue> {
    View::from_id(id).ok_or_else(|| JsValue::from_str(&format!("unknown view: {id}")))
}

/// Browser-bound estimator. Owns the canvases, camera stream, and frame loop.
#[wasm_bindgen]
pub struct Estimator {
    shared: Rc<Shared>,
}

#[wasm_bindgen]
impl Estimator {
    /// Bind to the three canvases and the camera `<video>` element.
    ///
    /// `tuning_json` optionally overrides the empirical constants.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a canvas has no 2D context or the tuning JSON is invalid.
    #[wasm_bindgen(constructor)]
    pub fn new(
        calibration: HtmlCanvasElement,
        bundle: HtmlCanvasElement,
        result: HtmlCanvasElement,
        video: HtmlVideoElement,
        tuning_json: Option<String>,
    ) -> Result<Estimator, JsValue> {
        let tuning = match tuning_json {
            Some(raw) => Tuning::from_json(&raw).map_err(js_err)?,
            None => Tuning::default(),
        };
        let shared = Rc::new(Shared {
            core: RefCell::new(EstimatorCore::new(tuning)),
            calibration: Canvas::new(calibration)?,
            bundle: Canvas::new(bundle)?,
            result: Canvas::new(result)?,
            video,
            stream: RefCell::new(None),
            frame_loop: RefCell::new(None),
            listener: RefCell::new(None),
        });
        log::info!("estimator ready");
        Ok(Self { shared })
    }

    /// Register a callback that receives every host-facing action as JSON.
    pub fn set_listener(&self, listener: Option<js_sys::Function>) {
        *self.shared.listener.borrow_mut() = listener;
    }

    /// The pasta catalog as a JSON array of `{id, name, expansion}`.
    #[must_use]
    pub fn catalog_json() -> String {
        let entries: Vec<_> = PastaKind::ALL
            .iter()
            .map(|kind| serde_json::json!({ "id": kind.id(), "name": kind.name(), "expansion": kind.expansion() }))
            .collect();
        serde_json::Value::Array(entries).to_string()
    }

    /// # Errors
    ///
    /// Returns `Err` if the snapshot cannot be serialized.
    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.shared.core.borrow().snapshot()).map_err(js_err)
    }

    /// # Errors
    ///
    /// Returns `Err` for an unknown pasta id.
    pub fn select_pasta(&self, id: &str) -> Result<(), JsValue> {
        self.shared.core.borrow_mut().select_pasta_id(id).map_err(js_err)
    }

    #[must_use]
    pub fn can_advance(&self) -> bool {
        self.shared.core.borrow().can_advance()
    }

    /// # Errors
    ///
    /// Returns `Err` when no pasta kind is selected.
    pub fn advance(&self) -> Result<(), JsValue> {
        let actions = self.shared.core.borrow_mut().advance().map_err(js_err)?;
        self.shared.apply(actions);
        Ok(())
    }

    pub fn reset(&self) {
        let actions = self.shared.core.borrow_mut().reset();
        self.shared.apply(actions);
    }

    /// # Errors
    ///
    /// Returns `Err` when the camera is already starting or live, or the
    /// calibration step is not showing.
    pub fn start_camera(&self) -> Result<(), JsValue> {
        let actions = self.shared.core.borrow_mut().begin_camera().map_err(js_err)?;
        self.shared.apply(actions);
        Ok(())
    }

    pub fn set_bowl_diameter(&self, diameter_in: f64) {
        let actions = self.shared.core.borrow_mut().set_bowl_diameter(diameter_in);
        self.shared.apply(actions);
    }

    pub fn set_bowl_preset(&self, diameter_in: f64) {
        let actions = self.shared.core.borrow_mut().set_bowl_preset(diameter_in);
        self.shared.apply(actions);
    }

    pub fn set_bundle_diameter(&self, diameter_in: f64) {
        let actions = self.shared.core.borrow_mut().set_bundle_diameter(diameter_in);
        self.shared.apply(actions);
    }

    /// # Errors
    ///
    /// Returns `Err` for a unit other than `grams` or `ounces`.
    pub fn set_unit(&self, unit: &str) -> Result<(), JsValue> {
        let unit: MassUnit = unit.parse().map_err(js_err)?;
        let actions = self.shared.core.borrow_mut().set_unit(unit);
        self.shared.apply(actions);
        Ok(())
    }

    pub fn set_left_handed(&self, left_handed: bool) {
        let actions = self.shared.core.borrow_mut().set_left_handed(left_handed);
        self.shared.apply(actions);
    }

    /// Report container sizes after layout or a window resize.
    pub fn set_containers(&self, calibration_width: f64, bundle_width: f64, bundle_height: f64, result_width: f64) {
        let containers = Containers {
            calibration_width,
            bundle: CanvasSize::new(bundle_width, bundle_height),
            result_width,
        };
        let actions = self.shared.core.borrow_mut().set_containers(containers);
        self.shared.apply(actions);
    }

    /// Repaint the current step once.
    pub fn render(&self) {
        self.shared.render();
    }

    // --- Mouse ---

    /// # Errors
    ///
    /// Returns `Err` for an unknown view id.
    pub fn on_mouse_down(&self, view_id: &str, event: &MouseEvent) -> Result<(), JsValue> {
        let client = Point::new(f64::from(event.client_x()), f64::from(event.client_y()));
        self.shared.pointer(view(view_id)?, client, PointerKind::Down);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `Err` for an unknown view id.
    pub fn on_mouse_move(&self, view_id: &str, event: &MouseEvent) -> Result<(), JsValue> {
        let client = Point::new(f64::from(event.client_x()), f64::from(event.client_y()));
        self.shared.pointer(view(view_id)?, client, PointerKind::Move);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `Err` for an unknown view id.
    pub fn on_mouse_up(&self, view_id: &str) -> Result<(), JsValue> {
        self.shared.pointer_up(view(view_id)?);
        Ok(())
    }

    // --- Touch ---

    /// # Errors
    ///
    /// Returns `Err` for an unknown view id.
    pub fn on_touch_start(&self, view_id: &str, event: &TouchEvent) -> Result<(), JsValue> {
        let view = view(view_id)?;
        if let Some(client) = first_touch(event) {
            self.shared.pointer(view, client, PointerKind::Down);
        }
        Ok(())
    }

    /// Moves while dragging suppress page scroll.
    ///
    /// # Errors
    ///
    /// Returns `Err` for an unknown view id.
    pub fn on_touch_move(&self, view_id: &str, event: &TouchEvent) -> Result<(), JsValue> {
        let view = view(view_id)?;
        if self.shared.core.borrow().is_dragging() {
            event.prevent_default();
        }
        if let Some(client) = first_touch(event) {
            self.shared.pointer(view, client, PointerKind::Move);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `Err` for an unknown view id.
    pub fn on_touch_end(&self, view_id: &str) -> Result<(), JsValue> {
        self.shared.pointer_up(view(view_id)?);
        Ok(())
    }
}

impl Drop for Estimator {
    fn drop(&mut self) {
        self.shared.frame_loop.borrow_mut().take();
        self.shared.stream.borrow_mut().take();
    }
}

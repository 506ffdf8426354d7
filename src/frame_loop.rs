//! Cancellable per-frame redraw task.
//!
//! A [`FrameLoop`] calls its draw closure once per scheduled frame and
//! re-arms itself after every frame. It is owned by whichever step started
//! it. Dropping or cancelling the handle stops it; the pending callback holds
//! only a weak reference, so a frame that fires after the handle is gone
//! does nothing.

#[cfg(test)]
#[path = "frame_loop_test.rs"]
mod frame_loop_test;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;

/// Source of "call me on the next frame" callbacks.
pub trait FrameScheduler {
    type Token: Copy;

    /// Queue `callback` for the next frame.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the host refuses the request.
    fn request(&self, callback: Box<dyn FnOnce()>) -> Result<Self::Token, JsValue>;

    /// Drop a queued callback before it fires.
    fn cancel(&self, token: Self::Token);
}

struct LoopState<S: FrameScheduler> {
    scheduler: S,
    draw: RefCell<Box<dyn FnMut()>>,
    pending: Cell<Option<S::Token>>,
    running: Cell<bool>,
    frames: Cell<u64>,
}

pub struct FrameLoop<S: FrameScheduler + 'static> {
    state: Rc<LoopState<S>>,
}

impl<S: FrameScheduler + 'static> FrameLoop<S> {
    /// Schedule the first frame and return the owning handle.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the first frame cannot be scheduled.
    pub fn start(scheduler: S, draw: impl FnMut() + 'static) -> Result<Self, JsValue> {
        let state = Rc::new(LoopState {
            scheduler,
            draw: RefCell::new(Box::new(draw)),
            pending: Cell::new(None),
            running: Cell::new(true),
            frames: Cell::new(0),
        });
        schedule(&state)?;
        log::debug!("frame loop started");
        Ok(Self { state })
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.running.get()
    }

    /// Frames drawn so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.state.frames.get()
    }

    /// Stop the loop and withdraw the queued frame. Idempotent.
    pub fn cancel(&self) {
        if !self.state.running.replace(false) {
            return;
        }
        if let Some(token) = self.state.pending.take() {
            self.state.scheduler.cancel(token);
        }
        log::debug!("frame loop cancelled after {} frames", self.state.frames.get());
    }
}

impl<S: FrameScheduler + 'static> Drop for FrameLoop<S> {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn schedule<S: FrameScheduler + 'static>(state: &Rc<LoopState<S>>) -> Result<(), JsValue> {
    let weak: Weak<LoopState<S>> = Rc::downgrade(state);
    let token = state.scheduler.request(Box::new(move || {
        if let Some(state) = weak.upgrade() {
            tick(&state);
        }
    }))?;
    state.pending.set(Some(token));
    Ok(())
}

fn tick<S: FrameScheduler + 'static>(state: &Rc<LoopState<S>>) {
    state.pending.set(None);
    if !state.running.get() {
        return;
    }
    state.frames.set(state.frames.get() + 1);
    (state.draw.borrow_mut())();

    if state.running.get() {
        if let Err(err) = schedule(state) {
            log::warn!("frame loop stopped: could not schedule next frame: {err:?}");
            state.running.set(false);
        }
    }
}

// =============================================================
// requestAnimationFrame
// =============================================================

/// [`FrameScheduler`] backed by `window.requestAnimationFrame`.
#[derive(Debug, Clone)]
pub struct AnimationFrames {
    window: web_sys::Window,
}

impl AnimationFrames {
    /// # Errors
    ///
    /// Returns `Err` outside a browser window context.
    pub fn new() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        Ok(Self { window })
    }
}

impl FrameScheduler for AnimationFrames {
    type Token = i32;

    fn request(&self, callback: Box<dyn FnOnce()>) -> Result<i32, JsValue> {
        // once_into_js frees the closure after it runs; a cancelled frame
        // leaks only the boxed callback, which holds a weak reference.
        let js = Closure::once_into_js(move || callback());
        self.window.request_animation_frame(js.unchecked_ref())
    }

    fn cancel(&self, token: i32) {
        if let Err(err) = self.window.cancel_animation_frame(token) {
            log::warn!("cancelAnimationFrame failed: {err:?}");
        }
    }
}

//! Pointer gesture state for the overlay handles.
//!
//! A [`Drag`] tracks one handle between pointer-down and pointer-up. It does
//! not own the handle: the caller rebuilds the handle from the session for
//! every event and passes it in, so a drag always sees current geometry.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::handle::CalibratedHandle;
use crate::viewport::Point;

/// Internal state for the drag state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    /// No gesture in progress; waiting for the next press.
    #[default]
    Idle,
    /// A press landed on the handle; moves update its value.
    Dragging,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Drag {
    state: DragState,
}

impl Drag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> DragState {
        self.state
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.state == DragState::Dragging
    }

    /// Start dragging if `pt` hits the handle. Returns whether the press grabbed it.
    pub fn press(&mut self, handle: &impl CalibratedHandle, pt: Point) -> bool {
        if handle.hit_test(pt) {
            self.state = DragState::Dragging;
            true
        } else {
            false
        }
    }

    /// New clamped value for a move to `pt`, or `None` when idle.
    #[must_use]
    pub fn drag(&self, handle: &impl CalibratedHandle, pt: Point) -> Option<f64> {
        match self.state {
            DragState::Idle => None,
            DragState::Dragging => Some(handle.value_at(pt)),
        }
    }

    /// End the gesture wherever the pointer is. Returns whether a drag was active.
    pub fn release(&mut self) -> bool {
        std::mem::take(&mut self.state) == DragState::Dragging
    }
}

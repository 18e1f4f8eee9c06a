//! Frame scheduling.
//!
//! The render loop never blocks. At the end of a frame it asks its
//! [`FrameScheduler`] for the next one and returns to the event loop.

use std::cell::Cell;

use winit::window::Window;

pub trait FrameScheduler {
    fn request_frame(&self);
}

impl FrameScheduler for Window {
    fn request_frame(&self) {
        self.request_redraw();
    }
}

/// Counts requested frames instead of scheduling them. The caller steps the
/// loop by hand.
#[derive(Debug, Default)]
pub struct ManualFrames {
    requested: Cell<usize>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requested(&self) -> usize {
        self.requested.get()
    }

    /// Consume one pending request. Returns `false` when nothing was requested.
    pub fn take(&self) -> bool {
        match self.requested.get() {
            0 => false,
            n => {
                self.requested.set(n - 1);
                true
            }
        }
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&self) {
        self.requested.set(self.requested.get() + 1);
    }
}

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::RenderError;
use crate::renderer::RenderFrame;

/// The host's drawing surface, shared with the map renderer.
///
/// The engine never owns the framebuffer: it borrows the host's context for
/// the duration of a pass and submits one [`RenderFrame`] per pass.
pub trait RenderSurface {
    fn is_lost(&self) -> bool;

    fn submit(&mut self, frame: RenderFrame) -> Result<(), RenderError>;

    /// Frees engine-side resources bound to the context. Called once on teardown.
    fn release(&mut self) {}
}

const DEFAULT_HISTORY: usize = 64;

#[derive(Debug, Default)]
struct HeadlessState {
    frames: VecDeque<RenderFrame>,
    history: usize,
    submitted: u64,
    lost: bool,
    released: bool,
}

/// In-memory surface that records submitted frames.
///
/// Used by tests and the CLI host. A [`SurfaceProbe`] obtained before handing
/// the surface to an engine keeps read access and can simulate context loss.
#[derive(Debug)]
pub struct HeadlessSurface {
    state: Rc<RefCell<HeadlessState>>,
}

#[derive(Debug, Clone)]
pub struct SurfaceProbe {
    state: Rc<RefCell<HeadlessState>>,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::with_history(DEFAULT_HISTORY)
    }

    /// Keeps at most `history` recent frames (at least one).
    pub fn with_history(history: usize) -> Self {
        Self {
            state: Rc::new(RefCell::new(HeadlessState {
                history: history.max(1),
                ..HeadlessState::default()
            })),
        }
    }

    pub fn probe(&self) -> SurfaceProbe {
        SurfaceProbe {
            state: Rc::clone(&self.state),
        }
    }
}

impl RenderSurface for HeadlessSurface {
    fn is_lost(&self) -> bool {
        self.state.borrow().lost
    }

    fn submit(&mut self, frame: RenderFrame) -> Result<(), RenderError> {
        let mut state = self.state.borrow_mut();
        if state.lost {
            return Err(RenderError::ContextLost);
        }
        if state.released {
            return Err(RenderError::Submit("surface already released".to_string()));
        }
        if state.frames.len() == state.history {
            state.frames.pop_front();
        }
        state.frames.push_back(frame);
        state.submitted += 1;
        Ok(())
    }

    fn release(&mut self) {
        self.state.borrow_mut().released = true;
    }
}

impl SurfaceProbe {
    pub fn frames_submitted(&self) -> u64 {
        self.state.borrow().submitted
    }

    pub fn last_frame(&self) -> Option<RenderFrame> {
        self.state.borrow().frames.back().cloned()
    }

    pub fn recent_frames(&self) -> Vec<RenderFrame> {
        self.state.borrow().frames.iter().cloned().collect()
    }

    pub fn lose_context(&self) {
        self.state.borrow_mut().lost = true;
    }

    pub fn restore_context(&self) {
        self.state.borrow_mut().lost = false;
    }

    pub fn is_released(&self) -> bool {
        self.state.borrow().released
    }
}

#[cfg(test)]
mod tests {
    use super::{HeadlessSurface, RenderSurface};
    use crate::error::RenderError;
    use crate::renderer::RenderFrame;

    #[test]
    fn records_frames_up_to_history() {
        let mut surface = HeadlessSurface::with_history(2);
        let probe = surface.probe();
        for _ in 0..3 {
            surface.submit(RenderFrame::default()).expect("submit");
        }
        assert_eq!(probe.frames_submitted(), 3);
        assert_eq!(probe.recent_frames().len(), 2);
    }

    #[test]
    fn lost_context_rejects_frames() {
        let mut surface = HeadlessSurface::new();
        let probe = surface.probe();
        probe.lose_context();
        assert!(surface.is_lost());
        assert_eq!(
            surface.submit(RenderFrame::default()),
            Err(RenderError::ContextLost)
        );
        probe.restore_context();
        assert!(surface.submit(RenderFrame::default()).is_ok());
        assert_eq!(probe.frames_submitted(), 1);
    }

    #[test]
    fn release_is_observable() {
        let mut surface = HeadlessSurface::new();
        let probe = surface.probe();
        surface.release();
        assert!(probe.is_released());
        assert!(surface.submit(RenderFrame::default()).is_err());
    }
}

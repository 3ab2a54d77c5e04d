//! The boundary between a layer and the map that hosts it.

use std::cell::Cell;
use std::rc::Rc;

use futures::task::LocalSpawn;
use glam::DMat4;
use gpu::RenderSurface;

use crate::error::LayerError;
use crate::sync::FrameReport;

/// Services the host map offers a custom layer.
pub trait MapHost {
    /// Asks the host to schedule another frame.
    fn trigger_repaint(&self);
}

/// The host's view-projection for one frame, in its projected space.
///
/// Frame-scoped: layers read it during `render` and keep no copy.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HostCameraMatrix(DMat4);

impl HostCameraMatrix {
    /// Column-major, as web maps hand it to custom layers.
    pub fn from_cols_array(cols: &[f64; 16]) -> Self {
        Self(DMat4::from_cols_array(cols))
    }

    pub fn from_mat4(matrix: DMat4) -> Self {
        Self(matrix)
    }

    pub fn identity() -> Self {
        Self(DMat4::IDENTITY)
    }

    pub fn as_mat4(&self) -> DMat4 {
        self.0
    }
}

/// Everything a layer receives when it is added to a map.
pub struct AttachContext {
    pub surface: Box<dyn RenderSurface>,
    pub host: Rc<dyn MapHost>,
    /// Single-threaded executor of the host; asset loads run here.
    pub spawner: Rc<dyn LocalSpawn>,
}

/// Plugin contract for layers drawing into the map's framebuffer.
pub trait CustomLayer {
    fn id(&self) -> &str;

    fn rendering_mode(&self) -> &'static str {
        "3d"
    }

    fn on_add(&mut self, context: AttachContext) -> Result<(), LayerError>;

    fn render(&mut self, matrix: &HostCameraMatrix) -> Result<FrameReport, LayerError>;

    fn on_remove(&mut self) -> Result<(), LayerError>;
}

/// Host stand-in that only counts repaint requests.
#[derive(Debug, Default)]
pub struct RepaintCounter {
    requests: Cell<u64>,
}

impl RepaintCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> u64 {
        self.requests.get()
    }
}

impl MapHost for RepaintCounter {
    fn trigger_repaint(&self) {
        self.requests.set(self.requests.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::{HostCameraMatrix, MapHost, RepaintCounter};
    use glam::DVec4;

    #[test]
    fn host_matrix_is_column_major() {
        let mut cols = [0.0; 16];
        cols[0] = 1.0;
        cols[5] = 1.0;
        cols[10] = 1.0;
        cols[15] = 1.0;
        cols[12] = 7.0;
        let m = HostCameraMatrix::from_cols_array(&cols).as_mat4();
        assert_eq!(m.w_axis, DVec4::new(7.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn counter_records_repaints() {
        let host = RepaintCounter::new();
        host.trigger_repaint();
        host.trigger_repaint();
        assert_eq!(host.requests(), 2);
    }
}

use glam::DMat4;

/// Camera placeholder.
///
/// The camera never derives a projection from its own pose. Whoever drives it
/// must install one with [`Camera::freeze_projection`] before each render.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Camera {
    frozen_projection: Option<DMat4>,
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn freeze_projection(&mut self, projection: DMat4) {
        self.frozen_projection = Some(projection);
    }

    pub fn unfreeze_projection(&mut self) {
        self.frozen_projection = None;
    }

    pub fn frozen_projection(&self) -> Option<DMat4> {
        self.frozen_projection
    }
}

use glam::DVec3;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum LightKind {
    /// Sky/ground ambient light; `direction` points towards the sky.
    Hemispheric { direction: DVec3 },
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub intensity: f64,
}

impl Light {
    pub fn hemispheric(direction: DVec3, intensity: f64) -> Self {
        Self {
            kind: LightKind::Hemispheric { direction },
            intensity,
        }
    }
}

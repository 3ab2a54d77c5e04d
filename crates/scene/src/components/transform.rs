use glam::{DMat4, DQuat, DVec3};

/// Local TRS transform of a scene node, relative to its parent.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub translation: DVec3,
    pub rotation: DQuat,
    pub scale: DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            translation: DVec3::ZERO,
            rotation: DQuat::IDENTITY,
            scale: DVec3::ONE,
        }
    }

    pub fn translate(translation: DVec3) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    pub fn with_rotation(mut self, rotation: DQuat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: DVec3) -> Self {
        self.scale = scale;
        self
    }

    /// `translation * rotation * scale`, column-vector convention.
    pub fn to_matrix(&self) -> DMat4 {
        DMat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[cfg(test)]
mod tests {
    use super::Transform;
    use glam::{DMat4, DQuat, DVec3};

    #[test]
    fn identity_is_identity_matrix() {
        assert_eq!(Transform::identity().to_matrix(), DMat4::IDENTITY);
    }

    #[test]
    fn scale_applies_before_rotation_and_translation() {
        let t = Transform::translate(DVec3::new(10.0, 0.0, 0.0))
            .with_rotation(DQuat::from_rotation_y(std::f64::consts::FRAC_PI_2))
            .with_scale(DVec3::splat(2.0));
        let p = t.to_matrix().transform_point3(DVec3::new(1.0, 0.0, 0.0));
        assert!((p - DVec3::new(10.0, 0.0, -2.0)).length() < 1e-12, "{p:?}");
    }
}

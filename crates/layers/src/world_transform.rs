use std::f64::consts::FRAC_PI_2;

use glam::{DMat4, DQuat, DVec3};

use crate::anchor::ProjectedPoint;

/// Rotation about the east-west axis taking the engine's +y up / +z north
/// frame into Mercator's +z up / -y north frame.
pub const UP_AXIS_CORRECTION_RAD: f64 = FRAC_PI_2;

/// Static matrix placing the engine's local meters inside the map's projected
/// space at the anchor.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WorldTransform {
    matrix: DMat4,
}

impl WorldTransform {
    /// `translation * rotation * scale`: meters are scaled to projected units,
    /// re-oriented, then moved to the anchor.
    pub fn build(anchor: &ProjectedPoint) -> Self {
        let matrix = DMat4::from_scale_rotation_translation(
            DVec3::splat(anchor.unit_scale),
            DQuat::from_rotation_x(UP_AXIS_CORRECTION_RAD),
            anchor.translation(),
        );
        Self { matrix }
    }

    pub fn matrix(&self) -> DMat4 {
        self.matrix
    }

    pub fn to_cols_array(&self) -> [f64; 16] {
        self.matrix.to_cols_array()
    }

    /// Maps a point in the engine's local frame (meters) to projected space.
    pub fn local_to_projected(&self, local_m: DVec3) -> DVec3 {
        self.matrix.transform_point3(local_m)
    }
}

#[cfg(test)]
mod tests {
    use super::WorldTransform;
    use crate::anchor::resolve_anchor;
    use foundation::GeoPoint;
    use glam::DVec3;

    fn assert_close(a: DVec3, b: DVec3, eps: f64) {
        assert!((a - b).abs().max_element() <= eps, "{a:?} != {b:?} (eps {eps})");
    }

    #[test]
    fn origin_lands_on_the_anchor() {
        let anchor = resolve_anchor(GeoPoint::lng_lat(148.9819, -35.3981)).expect("valid");
        let world = WorldTransform::build(&anchor);
        assert_eq!(world.local_to_projected(DVec3::ZERO), anchor.translation());
    }

    #[test]
    fn local_axes_map_to_mercator_axes() {
        let anchor = resolve_anchor(GeoPoint::lng_lat(0.0, 0.0)).expect("valid");
        let world = WorldTransform::build(&anchor);
        let s = anchor.unit_scale;
        let origin = anchor.translation();

        // east stays +x, up becomes +z, north becomes -y
        assert_close(
            world.local_to_projected(DVec3::X) - origin,
            DVec3::new(s, 0.0, 0.0),
            1e-15,
        );
        assert_close(
            world.local_to_projected(DVec3::Y) - origin,
            DVec3::new(0.0, 0.0, s),
            1e-15,
        );
        assert_close(
            world.local_to_projected(DVec3::Z) - origin,
            DVec3::new(0.0, -s, 0.0),
            1e-15,
        );
    }

    #[test]
    fn building_twice_is_identical() {
        let anchor = resolve_anchor(GeoPoint::new(10.0, 20.0, 30.0)).expect("valid");
        assert_eq!(
            WorldTransform::build(&anchor).to_cols_array(),
            WorldTransform::build(&anchor).to_cols_array()
        );
    }
}

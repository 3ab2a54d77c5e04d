//! A headless stand-in for the web map's camera.
//!
//! Produces the same column-major view-projection a web map hands to custom
//! layers: Mercator `[0, 1]` units in, clip space out.

use std::f64::consts::PI;

use foundation::{GeoPoint, InvalidAnchorError, MercatorCoordinate};
use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};

pub const TILE_SIZE: f64 = 512.0;
/// Vertical field of view, `2 * atan(0.5 / 1.5)`.
pub const FIELD_OF_VIEW_RAD: f64 = 0.643_501_108_793_284_4;
pub const MAX_PITCH_DEG: f64 = 60.0;

/// Where the map looks.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center: GeoPoint,
    pub zoom: f64,
    pub pitch_deg: f64,
    pub bearing_deg: f64,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: GeoPoint::lng_lat(148.9819, -35.3981),
            zoom: 18.0,
            pitch_deg: 60.0,
            bearing_deg: 0.0,
        }
    }
}

impl MapView {
    pub fn centered_on(center: GeoPoint) -> Self {
        Self {
            center,
            ..Self::default()
        }
    }

    pub fn world_size(&self) -> f64 {
        TILE_SIZE * 2f64.powf(self.zoom)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MapCamera {
    pub view: MapView,
    pub width: f64,
    pub height: f64,
}

impl MapCamera {
    pub fn new(view: MapView, width: f64, height: f64) -> Self {
        Self {
            view,
            width,
            height,
        }
    }

    fn camera_to_center_distance(&self) -> f64 {
        0.5 / (FIELD_OF_VIEW_RAD / 2.0).tan() * self.height
    }

    /// View-projection in Mercator units, as passed to a layer's `render`.
    pub fn view_projection(&self) -> Result<DMat4, InvalidAnchorError> {
        let center = MercatorCoordinate::from_geo(self.view.center)?;
        let world_size = self.view.world_size();
        let pitch = self.view.pitch_deg.clamp(0.0, MAX_PITCH_DEG).to_radians();
        let angle = -self.view.bearing_deg.to_radians();
        let distance = self.camera_to_center_distance();

        let half_fov = FIELD_OF_VIEW_RAD / 2.0;
        let ground_angle = PI / 2.0 + pitch;
        let top_half_surface =
            half_fov.sin() * distance / (PI - ground_angle - half_fov).sin();
        let furthest = (PI / 2.0 - pitch).cos() * top_half_surface + distance;
        let far = furthest * 1.01;
        let near = self.height / 50.0;

        let projection =
            DMat4::perspective_rh_gl(FIELD_OF_VIEW_RAD, self.width / self.height, near, far);
        Ok(projection
            * DMat4::from_scale(DVec3::new(1.0, -1.0, 1.0))
            * DMat4::from_translation(DVec3::new(0.0, 0.0, -distance))
            * DMat4::from_rotation_x(pitch)
            * DMat4::from_rotation_z(angle)
            * DMat4::from_translation(DVec3::new(
                -center.x * world_size,
                -center.y * world_size,
                0.0,
            ))
            * DMat4::from_scale(DVec3::splat(world_size)))
    }

    /// The matrix as the column-major array a web map passes to layers.
    pub fn host_matrix(&self) -> Result<[f64; 16], InvalidAnchorError> {
        Ok(self.view_projection()?.to_cols_array())
    }
}

/// Normalized device coordinates of a Mercator point, `None` behind the camera.
pub fn project_to_ndc(view_projection: DMat4, mercator: DVec3) -> Option<DVec3> {
    let clip = view_projection * mercator.extend(1.0);
    (clip.w > 0.0).then(|| clip.truncate() / clip.w)
}

#[cfg(test)]
mod tests {
    use super::{MapCamera, MapView, project_to_ndc};
    use foundation::{GeoPoint, MercatorCoordinate};
    use glam::DVec3;

    fn ndc_of(camera: &MapCamera, point: GeoPoint) -> DVec3 {
        let m = camera.view_projection().expect("valid view");
        let p = MercatorCoordinate::from_geo(point).expect("valid point").as_dvec3();
        project_to_ndc(m, p).expect("in front of camera")
    }

    #[test]
    fn center_projects_to_screen_center() {
        for pitch in [0.0, 30.0, 60.0] {
            let view = MapView {
                pitch_deg: pitch,
                bearing_deg: 20.0,
                ..MapView::default()
            };
            let camera = MapCamera::new(view, 1024.0, 768.0);
            let ndc = ndc_of(&camera, view.center);
            assert!(ndc.x.abs() < 1e-9 && ndc.y.abs() < 1e-9, "pitch {pitch}: {ndc:?}");
            assert!(ndc.z > -1.0 && ndc.z < 1.0);
        }
    }

    #[test]
    fn east_is_right_and_north_is_up_without_bearing() {
        let view = MapView {
            pitch_deg: 0.0,
            ..MapView::default()
        };
        let camera = MapCamera::new(view, 800.0, 600.0);
        let east = ndc_of(
            &camera,
            GeoPoint::lng_lat(view.center.longitude + 0.0001, view.center.latitude),
        );
        let north = ndc_of(
            &camera,
            GeoPoint::lng_lat(view.center.longitude, view.center.latitude + 0.0001),
        );
        assert!(east.x > 0.0 && east.y.abs() < 1e-9, "{east:?}");
        assert!(north.y > 0.0 && north.x.abs() < 1e-9, "{north:?}");
    }

    #[test]
    fn one_zoom_level_doubles_screen_distance() {
        let base = MapView {
            pitch_deg: 0.0,
            ..MapView::default()
        };
        let offset = GeoPoint::lng_lat(base.center.longitude + 0.0001, base.center.latitude);
        let near = ndc_of(&MapCamera::new(base, 800.0, 600.0), offset);
        let zoomed = ndc_of(
            &MapCamera::new(
                MapView {
                    zoom: base.zoom + 1.0,
                    ..base
                },
                800.0,
                600.0,
            ),
            offset,
        );
        assert!((zoomed.x / near.x - 2.0).abs() < 1e-9);
    }
}

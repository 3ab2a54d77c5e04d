//! Spherical Web Mercator in normalized units.
//!
//! The whole world spans `[0, 1]` on both axes: `x` grows east from the
//! antimeridian, `y` grows south from the northern Mercator limit, and `z` is
//! altitude expressed in the same units at the point's latitude. This is the
//! space a web map hands to custom layers each frame.

use std::f64::consts::PI;

use glam::DVec3;

use super::{
    EARTH_CIRCUMFERENCE_M, GeoPoint, InvalidAnchorError, circumference_at_latitude,
    mercator_scale,
};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MercatorCoordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

pub fn mercator_x_from_lng(lng_deg: f64) -> f64 {
    (180.0 + lng_deg) / 360.0
}

pub fn mercator_y_from_lat(lat_deg: f64) -> f64 {
    (180.0 - (180.0 / PI) * (PI / 4.0 + lat_deg * PI / 360.0).tan().ln()) / 360.0
}

pub fn mercator_z_from_altitude(altitude_m: f64, lat_deg: f64) -> f64 {
    altitude_m / circumference_at_latitude(lat_deg)
}

pub fn lng_from_mercator_x(x: f64) -> f64 {
    x * 360.0 - 180.0
}

pub fn lat_from_mercator_y(y: f64) -> f64 {
    let y2 = 180.0 - y * 360.0;
    360.0 / PI * (y2 * PI / 180.0).exp().atan() - 90.0
}

impl MercatorCoordinate {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Projects a validated geographic point.
    pub fn from_geo(point: GeoPoint) -> Result<Self, InvalidAnchorError> {
        point.validate()?;
        Ok(Self::new(
            mercator_x_from_lng(point.longitude),
            mercator_y_from_lat(point.latitude),
            mercator_z_from_altitude(point.altitude, point.latitude),
        ))
    }

    pub fn to_geo(self) -> GeoPoint {
        let latitude = lat_from_mercator_y(self.y);
        GeoPoint::new(
            lng_from_mercator_x(self.x),
            latitude,
            self.z * circumference_at_latitude(latitude),
        )
    }

    /// Size of one meter in Mercator units at this coordinate's latitude.
    pub fn meter_in_mercator_units(&self) -> f64 {
        (1.0 / EARTH_CIRCUMFERENCE_M) * mercator_scale(lat_from_mercator_y(self.y))
    }

    pub fn as_dvec3(self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }
}

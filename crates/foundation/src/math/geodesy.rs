/// Mean Earth radius (meters) used by the web map's spherical Mercator.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Equatorial circumference of the Mercator sphere (meters).
pub const EARTH_CIRCUMFERENCE_M: f64 = 2.0 * std::f64::consts::PI * EARTH_RADIUS_M;

/// Latitude (degrees) at which Web Mercator becomes square; the projection is
/// undefined beyond it.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_129;

/// Length of the parallel at `lat_deg` (meters).
pub fn circumference_at_latitude(lat_deg: f64) -> f64 {
    EARTH_CIRCUMFERENCE_M * lat_deg.to_radians().cos()
}

/// Linear scale factor of the Mercator projection at `lat_deg`.
///
/// Distances at this latitude appear `1 / cos(lat)` times longer than at the
/// equator.
pub fn mercator_scale(lat_deg: f64) -> f64 {
    1.0 / lat_deg.to_radians().cos()
}

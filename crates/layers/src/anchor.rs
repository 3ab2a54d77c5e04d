use foundation::{GeoPoint, InvalidAnchorError, MercatorCoordinate};
use glam::DVec3;

/// The anchor in the map's projected space, with the local meter size there.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Projected units per meter at the anchor.
    pub unit_scale: f64,
}

impl ProjectedPoint {
    pub fn translation(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }

    pub fn mercator(&self) -> MercatorCoordinate {
        MercatorCoordinate::new(self.x, self.y, self.z)
    }
}

/// Projects `anchor` with the host map's Mercator projection.
///
/// Pure: the same input always yields bit-identical output.
pub fn resolve_anchor(anchor: GeoPoint) -> Result<ProjectedPoint, InvalidAnchorError> {
    let mercator = MercatorCoordinate::from_geo(anchor)?;
    Ok(ProjectedPoint {
        x: mercator.x,
        y: mercator.y,
        z: mercator.z,
        unit_scale: mercator.meter_in_mercator_units(),
    })
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::MAX_MERCATOR_LATITUDE;

/// A geographic position: degrees of longitude/latitude plus meters of altitude.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default)]
    pub altitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InvalidAnchorError {
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
    #[error("latitude {0} is outside the Mercator range [-{max}, {max}]", max = MAX_MERCATOR_LATITUDE)]
    Latitude(f64),
    #[error("altitude {0} is not a finite number of meters")]
    Altitude(f64),
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64, altitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            altitude,
        }
    }

    /// Ground-level point.
    pub fn lng_lat(longitude: f64, latitude: f64) -> Self {
        Self::new(longitude, latitude, 0.0)
    }

    /// Checks the point can be projected.
    ///
    /// NaN fails every range check, so it is rejected along with infinities.
    pub fn validate(&self) -> Result<(), InvalidAnchorError> {
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(InvalidAnchorError::Longitude(self.longitude));
        }
        if !(-MAX_MERCATOR_LATITUDE..=MAX_MERCATOR_LATITUDE).contains(&self.latitude) {
            return Err(InvalidAnchorError::Latitude(self.latitude));
        }
        if !self.altitude.is_finite() {
            return Err(InvalidAnchorError::Altitude(self.altitude));
        }
        Ok(())
    }
}

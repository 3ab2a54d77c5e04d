//! Free-text place search against a Nominatim endpoint.

use foundation::GeoPoint;
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("invalid geocoder URL: {0}")]
    Url(String),
    #[error("geocoder request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("geocoder returned HTTP {0}")]
    Status(u16),
    #[error("unexpected geocoder response: {0}")]
    Response(#[from] serde_json::Error),
    #[error("geocoder returned non-numeric coordinates ({lat}, {lon})")]
    Coordinates { lat: String, lon: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeHit {
    pub display_name: String,
    pub point: GeoPoint,
}

// Nominatim serializes coordinates as strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

/// Parses a Nominatim JSON response and returns the best match, if any.
pub fn parse_response(body: &str) -> Result<Option<GeocodeHit>, GeocodeError> {
    let places: Vec<NominatimPlace> = serde_json::from_str(body)?;
    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };
    match (place.lon.parse::<f64>(), place.lat.parse::<f64>()) {
        (Ok(lon), Ok(lat)) => Ok(Some(GeocodeHit {
            display_name: place.display_name,
            point: GeoPoint::lng_lat(lon, lat),
        })),
        _ => Err(GeocodeError::Coordinates {
            lat: place.lat,
            lon: place.lon,
        }),
    }
}

pub async fn geocode(
    client: &Client,
    endpoint: &str,
    query: &str,
) -> Result<Option<GeocodeHit>, GeocodeError> {
    let url = Url::parse_with_params(endpoint, &[("format", "json"), ("limit", "1"), ("q", query)])
        .map_err(|e| GeocodeError::Url(e.to_string()))?;
    tracing::debug!(%url, "geocoding");
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, concat!("geoanchor/", env!("CARGO_PKG_VERSION")))
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(GeocodeError::Status(response.status().as_u16()));
    }
    parse_response(&response.text().await?)
}

#[cfg(test)]
mod tests {
    use super::{GeocodeError, parse_response};
    use foundation::GeoPoint;
    use pretty_assertions::assert_eq;

    #[test]
    fn takes_the_first_place() {
        let body = r#"[
            {"lat": "-35.3081", "lon": "149.1245", "display_name": "Canberra, ACT, Australia"},
            {"lat": "0", "lon": "0", "display_name": "elsewhere"}
        ]"#;
        let hit = parse_response(body).expect("parse").expect("hit");
        assert_eq!(hit.point, GeoPoint::lng_lat(149.1245, -35.3081));
        assert_eq!(hit.display_name, "Canberra, ACT, Australia");
    }

    #[test]
    fn empty_result_is_none() {
        assert_eq!(parse_response("[]").expect("parse"), None);
    }

    #[test]
    fn rejects_garbage_coordinates() {
        assert!(matches!(
            parse_response(r#"[{"lat": "north", "lon": "1"}]"#),
            Err(GeocodeError::Coordinates { .. })
        ));
        assert!(matches!(parse_response("{}"), Err(GeocodeError::Response(_))));
    }
}

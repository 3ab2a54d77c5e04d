use std::fs;
use std::path::Path;

use foundation::GeoPoint;
use glam::{DQuat, DVec3};
use scene::components::Transform;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::style::MapStyle;

pub const MANIFEST_VERSION: &str = "1.0";

/// Declarative description of one anchored 3D layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayerManifest {
    pub version: String,
    pub layer_id: String,
    pub anchor: GeoPoint,
    #[serde(default)]
    pub assets: Vec<AssetRequest>,
    #[serde(default)]
    pub light: LightConfig,
    /// Length of the debug axes drawn at the anchor, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_axes_m: Option<f64>,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub style: MapStyle,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetRequest {
    pub url: String,
    /// One top-level instance per placement; the first is the loaded model,
    /// the rest are clones of it.
    #[serde(default = "default_placements")]
    pub placements: Vec<Placement>,
}

/// Where an instance sits relative to the anchor, in the engine's local frame
/// (+x east, +y up, +z north; meters).
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct Placement {
    #[serde(default)]
    pub offset_m: [f64; 3],
    /// Heading in degrees, clockwise seen from above.
    #[serde(default)]
    pub rotation_deg: f64,
    #[serde(default = "unit_scale")]
    pub scale: f64,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct LightConfig {
    pub direction: [f64; 3],
    pub intensity: f64,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default = "enabled")]
    pub high_precision_matrices: bool,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("manifest parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported manifest version: {found}")]
    UnsupportedVersion { found: String },
}

fn default_placements() -> Vec<Placement> {
    vec![Placement::default()]
}

fn unit_scale() -> f64 {
    1.0
}

fn enabled() -> bool {
    true
}

impl Default for Placement {
    fn default() -> Self {
        Self::at([0.0, 0.0, 0.0])
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            direction: [0.0, 0.0, 100.0],
            intensity: 0.7,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            high_precision_matrices: true,
        }
    }
}

impl Placement {
    pub fn at(offset_m: [f64; 3]) -> Self {
        Self {
            offset_m,
            rotation_deg: 0.0,
            scale: 1.0,
        }
    }

    pub fn to_transform(&self) -> Transform {
        // Rotating +x (east) towards -z (south) is clockwise from above.
        Transform::translate(DVec3::from_array(self.offset_m))
            .with_rotation(DQuat::from_rotation_y(self.rotation_deg.to_radians()))
            .with_scale(DVec3::splat(self.scale))
    }
}

impl AssetRequest {
    pub fn new(url: impl Into<String>, placements: Vec<Placement>) -> Self {
        Self {
            url: url.into(),
            placements,
        }
    }
}

impl LayerManifest {
    pub fn new(layer_id: impl Into<String>, anchor: GeoPoint) -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            layer_id: layer_id.into(),
            anchor,
            assets: Vec::new(),
            light: LightConfig::default(),
            debug_axes_m: None,
            engine: EngineConfig::default(),
            style: MapStyle::default(),
        }
    }

    pub fn from_json_str(payload: &str) -> Result<Self, ManifestError> {
        let manifest: LayerManifest = serde_json::from_str(payload)?;
        if manifest.version != MANIFEST_VERSION {
            return Err(ManifestError::UnsupportedVersion {
                found: manifest.version,
            });
        }
        Ok(manifest)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let payload = fs::read_to_string(path)?;
        Self::from_json_str(&payload)
    }

    pub fn to_json_pretty(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::{LayerManifest, MANIFEST_VERSION, ManifestError, Placement};
    use foundation::GeoPoint;
    use glam::DVec3;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::PathBuf;

    fn temp_dir(label: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("geoanchor_manifest_{label}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn fills_defaults_for_sparse_manifests() {
        let manifest = LayerManifest::from_json_str(
            r#"{
                "version": "1.0",
                "layer_id": "3d-model",
                "anchor": { "longitude": 148.9819, "latitude": -35.3981 },
                "assets": [
                    { "url": "model.gltf" },
                    { "url": "tree.glb", "placements": [ { "offset_m": [25, 0, 25] } ] }
                ]
            }"#,
        )
        .expect("parse manifest");

        assert_eq!(manifest.anchor, GeoPoint::new(148.9819, -35.3981, 0.0));
        assert_eq!(manifest.assets[0].placements, vec![Placement::default()]);
        assert_eq!(manifest.assets[1].placements[0].scale, 1.0);
        assert_eq!(manifest.light.intensity, 0.7);
        assert!(manifest.engine.high_precision_matrices);
        assert_eq!(manifest.debug_axes_m, None);
    }

    #[test]
    fn saves_and_loads_from_disk() {
        let dir = temp_dir("load");
        let mut manifest = LayerManifest::new("layer", GeoPoint::lng_lat(1.0, 2.0));
        manifest.debug_axes_m = Some(10.0);
        let path = dir.join("layer.json");
        fs::write(&path, manifest.to_json_pretty().expect("json")).expect("write");

        assert_eq!(LayerManifest::load(&path).expect("load"), manifest);
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut manifest = LayerManifest::new("layer", GeoPoint::lng_lat(0.0, 0.0));
        manifest.version = "2.0".to_string();
        let payload = manifest.to_json_pretty().expect("json");
        match LayerManifest::from_json_str(&payload) {
            Err(ManifestError::UnsupportedVersion { found }) => {
                assert_eq!(found, "2.0");
                assert_ne!(found, MANIFEST_VERSION);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn placement_heading_is_clockwise_from_above() {
        let placement = Placement {
            offset_m: [25.0, 0.0, 25.0],
            rotation_deg: 90.0,
            scale: 2.0,
        };
        let m = placement.to_transform().to_matrix();
        let east_tip = m.transform_point3(DVec3::new(1.0, 0.0, 0.0));
        // East turns to south (-z) and is scaled by two.
        assert!((east_tip - DVec3::new(25.0, 0.0, 23.0)).length() < 1e-9, "{east_tip:?}");
    }
}

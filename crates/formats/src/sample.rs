//! Built-in fixtures: a one-triangle glTF and the demo layer manifest.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use foundation::GeoPoint;

use crate::manifest::{AssetRequest, LayerManifest, Placement};
use crate::style::MapStyle;

pub const SAMPLE_MODEL_URL: &str =
    "https://maplibre.org/maplibre-gl-js/docs/assets/34M_17/34M_17.gltf";

/// Positions (3 x vec3 f32) followed by u16 indices padded to 4 bytes.
pub fn triangle_buffer() -> Vec<u8> {
    let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let mut bytes = Vec::with_capacity(44);
    for value in positions.iter().flatten() {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    for index in [0u16, 1, 2] {
        bytes.extend_from_slice(&index.to_le_bytes());
    }
    bytes.extend_from_slice(&[0, 0]);
    bytes
}

fn triangle_document(buffer_uri: &str) -> String {
    let len = triangle_buffer().len();
    serde_json::json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "name": "triangle", "mesh": 0 }],
        "meshes": [{
            "name": "triangle",
            "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1 }]
        }],
        "buffers": [{ "uri": buffer_uri, "byteLength": len }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 }
        ],
        "accessors": [
            {
                "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
            },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ]
    })
    .to_string()
}

/// Self-contained glTF with the buffer embedded as a data URI.
pub fn triangle_gltf() -> String {
    let uri = format!(
        "data:application/octet-stream;base64,{}",
        STANDARD.encode(triangle_buffer())
    );
    triangle_document(&uri)
}

/// glTF document referencing `buffer_uri`, plus the buffer bytes to serve there.
pub fn triangle_gltf_external(buffer_uri: &str) -> (String, Vec<u8>) {
    (triangle_document(buffer_uri), triangle_buffer())
}

impl LayerManifest {
    /// Demo layer: the 34M_17 model twice near Canberra, with debug axes.
    pub fn sample() -> Self {
        let mut manifest = LayerManifest::new(
            "3d-model",
            GeoPoint::new(148.9819, -35.3981, 0.0),
        );
        manifest.assets.push(AssetRequest {
            url: SAMPLE_MODEL_URL.to_string(),
            placements: vec![
                Placement::at([0.0, 0.0, 0.0]),
                Placement::at([25.0, 0.0, 25.0]),
            ],
        });
        manifest.debug_axes_m = Some(10.0);
        manifest.style = MapStyle::Satellite;
        manifest
    }
}

use std::rc::Rc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use glam::{DQuat, DVec3};
use gltf::buffer::Source;
use gltf::mesh::Mode;
use scene::components::{MeshData, Transform};
use thiserror::Error;

use crate::error::AssetLoadError;
use crate::model::{AssetNode, ModelAsset};
use crate::source::{AssetSource, resolve_relative};

#[derive(Debug, Error)]
pub enum GltfDecodeError {
    #[error(transparent)]
    Parse(#[from] gltf::Error),
    #[error("buffer {0} refers to the binary chunk but the file has none")]
    MissingBlob(usize),
    #[error("buffer {index} holds {actual} bytes, {expected} declared")]
    BufferTooShort {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("malformed data URI: {0}")]
    DataUri(String),
    #[error("primitive in mesh {0} has no POSITION attribute")]
    MissingPositions(usize),
}

fn decode_data_uri(uri: &str) -> Option<Result<Vec<u8>, GltfDecodeError>> {
    let rest = uri.strip_prefix("data:")?;
    let Some((header, payload)) = rest.split_once(',') else {
        return Some(Err(GltfDecodeError::DataUri("missing ','".into())));
    };
    if !header.ends_with(";base64") {
        return Some(Err(GltfDecodeError::DataUri(format!(
            "unsupported encoding {header}"
        ))));
    }
    Some(
        STANDARD
            .decode(payload)
            .map_err(|err| GltfDecodeError::DataUri(err.to_string())),
    )
}

/// Fetches a `.gltf` or `.glb` document plus every buffer it references and
/// decodes it into a [`ModelAsset`].
pub async fn load_model(
    source: Rc<dyn AssetSource>,
    url: String,
) -> Result<ModelAsset, AssetLoadError> {
    let bytes = source
        .fetch(&url)
        .await
        .map_err(|err| AssetLoadError::new(&url, err))?;
    let gltf::Gltf { document, mut blob } = gltf::Gltf::from_slice(&bytes)
        .map_err(|err| AssetLoadError::new(&url, GltfDecodeError::from(err)))?;

    let mut buffers = Vec::with_capacity(document.buffers().len());
    for buffer in document.buffers() {
        let data = match buffer.source() {
            Source::Bin => blob
                .take()
                .ok_or(GltfDecodeError::MissingBlob(buffer.index()))
                .map_err(|err| AssetLoadError::new(&url, err))?,
            Source::Uri(uri) => match decode_data_uri(uri) {
                Some(decoded) => decoded.map_err(|err| AssetLoadError::new(&url, err))?,
                None => {
                    let target = resolve_relative(&url, uri);
                    tracing::debug!(%url, buffer = %target, "fetching external buffer");
                    source
                        .fetch(&target)
                        .await
                        .map_err(|err| AssetLoadError::new(&target, err))?
                }
            },
        };
        if data.len() < buffer.length() {
            return Err(AssetLoadError::new(
                &url,
                GltfDecodeError::BufferTooShort {
                    index: buffer.index(),
                    expected: buffer.length(),
                    actual: data.len(),
                },
            ));
        }
        buffers.push(data);
    }

    decode_document(&document, &buffers).map_err(|err| AssetLoadError::new(&url, err))
}

fn decode_document(
    document: &gltf::Document,
    buffers: &[Vec<u8>],
) -> Result<ModelAsset, GltfDecodeError> {
    let mut meshes = Vec::new();
    let mut primitives_by_mesh = Vec::with_capacity(document.meshes().len());
    for mesh in document.meshes() {
        let mut ids = Vec::new();
        for primitive in mesh.primitives() {
            if primitive.mode() != Mode::Triangles {
                tracing::debug!(mesh = mesh.index(), mode = ?primitive.mode(), "skipping non-triangle primitive");
                continue;
            }
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .ok_or(GltfDecodeError::MissingPositions(mesh.index()))?
                .collect();
            let normals = reader
                .read_normals()
                .map(|normals| normals.collect())
                .unwrap_or_default();
            let indices = reader
                .read_indices()
                .map(|indices| indices.into_u32().collect())
                .unwrap_or_default();
            ids.push(meshes.len());
            meshes.push(MeshData {
                name: mesh.name().map(str::to_string),
                positions,
                normals,
                indices,
            });
        }
        primitives_by_mesh.push(ids);
    }

    let nodes = document
        .nodes()
        .map(|node| {
            let (translation, rotation, scale) = node.transform().decomposed();
            AssetNode {
                name: node.name().map(str::to_string),
                transform: Transform {
                    translation: DVec3::from(translation.map(f64::from)),
                    rotation: DQuat::from_array(rotation.map(f64::from)),
                    scale: DVec3::from(scale.map(f64::from)),
                },
                meshes: node
                    .mesh()
                    .and_then(|mesh| primitives_by_mesh.get(mesh.index()).cloned())
                    .unwrap_or_default(),
                children: node.children().map(|child| child.index()).collect(),
            }
        })
        .collect();

    let roots = match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => scene.nodes().map(|node| node.index()).collect(),
        None => Vec::new(),
    };

    Ok(ModelAsset {
        meshes,
        nodes,
        roots,
    })
}

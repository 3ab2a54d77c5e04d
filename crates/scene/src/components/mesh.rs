/// Index of a mesh in the world's mesh store. Clones share the same id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u32);

/// CPU-side triangle mesh in the node's local frame (meters).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub name: Option<String>,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        if self.indices.is_empty() {
            self.positions.len() / 3
        } else {
            self.indices.len() / 3
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

use glam::DVec3;
use scene::World;
use scene::components::{Drawable3D, MeshData, MeshId, Transform};
use scene::entity::EntityId;

/// Name of the node inserted between a model root and its glTF nodes.
pub const HANDEDNESS_NODE: &str = "__gltf_handedness";

/// Decoded model, independent of any scene. Indices refer into `meshes` and
/// `nodes`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelAsset {
    pub meshes: Vec<MeshData>,
    pub nodes: Vec<AssetNode>,
    pub roots: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssetNode {
    pub name: Option<String>,
    pub transform: Transform,
    pub meshes: Vec<usize>,
    pub children: Vec<usize>,
}

impl ModelAsset {
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(MeshData::triangle_count).sum()
    }

    /// Adds the model to `world` under a new root entity and returns the root.
    ///
    /// glTF is right-handed while the engine frame is left-handed, so the
    /// nodes hang off a child that mirrors X. Nodes reachable more than once
    /// are spawned only on their first visit.
    pub fn instantiate(&self, world: &mut World, name: &str) -> EntityId {
        let mesh_ids: Vec<MeshId> = self
            .meshes
            .iter()
            .map(|mesh| world.add_mesh(mesh.clone()))
            .collect();

        let root = world.spawn_named(name);
        let handedness = world.spawn_named(HANDEDNESS_NODE);
        world.set_transform(
            handedness,
            Transform::identity().with_scale(DVec3::new(-1.0, 1.0, 1.0)),
        );
        world.set_parent(handedness, Some(root));

        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<(usize, EntityId)> =
            self.roots.iter().rev().map(|&node| (node, handedness)).collect();
        while let Some((index, parent)) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                tracing::warn!(model = name, node = index, "node index out of range");
                continue;
            };
            if std::mem::replace(&mut visited[index], true) {
                continue;
            }
            let entity = match &node.name {
                Some(node_name) => world.spawn_named(node_name.clone()),
                None => world.spawn(),
            };
            world.set_transform(entity, node.transform);
            world.set_parent(entity, Some(parent));

            match node.meshes.as_slice() {
                [] => {}
                [single] => {
                    if let Some(&mesh) = mesh_ids.get(*single) {
                        world.set_drawable_3d(entity, Drawable3D::mesh(mesh));
                    }
                }
                many => {
                    for &mesh in many.iter().filter_map(|m| mesh_ids.get(*m)) {
                        let primitive = world.spawn();
                        world.set_drawable_3d(primitive, Drawable3D::mesh(mesh));
                        world.set_parent(primitive, Some(entity));
                    }
                }
            }
            stack.extend(node.children.iter().rev().map(|&child| (child, entity)));
        }
        root
    }
}

use glam::DMat4;

use crate::components::{Camera, Drawable3D, Light, MeshData, MeshId, Transform};
use crate::entity::EntityId;

/// Scene graph of the 3D engine.
///
/// Components are stored in parallel columns indexed by entity. Every spawned
/// node has a transform; everything else is optional.
#[derive(Debug, Default)]
pub struct World {
    next_index: u32,
    names: Vec<Option<String>>,
    transforms: Vec<Option<Transform>>,
    parents: Vec<Option<EntityId>>,
    children: Vec<Vec<EntityId>>,
    drawables_3d: Vec<Option<Drawable3D>>,
    lights: Vec<Option<Light>>,
    cameras: Vec<Option<Camera>>,
    meshes: Vec<MeshData>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self) -> EntityId {
        let id = EntityId(self.next_index);
        self.next_index += 1;
        self.ensure_capacity(id.index() as usize);
        self.transforms[id.index() as usize] = Some(Transform::identity());
        id
    }

    pub fn spawn_named(&mut self, name: impl Into<String>) -> EntityId {
        let id = self.spawn();
        self.names[id.index() as usize] = Some(name.into());
        id
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        entity.index() < self.next_index
    }

    pub fn entity_count(&self) -> usize {
        self.next_index as usize
    }

    pub fn name(&self, entity: EntityId) -> Option<&str> {
        self.names
            .get(entity.index() as usize)
            .and_then(|n| n.as_deref())
    }

    pub fn set_transform(&mut self, entity: EntityId, transform: Transform) {
        self.ensure_capacity(entity.index() as usize);
        self.transforms[entity.index() as usize] = Some(transform);
    }

    pub fn transform(&self, entity: EntityId) -> Option<Transform> {
        self.transforms.get(entity.index() as usize).and_then(|t| *t)
    }

    pub fn transform_mut(&mut self, entity: EntityId) -> Option<&mut Transform> {
        self.transforms
            .get_mut(entity.index() as usize)
            .and_then(|t| t.as_mut())
    }

    /// Re-parents `child`. Returns `false` (and changes nothing) if either
    /// entity is unknown or the move would create a cycle.
    pub fn set_parent(&mut self, child: EntityId, parent: Option<EntityId>) -> bool {
        if !self.contains(child) {
            return false;
        }
        if let Some(parent) = parent
            && (!self.contains(parent) || parent == child || self.is_ancestor(child, parent))
        {
            return false;
        }

        if let Some(old) = self.parents[child.index() as usize].take() {
            self.children[old.index() as usize].retain(|c| *c != child);
        }
        if let Some(parent) = parent {
            self.children[parent.index() as usize].push(child);
        }
        self.parents[child.index() as usize] = parent;
        true
    }

    pub fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.parents.get(entity.index() as usize).and_then(|p| *p)
    }

    pub fn children(&self, entity: EntityId) -> &[EntityId] {
        self.children
            .get(entity.index() as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Entities without a parent, in spawn order.
    pub fn roots(&self) -> Vec<EntityId> {
        (0..self.next_index)
            .map(|idx| EntityId(idx))
            .filter(|e| self.parent(*e).is_none())
            .collect()
    }

    /// `entity` followed by all of its descendants, depth first.
    pub fn descendants(&self, entity: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        if !self.contains(entity) {
            return out;
        }
        let mut stack = vec![entity];
        while let Some(e) = stack.pop() {
            out.push(e);
            stack.extend(self.children(e).iter().rev().copied());
        }
        out
    }

    pub fn set_drawable_3d(&mut self, entity: EntityId, drawable: Drawable3D) {
        self.ensure_capacity(entity.index() as usize);
        self.drawables_3d[entity.index() as usize] = Some(drawable);
    }

    pub fn drawable_3d(&self, entity: EntityId) -> Option<Drawable3D> {
        self.drawables_3d.get(entity.index() as usize).and_then(|d| *d)
    }

    pub fn drawables_3d(&self) -> Vec<(EntityId, Drawable3D)> {
        collect(&self.drawables_3d)
    }

    pub fn set_light(&mut self, entity: EntityId, light: Light) {
        self.ensure_capacity(entity.index() as usize);
        self.lights[entity.index() as usize] = Some(light);
    }

    pub fn lights(&self) -> Vec<(EntityId, Light)> {
        collect(&self.lights)
    }

    pub fn set_camera(&mut self, entity: EntityId, camera: Camera) {
        self.ensure_capacity(entity.index() as usize);
        self.cameras[entity.index() as usize] = Some(camera);
    }

    pub fn camera(&self, entity: EntityId) -> Option<&Camera> {
        self.cameras
            .get(entity.index() as usize)
            .and_then(|c| c.as_ref())
    }

    pub fn camera_mut(&mut self, entity: EntityId) -> Option<&mut Camera> {
        self.cameras
            .get_mut(entity.index() as usize)
            .and_then(|c| c.as_mut())
    }

    pub fn add_mesh(&mut self, mesh: MeshData) -> MeshId {
        let id = MeshId(self.meshes.len() as u32);
        self.meshes.push(mesh);
        id
    }

    pub fn mesh(&self, id: MeshId) -> Option<&MeshData> {
        self.meshes.get(id.0 as usize)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Local-to-world matrix, composed up the parent chain.
    pub fn world_matrix(&self, entity: EntityId) -> DMat4 {
        let mut matrix = DMat4::IDENTITY;
        let mut cursor = Some(entity);
        while let Some(e) = cursor {
            let local = self.transform(e).unwrap_or_default().to_matrix();
            matrix = local * matrix;
            cursor = self.parent(e);
        }
        matrix
    }

    /// Deep-copies `root` and its descendants. The copy gets the same parent
    /// as `root` and shares mesh data with it.
    pub fn clone_subtree(&mut self, root: EntityId) -> Option<EntityId> {
        if !self.contains(root) {
            return None;
        }
        let parent = self.parent(root);
        let copy = self.clone_node(root);
        self.set_parent(copy, parent);
        Some(copy)
    }

    fn clone_node(&mut self, source: EntityId) -> EntityId {
        let idx = source.index() as usize;
        let copy = self.spawn();
        let cidx = copy.index() as usize;
        self.names[cidx] = self.names[idx].clone();
        self.transforms[cidx] = self.transforms[idx];
        self.drawables_3d[cidx] = self.drawables_3d[idx];
        self.lights[cidx] = self.lights[idx];
        self.cameras[cidx] = self.cameras[idx];

        let children = self.children[idx].clone();
        for child in children {
            let child_copy = self.clone_node(child);
            self.set_parent(child_copy, Some(copy));
        }
        copy
    }

    fn is_ancestor(&self, ancestor: EntityId, entity: EntityId) -> bool {
        let mut cursor = self.parent(entity);
        while let Some(p) = cursor {
            if p == ancestor {
                return true;
            }
            cursor = self.parent(p);
        }
        false
    }

    fn ensure_capacity(&mut self, idx: usize) {
        if self.transforms.len() <= idx {
            let new_len = idx + 1;
            self.names.resize(new_len, None);
            self.transforms.resize(new_len, None);
            self.parents.resize(new_len, None);
            self.children.resize_with(new_len, Vec::new);
            self.drawables_3d.resize(new_len, None);
            self.lights.resize(new_len, None);
            self.cameras.resize(new_len, None);
        }
    }
}

fn collect<T: Copy>(column: &[Option<T>]) -> Vec<(EntityId, T)> {
    column
        .iter()
        .enumerate()
        .filter_map(|(idx, c)| c.map(|c| (EntityId(idx as u32), c)))
        .collect()
}

use crate::components::MeshId;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Shape3D {
    Mesh(MeshId),
    /// Debug gizmo: three colored axis lines of `length_m` from the node origin.
    Axes { length_m: f64 },
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Drawable3D {
    pub shape: Shape3D,
}

impl Drawable3D {
    pub fn mesh(mesh: MeshId) -> Self {
        Self {
            shape: Shape3D::Mesh(mesh),
        }
    }

    pub fn axes(length_m: f64) -> Self {
        Self {
            shape: Shape3D::Axes { length_m },
        }
    }
}

pub mod camera;
pub mod drawable3d;
pub mod light;
pub mod mesh;
pub mod transform;

pub use camera::*;
pub use drawable3d::*;
pub use light::*;
pub use mesh::*;
pub use transform::*;

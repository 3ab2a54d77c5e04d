pub mod error;
pub mod gltf_loader;
pub mod manifest;
pub mod model;
pub mod sample;
pub mod source;
pub mod style;

pub use error::*;
pub use gltf_loader::{GltfDecodeError, load_model};
pub use manifest::*;
pub use model::*;
pub use source::*;
pub use style::*;

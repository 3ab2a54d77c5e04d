pub mod anchor;
pub mod bootstrap;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod model_layer;
pub mod sync;
pub mod world_transform;

pub use anchor::*;
pub use bootstrap::{AssetId, AssetStatus, SceneState};
pub use error::*;
pub use host::*;
pub use lifecycle::*;
pub use model_layer::*;
pub use sync::{FrameOutcome, FrameReport, combined_matrix};
pub use world_transform::*;

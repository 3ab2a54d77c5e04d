pub mod geocode;
pub mod map_camera;

pub use geocode::*;
pub use map_camera::*;

pub mod engine;
pub mod error;
pub mod renderer;
pub mod surface;

pub use engine::*;
pub use error::*;
pub use renderer::*;
pub use surface::*;

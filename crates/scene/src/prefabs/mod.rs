pub mod rig;

pub use rig::*;

pub mod components;
pub mod entity;
pub mod prefabs;
pub mod world;

pub use entity::EntityId;
pub use world::*;

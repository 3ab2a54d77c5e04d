/// Index of a node in a [`crate::World`]. Entities are never despawned, so
/// the index alone identifies one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl EntityId {
    pub fn index(&self) -> u32 {
        self.0
    }
}

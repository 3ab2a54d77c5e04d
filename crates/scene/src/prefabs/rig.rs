//! Standard nodes every anchored scene starts with.

use glam::DVec3;

use crate::World;
use crate::components::{Camera, Drawable3D, Light};
use crate::entity::EntityId;

/// Camera at the origin whose projection is installed from outside each frame.
pub fn spawn_camera_placeholder(world: &mut World) -> EntityId {
    let entity = world.spawn_named("camera");
    world.set_camera(entity, Camera::new());
    entity
}

pub fn spawn_hemispheric_light(world: &mut World, direction: DVec3, intensity: f64) -> EntityId {
    let entity = world.spawn_named("light");
    world.set_light(entity, Light::hemispheric(direction, intensity));
    entity
}

/// Axis gizmo at the scene origin (the anchor).
pub fn spawn_axes(world: &mut World, length_m: f64) -> EntityId {
    let entity = world.spawn_named("axes");
    world.set_drawable_3d(entity, Drawable3D::axes(length_m));
    entity
}

#[cfg(test)]
mod tests {
    use super::{spawn_axes, spawn_camera_placeholder, spawn_hemispheric_light};
    use crate::World;
    use crate::components::{LightKind, Shape3D};
    use glam::DVec3;

    #[test]
    fn spawns_rig_nodes_at_the_root() {
        let mut world = World::new();
        let camera = spawn_camera_placeholder(&mut world);
        let light = spawn_hemispheric_light(&mut world, DVec3::new(0.0, 0.0, 100.0), 0.7);
        let axes = spawn_axes(&mut world, 10.0);

        assert_eq!(world.roots(), vec![camera, light, axes]);
        assert!(world.camera(camera).is_some());
        let lights = world.lights();
        assert_eq!(lights.len(), 1);
        assert!(matches!(lights[0].1.kind, LightKind::Hemispheric { .. }));
        assert_eq!(lights[0].1.intensity, 0.7);
        assert!(matches!(
            world.drawable_3d(axes).map(|d| d.shape),
            Some(Shape3D::Axes { length_m }) if length_m == 10.0
        ));
    }
}

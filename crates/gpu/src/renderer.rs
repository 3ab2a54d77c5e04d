use glam::DMat4;
use scene::World;
use scene::components::{Light, MeshId, Shape3D};
use scene::entity::EntityId;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum RenderCommand {
    DrawMesh {
        entity: EntityId,
        mesh: MeshId,
        model_view_projection: DMat4,
    },
    DrawAxes {
        entity: EntityId,
        length_m: f64,
        model_view_projection: DMat4,
    },
}

impl RenderCommand {
    pub fn entity(&self) -> EntityId {
        match self {
            RenderCommand::DrawMesh { entity, .. } | RenderCommand::DrawAxes { entity, .. } => {
                *entity
            }
        }
    }

    pub fn model_view_projection(&self) -> DMat4 {
        match self {
            RenderCommand::DrawMesh {
                model_view_projection,
                ..
            }
            | RenderCommand::DrawAxes {
                model_view_projection,
                ..
            } => *model_view_projection,
        }
    }
}

/// One render pass worth of work, handed to the surface as a unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderFrame {
    /// Whether the surface should clear before drawing. Overlay passes keep
    /// whatever the host already drew.
    pub clear: bool,
    pub lights: Vec<Light>,
    pub commands: Vec<RenderCommand>,
}

impl RenderFrame {
    pub fn draw_count(&self) -> usize {
        self.commands.len()
    }
}

/// Multiplies `view_projection * model` in the requested precision.
///
/// Mercator-space matrices mix values near 1.0 with per-meter scales around
/// 1e-8, which f32 cannot hold together without visible jitter.
pub fn model_view_projection(view_projection: DMat4, model: DMat4, high_precision: bool) -> DMat4 {
    if high_precision {
        view_projection * model
    } else {
        (view_projection.as_mat4() * model.as_mat4()).as_dmat4()
    }
}

pub struct Renderer;

impl Renderer {
    /// Builds draw commands for every drawable in `world`.
    ///
    /// `world_matrix` resolves an entity's local-to-world matrix; the engine
    /// passes its per-frame cache here.
    pub fn collect_3d(
        world: &World,
        view_projection: DMat4,
        high_precision: bool,
        mut world_matrix: impl FnMut(EntityId) -> DMat4,
    ) -> RenderFrame {
        let mut frame = RenderFrame {
            lights: world.lights().into_iter().map(|(_, l)| l).collect(),
            ..RenderFrame::default()
        };
        for (entity, drawable) in world.drawables_3d() {
            let model_view_projection =
                model_view_projection(view_projection, world_matrix(entity), high_precision);
            frame.commands.push(match drawable.shape {
                Shape3D::Mesh(mesh) => RenderCommand::DrawMesh {
                    entity,
                    mesh,
                    model_view_projection,
                },
                Shape3D::Axes { length_m } => RenderCommand::DrawAxes {
                    entity,
                    length_m,
                    model_view_projection,
                },
            });
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::{RenderCommand, Renderer, model_view_projection};
    use glam::{DMat4, DVec3};
    use scene::World;
    use scene::components::{Drawable3D, MeshData, Transform};
    use scene::prefabs::spawn_hemispheric_light;

    #[test]
    fn collect_3d_commands() {
        let mut world = World::new();
        let mesh = world.add_mesh(MeshData::default());
        let entity = world.spawn();
        world.set_transform(entity, Transform::translate(DVec3::new(1.0, 2.0, 3.0)));
        world.set_drawable_3d(entity, Drawable3D::mesh(mesh));
        spawn_hemispheric_light(&mut world, DVec3::Z, 0.7);

        let frame = Renderer::collect_3d(&world, DMat4::IDENTITY, true, |e| world.world_matrix(e));
        assert_eq!(frame.lights.len(), 1);
        assert!(!frame.clear);
        match frame.commands.as_slice() {
            [RenderCommand::DrawMesh {
                entity: e,
                model_view_projection,
                ..
            }] => {
                assert_eq!(*e, entity);
                assert_eq!(
                    model_view_projection.transform_point3(DVec3::ZERO),
                    DVec3::new(1.0, 2.0, 3.0)
                );
            }
            other => panic!("unexpected commands: {other:?}"),
        }
    }

    #[test]
    fn low_precision_loses_mercator_scale_detail() {
        // A meter near Canberra is ~3.1e-8 Mercator units; offsets of a few
        // meters vanish next to a translation of ~0.9 in f32.
        let scale = 3.1e-8;
        let model = DMat4::from_scale_rotation_translation(
            DVec3::splat(scale),
            glam::DQuat::IDENTITY,
            DVec3::new(0.913838, 0.598464, 0.0),
        );
        let p = DVec3::new(1.0, 0.0, 0.0);
        let hi = model_view_projection(DMat4::IDENTITY, model, true).transform_point3(p);
        let lo = model_view_projection(DMat4::IDENTITY, model, false).transform_point3(p);
        assert!((hi.x - (0.913838 + scale)).abs() < 1e-12);
        assert!((lo.x - hi.x).abs() > 1e-9);
    }
}

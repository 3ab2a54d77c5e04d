use std::collections::HashMap;

use glam::DMat4;
use scene::World;
use scene::entity::EntityId;
use tracing::{debug, trace};

use crate::error::RenderError;
use crate::renderer::Renderer;
use crate::surface::RenderSurface;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Keep matrix products in f64 until submission.
    pub high_precision_matrices: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            high_precision_matrices: true,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub draw_calls: usize,
    pub lights: usize,
    /// World matrices computed this pass (cache misses).
    pub matrices_computed: usize,
}

/// 3D engine bound to a host surface.
///
/// The engine has no render loop of its own. Each [`Engine::render`] call is
/// one pass driven by the caller, so anything a self-scheduled engine would
/// refresh per tick must be reset with [`Engine::wipe_caches`].
pub struct Engine {
    surface: Box<dyn RenderSurface>,
    options: EngineOptions,
    world_matrices: HashMap<EntityId, DMat4>,
    input_attached: bool,
    passes: u64,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("options", &self.options)
            .field("cached_matrices", &self.world_matrices.len())
            .field("input_attached", &self.input_attached)
            .field("passes", &self.passes)
            .finish()
    }
}

impl Engine {
    pub fn new(surface: Box<dyn RenderSurface>, options: EngineOptions) -> Result<Self, RenderError> {
        if surface.is_lost() {
            return Err(RenderError::ContextLost);
        }
        debug!(?options, "engine bound to host surface");
        Ok(Self {
            surface,
            options,
            world_matrices: HashMap::new(),
            input_attached: true,
            passes: 0,
        })
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Stops the engine from reacting to pointer/keyboard input.
    pub fn detach_control(&mut self) {
        self.input_attached = false;
    }

    pub fn input_attached(&self) -> bool {
        self.input_attached
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn cached_matrices(&self) -> usize {
        self.world_matrices.len()
    }

    pub fn wipe_caches(&mut self) {
        self.world_matrices.clear();
    }

    /// Renders `world` once through `camera`'s frozen projection.
    pub fn render(
        &mut self,
        world: &World,
        camera: EntityId,
        clear: bool,
    ) -> Result<RenderStats, RenderError> {
        if self.surface.is_lost() {
            return Err(RenderError::ContextLost);
        }
        let projection = world
            .camera(camera)
            .ok_or(RenderError::MissingCamera(camera.index()))?
            .frozen_projection()
            .ok_or(RenderError::UnfrozenProjection(camera.index()))?;

        let before = self.world_matrices.len();
        let cache = &mut self.world_matrices;
        let mut frame = Renderer::collect_3d(
            world,
            projection,
            self.options.high_precision_matrices,
            |entity| cached_world_matrix(cache, world, entity),
        );
        frame.clear = clear;

        let stats = RenderStats {
            draw_calls: frame.draw_count(),
            lights: frame.lights.len(),
            matrices_computed: self.world_matrices.len() - before,
        };
        self.surface.submit(frame)?;
        self.passes += 1;
        trace!(pass = self.passes, ?stats, "render pass submitted");
        Ok(stats)
    }

    /// Releases the surface. The engine cannot be used afterwards.
    pub fn dispose(mut self) {
        self.world_matrices.clear();
        self.surface.release();
        debug!(passes = self.passes, "engine disposed");
    }
}

fn cached_world_matrix(
    cache: &mut HashMap<EntityId, DMat4>,
    world: &World,
    entity: EntityId,
) -> DMat4 {
    if let Some(m) = cache.get(&entity) {
        return *m;
    }
    let local = world.transform(entity).unwrap_or_default().to_matrix();
    let matrix = match world.parent(entity) {
        Some(parent) => cached_world_matrix(cache, world, parent) * local,
        None => local,
    };
    cache.insert(entity, matrix);
    matrix
}

#[cfg(test)]
mod tests {
    use super::{Engine, EngineOptions};
    use crate::error::RenderError;
    use crate::renderer::RenderCommand;
    use crate::surface::HeadlessSurface;
    use glam::{DMat4, DVec3};
    use pretty_assertions::assert_eq;
    use scene::World;
    use scene::components::{Drawable3D, MeshData, Transform};
    use scene::prefabs::spawn_camera_placeholder;

    fn world_with_box() -> (World, scene::EntityId, scene::EntityId) {
        let mut world = World::new();
        let camera = spawn_camera_placeholder(&mut world);
        let mesh = world.add_mesh(MeshData::default());
        let node = world.spawn_named("box");
        world.set_drawable_3d(node, Drawable3D::mesh(mesh));
        (world, camera, node)
    }

    #[test]
    fn refuses_lost_surface_at_creation() {
        let surface = HeadlessSurface::new();
        surface.probe().lose_context();
        let err = Engine::new(Box::new(surface), EngineOptions::default()).expect_err("lost");
        assert_eq!(err, RenderError::ContextLost);
    }

    #[test]
    fn requires_frozen_projection() {
        let (world, camera, _) = world_with_box();
        let mut engine =
            Engine::new(Box::new(HeadlessSurface::new()), EngineOptions::default()).expect("engine");
        assert_eq!(
            engine.render(&world, camera, false),
            Err(RenderError::UnfrozenProjection(camera.index()))
        );
    }

    #[test]
    fn submits_one_non_clearing_pass() {
        let (mut world, camera, _) = world_with_box();
        world
            .camera_mut(camera)
            .expect("camera")
            .freeze_projection(DMat4::IDENTITY);
        let surface = HeadlessSurface::new();
        let probe = surface.probe();
        let mut engine = Engine::new(Box::new(surface), EngineOptions::default()).expect("engine");
        engine.detach_control();
        assert!(!engine.input_attached());

        let stats = engine.render(&world, camera, false).expect("render");
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(probe.frames_submitted(), 1);
        assert!(!probe.last_frame().expect("frame").clear);
    }

    #[test]
    fn stale_cache_survives_until_wiped() {
        let (mut world, camera, node) = world_with_box();
        world
            .camera_mut(camera)
            .expect("camera")
            .freeze_projection(DMat4::IDENTITY);
        let surface = HeadlessSurface::new();
        let probe = surface.probe();
        let mut engine = Engine::new(Box::new(surface), EngineOptions::default()).expect("engine");

        engine.render(&world, camera, false).expect("first pass");
        world.set_transform(node, Transform::translate(DVec3::new(5.0, 0.0, 0.0)));

        let stats = engine.render(&world, camera, false).expect("cached pass");
        assert_eq!(stats.matrices_computed, 0);
        let origin = |probe: &crate::surface::SurfaceProbe| match probe
            .last_frame()
            .expect("frame")
            .commands[0]
        {
            RenderCommand::DrawMesh {
                model_view_projection,
                ..
            } => model_view_projection.transform_point3(DVec3::ZERO),
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(origin(&probe), DVec3::ZERO);

        engine.wipe_caches();
        let stats = engine.render(&world, camera, false).expect("fresh pass");
        assert_eq!(stats.matrices_computed, 1);
        assert_eq!(origin(&probe), DVec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn dispose_releases_surface() {
        let surface = HeadlessSurface::new();
        let probe = surface.probe();
        let engine = Engine::new(Box::new(surface), EngineOptions::default()).expect("engine");
        engine.dispose();
        assert!(probe.is_released());
    }
}

//! One-time construction of the engine and scene, and asset loading.

use std::cell::RefCell;
use std::rc::Rc;

use formats::{AssetLoadError, AssetRequest, AssetSource, LayerManifest, ModelAsset, load_model};
use futures::StreamExt;
use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use futures::task::{LocalSpawn, LocalSpawnExt};
use futures::FutureExt;
use glam::DVec3;
use gpu::{Engine, EngineOptions, RenderError, RenderSurface};
use runtime::metrics::Metrics;
use scene::World;
use scene::entity::EntityId;
use scene::prefabs::{spawn_axes, spawn_camera_placeholder, spawn_hemispheric_light};
use tracing::debug;

use crate::error::LayerError;

/// Index of an asset request within its layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(pub usize);

#[derive(Debug)]
pub enum AssetStatus {
    Pending,
    /// One root per placement.
    Loaded { roots: Vec<EntityId> },
    Failed { error: AssetLoadError },
    /// The layer was detached before the result could be applied.
    Cancelled,
}

impl AssetStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, AssetStatus::Pending)
    }
}

/// A finished load travelling back to the layer.
pub(crate) struct AssetCompletion {
    pub id: AssetId,
    pub result: Result<ModelAsset, AssetLoadError>,
}

/// Engine, scene graph and asset plumbing owned by one attached layer.
///
/// Dropping it closes the completion channel, so loads that finish later
/// cannot reach the scene.
pub struct SceneState {
    pub(crate) engine: Engine,
    pub(crate) world: World,
    camera: EntityId,
    light: EntityId,
    axes: Option<EntityId>,
    asset_roots: Vec<EntityId>,
    spawner: Rc<dyn LocalSpawn>,
    completions_tx: UnboundedSender<AssetCompletion>,
    completions_rx: UnboundedReceiver<AssetCompletion>,
}

impl std::fmt::Debug for SceneState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneState")
            .field("engine", &self.engine)
            .field("entities", &self.world.entity_count())
            .field("camera", &self.camera)
            .field("asset_roots", &self.asset_roots)
            .finish_non_exhaustive()
    }
}

/// Builds the engine on the host surface and the fixed scene rig.
///
/// The engine never clears the framebuffer and takes no input; the camera is
/// a placeholder whose projection is installed every frame.
pub fn initialize(
    surface: Box<dyn RenderSurface>,
    spawner: Rc<dyn LocalSpawn>,
    manifest: &LayerManifest,
) -> Result<SceneState, RenderError> {
    let mut engine = Engine::new(
        surface,
        EngineOptions {
            high_precision_matrices: manifest.engine.high_precision_matrices,
        },
    )?;
    engine.detach_control();

    let mut world = World::new();
    let camera = spawn_camera_placeholder(&mut world);
    let light = spawn_hemispheric_light(
        &mut world,
        DVec3::from_array(manifest.light.direction),
        manifest.light.intensity,
    );
    let axes = manifest
        .debug_axes_m
        .map(|length_m| spawn_axes(&mut world, length_m));

    let (completions_tx, completions_rx) = unbounded();
    Ok(SceneState {
        engine,
        world,
        camera,
        light,
        axes,
        asset_roots: Vec::new(),
        spawner,
        completions_tx,
        completions_rx,
    })
}

impl SceneState {
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn camera(&self) -> EntityId {
        self.camera
    }

    pub fn light(&self) -> EntityId {
        self.light
    }

    pub fn axes(&self) -> Option<EntityId> {
        self.axes
    }

    /// Top-level asset roots, one per placed instance, in placement order.
    pub fn asset_roots(&self) -> &[EntityId] {
        &self.asset_roots
    }

    /// Starts loading `url` on the host executor. The result is queued for
    /// [`SceneState::take_completions`].
    pub(crate) fn spawn_load(
        &self,
        id: AssetId,
        url: String,
        source: Rc<dyn AssetSource>,
        metrics: Rc<RefCell<Metrics>>,
    ) -> Result<(), LayerError> {
        let sender = self.completions_tx.clone();
        self.spawner.spawn_local(async move {
            let result = load_model(source, url.clone()).await;
            if sender.unbounded_send(AssetCompletion { id, result }).is_err() {
                debug!(%url, "layer detached before load finished, dropping result");
                metrics.borrow_mut().incr("assets.discarded");
            }
        })?;
        Ok(())
    }

    /// Completions that arrived since the last call.
    pub(crate) fn take_completions(&mut self) -> Vec<AssetCompletion> {
        let mut done = Vec::new();
        while let Some(Some(completion)) = self.completions_rx.next().now_or_never() {
            done.push(completion);
        }
        done
    }

    /// Instantiates `model` once per placement. The first placement owns the
    /// instantiated nodes; the others are clones sharing its meshes.
    pub(crate) fn place_model(&mut self, model: &ModelAsset, request: &AssetRequest) -> Vec<EntityId> {
        let Some((first, rest)) = request.placements.split_first() else {
            return Vec::new();
        };
        let name = asset_name(&request.url);
        let root = model.instantiate(&mut self.world, name);
        self.world.set_transform(root, first.to_transform());

        let mut roots = vec![root];
        for placement in rest {
            if let Some(copy) = self.world.clone_subtree(root) {
                self.world.set_transform(copy, placement.to_transform());
                roots.push(copy);
            }
        }
        self.asset_roots.extend_from_slice(&roots);
        roots
    }

    /// Releases the engine and the host surface.
    pub(crate) fn dispose(self) {
        self.engine.dispose();
    }
}

fn asset_name(url: &str) -> &str {
    let file = url.rsplit('/').next().unwrap_or(url);
    file.split(['?', '#']).next().unwrap_or(file)
}

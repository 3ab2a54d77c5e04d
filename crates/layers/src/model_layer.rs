use std::cell::{Ref, RefCell};
use std::rc::Rc;

use formats::{AssetRequest, AssetSource, LayerManifest, RoutedAssetSource};
use runtime::event_bus::{EventBus, EventKind};
use runtime::frame::Frame;
use runtime::metrics::Metrics;
use scene::entity::EntityId;
use tracing::{debug, info, warn};

use crate::anchor::{ProjectedPoint, resolve_anchor};
use crate::bootstrap::{AssetId, AssetStatus, SceneState, initialize};
use crate::error::LayerError;
use crate::host::{AttachContext, CustomLayer, HostCameraMatrix, MapHost};
use crate::lifecycle::LayerState;
use crate::sync::{FrameOutcome, FrameReport, synchronize};
use crate::world_transform::WorldTransform;

struct AssetRecord {
    request: AssetRequest,
    status: AssetStatus,
}

/// A 3D model layer anchored at one geographic point.
///
/// The anchor and world transform are fixed at construction. Attaching builds
/// the engine on the host surface and starts asset loads; every host frame
/// then goes through [`ModelLayer::render_frame`]. Finished loads are applied
/// between frames and only while the layer is ready. After [`ModelLayer::detach`]
/// every call fails with [`LayerError::Disposed`].
pub struct ModelLayer {
    id: String,
    manifest: LayerManifest,
    anchor: ProjectedPoint,
    world_transform: WorldTransform,
    state: LayerState,
    scene: Option<SceneState>,
    host: Option<Rc<dyn MapHost>>,
    source: Rc<dyn AssetSource>,
    assets: Vec<AssetRecord>,
    frame: Frame,
    metrics: Rc<RefCell<Metrics>>,
    events: EventBus,
}

impl std::fmt::Debug for ModelLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelLayer")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("anchor", &self.anchor)
            .field("assets", &self.assets.len())
            .field("frame", &self.frame.index)
            .finish_non_exhaustive()
    }
}

impl ModelLayer {
    /// Resolves the anchor and builds the world transform. Assets are fetched
    /// through a [`RoutedAssetSource`] unless replaced with
    /// [`ModelLayer::with_source`].
    pub fn new(manifest: LayerManifest) -> Result<Self, LayerError> {
        let anchor = resolve_anchor(manifest.anchor)?;
        let world_transform = WorldTransform::build(&anchor);
        let mut metrics = Metrics::new();
        metrics.incr("world_transform.computed");
        info!(
            layer = %manifest.layer_id,
            x = anchor.x,
            y = anchor.y,
            unit_scale = anchor.unit_scale,
            "anchor resolved"
        );
        Ok(Self {
            id: manifest.layer_id.clone(),
            manifest,
            anchor,
            world_transform,
            state: LayerState::Uninitialized,
            scene: None,
            host: None,
            source: Rc::new(RoutedAssetSource::default()),
            assets: Vec::new(),
            frame: Frame::default(),
            metrics: Rc::new(RefCell::new(metrics)),
            events: EventBus::new(),
        })
    }

    pub fn with_source(mut self, source: Rc<dyn AssetSource>) -> Self {
        self.source = source;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn manifest(&self) -> &LayerManifest {
        &self.manifest
    }

    pub fn state(&self) -> LayerState {
        self.state
    }

    pub fn anchor(&self) -> &ProjectedPoint {
        &self.anchor
    }

    pub fn world_transform(&self) -> &WorldTransform {
        &self.world_transform
    }

    pub fn scene(&self) -> Option<&SceneState> {
        self.scene.as_ref()
    }

    /// Top-level asset roots currently in the scene.
    pub fn asset_roots(&self) -> &[EntityId] {
        self.scene.as_ref().map(SceneState::asset_roots).unwrap_or(&[])
    }

    pub fn asset_status(&self, id: AssetId) -> Option<&AssetStatus> {
        self.assets.get(id.0).map(|record| &record.status)
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    pub fn metrics(&self) -> Ref<'_, Metrics> {
        self.metrics.borrow()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Number of host frames rendered or skipped so far.
    pub fn frames(&self) -> u64 {
        self.frame.index
    }

    fn transition(&mut self, next: LayerState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {next}",
            self.state
        );
        info!(layer = %self.id, from = %self.state, to = %next, "layer state");
        self.events.emit(
            self.frame,
            EventKind::Lifecycle,
            format!("{} -> {next}", self.state),
        );
        self.state = next;
    }

    fn pending_assets(&self) -> usize {
        self.assets
            .iter()
            .filter(|record| record.status.is_pending())
            .count()
    }

    fn update_pending_gauge(&self) {
        let pending = self.pending_assets() as i64;
        self.metrics.borrow_mut().set_gauge("assets.pending", pending);
    }

    fn ensure_ready(&self) -> Result<(), LayerError> {
        match self.state {
            LayerState::Ready => Ok(()),
            LayerState::Disposed => Err(LayerError::Disposed(self.id.clone())),
            state => Err(LayerError::NotReady {
                layer: self.id.clone(),
                state,
            }),
        }
    }

    /// Binds the layer to a host and starts loading the manifest's assets.
    ///
    /// Completes synchronously up to the asset loads; the layer is `Ready`
    /// on return. On failure it is left `Uninitialized`.
    pub fn attach(&mut self, context: AttachContext) -> Result<(), LayerError> {
        match self.state {
            LayerState::Uninitialized => {}
            LayerState::Disposed => return Err(LayerError::Disposed(self.id.clone())),
            _ => return Err(LayerError::AlreadyAttached(self.id.clone())),
        }
        self.transition(LayerState::Initializing);

        let scene = match initialize(context.surface, context.spawner, &self.manifest) {
            Ok(scene) => scene,
            Err(err) => {
                warn!(layer = %self.id, error = %err, "bootstrap failed");
                self.transition(LayerState::Uninitialized);
                return Err(err.into());
            }
        };
        self.scene = Some(scene);
        self.host = Some(context.host);
        self.transition(LayerState::Ready);

        for request in self.manifest.assets.clone() {
            if let Err(err) = self.load_asset(request) {
                warn!(layer = %self.id, error = %err, "could not start asset load");
            }
        }
        Ok(())
    }

    /// Starts loading one asset. The scene renders without it until the load
    /// completes; a failed load is recorded and never fatal.
    pub fn load_asset(&mut self, request: AssetRequest) -> Result<AssetId, LayerError> {
        self.ensure_ready()?;
        let Some(scene) = self.scene.as_ref() else {
            return Err(LayerError::Disposed(self.id.clone()));
        };
        let id = AssetId(self.assets.len());
        scene.spawn_load(
            id,
            request.url.clone(),
            Rc::clone(&self.source),
            Rc::clone(&self.metrics),
        )?;
        self.metrics.borrow_mut().incr("assets.requested");
        self.events.emit(
            self.frame,
            EventKind::Asset,
            format!("requested {}", request.url),
        );
        self.assets.push(AssetRecord {
            request,
            status: AssetStatus::Pending,
        });
        self.update_pending_gauge();
        Ok(id)
    }

    /// Applies loads that finished since the last frame. Returns how many.
    pub fn poll_assets(&mut self) -> Result<usize, LayerError> {
        self.ensure_ready()?;
        let Some(scene) = self.scene.as_mut() else {
            return Err(LayerError::Disposed(self.id.clone()));
        };
        let completions = scene.take_completions();
        let applied = completions.len();
        for completion in completions {
            let Some(record) = self.assets.get_mut(completion.id.0) else {
                continue;
            };
            match completion.result {
                Ok(model) => {
                    let roots = scene.place_model(&model, &record.request);
                    info!(
                        layer = %self.id,
                        url = %record.request.url,
                        instances = roots.len(),
                        triangles = model.triangle_count(),
                        "asset placed"
                    );
                    self.events.emit(
                        self.frame,
                        EventKind::Asset,
                        format!("loaded {} ({} instances)", record.request.url, roots.len()),
                    );
                    self.metrics.borrow_mut().incr("assets.loaded");
                    record.status = AssetStatus::Loaded { roots };
                }
                Err(error) => {
                    warn!(layer = %self.id, %error, "asset failed to load");
                    self.events.emit(
                        self.frame,
                        EventKind::Asset,
                        format!("failed {}", record.request.url),
                    );
                    self.metrics.borrow_mut().incr("assets.failed");
                    record.status = AssetStatus::Failed { error };
                }
            }
        }
        if applied > 0 {
            self.update_pending_gauge();
        }
        Ok(applied)
    }

    /// Draws the layer for one host frame.
    ///
    /// Fails only on misuse (before attach, after detach). A failed render
    /// pass is reported in the returned [`FrameReport`] and the frame skipped.
    pub fn render_frame(&mut self, matrix: &HostCameraMatrix) -> Result<FrameReport, LayerError> {
        let assets_applied = self.poll_assets()?;
        let (Some(scene), Some(host)) = (self.scene.as_mut(), self.host.as_ref()) else {
            return Err(LayerError::Disposed(self.id.clone()));
        };
        let (combined, outcome) = synchronize(scene, &self.world_transform, matrix, host.as_ref());

        let mut metrics = self.metrics.borrow_mut();
        match &outcome {
            FrameOutcome::Rendered(stats) => {
                metrics.incr("frames.rendered");
                metrics.observe("frame.draw_calls", stats.draw_calls as f64);
            }
            FrameOutcome::Skipped(err) => {
                metrics.incr("frames.skipped");
                self.events.emit(
                    self.frame,
                    EventKind::Frame,
                    format!("skipped: {err}"),
                );
            }
        }
        drop(metrics);

        let report = FrameReport {
            frame: self.frame.index,
            combined,
            outcome,
            assets_applied,
        };
        self.frame = self.frame.next();
        Ok(report)
    }

    /// Tears the layer down and releases the engine and surface.
    ///
    /// Loads that finished but were never applied, and loads still in flight,
    /// end up `Cancelled`; their results are discarded.
    pub fn detach(&mut self) -> Result<(), LayerError> {
        if self.state.is_disposed() {
            return Err(LayerError::Disposed(self.id.clone()));
        }
        if let Some(mut scene) = self.scene.take() {
            for completion in scene.take_completions() {
                let url = self
                    .assets
                    .get(completion.id.0)
                    .map(|record| record.request.url.as_str())
                    .unwrap_or_default();
                debug!(layer = %self.id, %url, "layer detached before load was applied, dropping result");
                self.metrics.borrow_mut().incr("assets.discarded");
            }
            scene.dispose();
        }
        let mut in_flight = 0;
        for record in self.assets.iter_mut().filter(|record| record.status.is_pending()) {
            record.status = AssetStatus::Cancelled;
            in_flight += 1;
        }
        self.update_pending_gauge();
        self.host = None;
        info!(layer = %self.id, cancelled_assets = in_flight, "layer detached");
        self.transition(LayerState::Disposed);
        Ok(())
    }
}

impl CustomLayer for ModelLayer {
    fn id(&self) -> &str {
        &self.id
    }

    fn on_add(&mut self, context: AttachContext) -> Result<(), LayerError> {
        self.attach(context)
    }

    fn render(&mut self, matrix: &HostCameraMatrix) -> Result<FrameReport, LayerError> {
        self.render_frame(matrix)
    }

    fn on_remove(&mut self) -> Result<(), LayerError> {
        self.detach()
    }
}

#[cfg(test)]
mod tests {
    use super::ModelLayer;
    use crate::bootstrap::{AssetId, AssetStatus};
    use crate::error::LayerError;
    use crate::host::{AttachContext, CustomLayer, HostCameraMatrix, RepaintCounter};
    use crate::lifecycle::LayerState;
    use formats::{AssetRequest, LayerManifest, MemoryAssetSource, Placement, sample};
    use foundation::GeoPoint;
    use futures::executor::LocalPool;
    use gpu::HeadlessSurface;
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    fn layer_with(source: &MemoryAssetSource, manifest: LayerManifest) -> ModelLayer {
        ModelLayer::new(manifest)
            .expect("layer")
            .with_source(Rc::new(source.clone()))
    }

    fn attach(layer: &mut ModelLayer, pool: &LocalPool) -> Rc<RepaintCounter> {
        let host = Rc::new(RepaintCounter::new());
        layer
            .attach(AttachContext {
                surface: Box::new(HeadlessSurface::new()),
                host: host.clone(),
                spawner: Rc::new(pool.spawner()),
            })
            .expect("attach");
        host
    }

    #[test]
    fn rejects_invalid_anchor_at_construction() {
        let manifest = LayerManifest::new("bad", GeoPoint::lng_lat(0.0, 90.0));
        assert!(matches!(
            ModelLayer::new(manifest),
            Err(LayerError::InvalidAnchor(_))
        ));
    }

    #[test]
    fn attach_goes_straight_to_ready() {
        let pool = LocalPool::new();
        let mut layer = layer_with(
            &MemoryAssetSource::new(),
            LayerManifest::new("l", GeoPoint::lng_lat(0.0, 0.0)),
        );
        assert_eq!(layer.state(), LayerState::Uninitialized);
        attach(&mut layer, &pool);
        assert_eq!(layer.state(), LayerState::Ready);
        assert_eq!(layer.rendering_mode(), "3d");

        let host = Rc::new(RepaintCounter::new());
        let again = layer.attach(AttachContext {
            surface: Box::new(HeadlessSurface::new()),
            host,
            spawner: Rc::new(pool.spawner()),
        });
        assert!(matches!(again, Err(LayerError::AlreadyAttached(_))));
    }

    #[test]
    fn failed_bootstrap_returns_to_uninitialized() {
        let pool = LocalPool::new();
        let mut layer = layer_with(
            &MemoryAssetSource::new(),
            LayerManifest::new("l", GeoPoint::lng_lat(0.0, 0.0)),
        );
        let surface = HeadlessSurface::new();
        surface.probe().lose_context();
        let result = layer.attach(AttachContext {
            surface: Box::new(surface),
            host: Rc::new(RepaintCounter::new()),
            spawner: Rc::new(pool.spawner()),
        });
        assert!(matches!(result, Err(LayerError::RenderContext(_))));
        assert_eq!(layer.state(), LayerState::Uninitialized);

        attach(&mut layer, &pool);
        assert_eq!(layer.state(), LayerState::Ready);
    }

    #[test]
    fn loaded_asset_pops_in_between_frames() {
        let mut pool = LocalPool::new();
        let source = MemoryAssetSource::new();
        source.insert("tri.gltf", sample::triangle_gltf().into_bytes());
        let mut manifest = LayerManifest::new("l", GeoPoint::lng_lat(0.0, 0.0));
        manifest.assets.push(AssetRequest::new("tri.gltf", vec![Placement::default()]));
        let mut layer = layer_with(&source, manifest);
        let host = attach(&mut layer, &pool);

        let first = layer.render_frame(&HostCameraMatrix::identity()).expect("frame");
        assert_eq!(first.draw_calls(), 0);
        assert!(layer.asset_status(AssetId(0)).expect("status").is_pending());

        pool.run_until_stalled();
        let second = layer.render_frame(&HostCameraMatrix::identity()).expect("frame");
        assert_eq!(second.assets_applied, 1);
        assert_eq!(second.draw_calls(), 1);
        assert!(matches!(
            layer.asset_status(AssetId(0)),
            Some(AssetStatus::Loaded { roots }) if roots.len() == 1
        ));
        assert_eq!(host.requests(), 2);
        assert_eq!(layer.metrics().counter("assets.loaded"), 1);
        assert_eq!(layer.metrics().counter("frames.rendered"), 2);
    }

    #[test]
    fn failed_asset_is_recorded_and_not_fatal() {
        let mut pool = LocalPool::new();
        let mut layer = layer_with(
            &MemoryAssetSource::new(),
            LayerManifest::new("l", GeoPoint::lng_lat(0.0, 0.0)),
        );
        attach(&mut layer, &pool);
        let id = layer
            .load_asset(AssetRequest::new("missing.glb", vec![Placement::default()]))
            .expect("spawned");
        pool.run_until_stalled();

        let report = layer.render_frame(&HostCameraMatrix::identity()).expect("frame");
        assert!(report.rendered());
        match layer.asset_status(id) {
            Some(AssetStatus::Failed { error }) => assert_eq!(error.url, "missing.glb"),
            other => panic!("unexpected status {other:?}"),
        }
        assert_eq!(layer.metrics().counter("assets.failed"), 1);
    }

    #[test]
    fn every_call_after_detach_is_disposed() {
        let pool = LocalPool::new();
        let mut layer = layer_with(
            &MemoryAssetSource::new(),
            LayerManifest::new("l", GeoPoint::lng_lat(0.0, 0.0)),
        );
        attach(&mut layer, &pool);
        layer.on_remove().expect("detach");
        assert_eq!(layer.state(), LayerState::Disposed);

        assert!(layer.render(&HostCameraMatrix::identity()).expect_err("render").is_disposed());
        assert!(layer.poll_assets().expect_err("poll").is_disposed());
        assert!(layer
            .load_asset(AssetRequest::new("x.glb", vec![]))
            .expect_err("load")
            .is_disposed());
        assert!(layer.detach().expect_err("detach").is_disposed());
        assert!(layer.scene().is_none());
    }

    #[test]
    fn lifecycle_events_are_recorded() {
        let pool = LocalPool::new();
        let mut layer = layer_with(
            &MemoryAssetSource::new(),
            LayerManifest::new("l", GeoPoint::lng_lat(0.0, 0.0)),
        );
        attach(&mut layer, &pool);
        layer.detach().expect("detach");
        let transitions: Vec<_> = layer
            .events()
            .of_kind(runtime::event_bus::EventKind::Lifecycle)
            .map(|e| e.message.as_str())
            .collect();
        assert_eq!(
            transitions,
            vec![
                "uninitialized -> initializing",
                "initializing -> ready",
                "ready -> disposed"
            ]
        );
    }
}

//! Per-frame camera bridge between the host map and the engine.

use glam::DMat4;
use gpu::{RenderError, RenderStats};
use tracing::warn;

use crate::bootstrap::SceneState;
use crate::host::{HostCameraMatrix, MapHost};
use crate::world_transform::WorldTransform;

#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Rendered(RenderStats),
    /// The pass failed; the host frame went on without the layer.
    Skipped(RenderError),
}

/// What one host frame did. The combined matrix is a copy for inspection and
/// is not kept by the layer.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub combined: DMat4,
    pub outcome: FrameOutcome,
    /// Asset completions applied at the start of this frame.
    pub assets_applied: usize,
}

impl FrameReport {
    pub fn rendered(&self) -> bool {
        matches!(self.outcome, FrameOutcome::Rendered(_))
    }

    pub fn draw_calls(&self) -> usize {
        match &self.outcome {
            FrameOutcome::Rendered(stats) => stats.draw_calls,
            FrameOutcome::Skipped(_) => 0,
        }
    }
}

/// Host view-projection applied after the world transform.
pub fn combined_matrix(world: &WorldTransform, host: &HostCameraMatrix) -> DMat4 {
    host.as_mat4() * world.matrix()
}

/// Installs the combined matrix on the camera, renders one non-clearing pass
/// and asks the host for the next frame.
///
/// Render failures are returned in the outcome, never propagated: the host
/// must keep drawing the map even when the layer cannot.
pub(crate) fn synchronize(
    scene: &mut SceneState,
    world: &WorldTransform,
    host_matrix: &HostCameraMatrix,
    host: &dyn MapHost,
) -> (DMat4, FrameOutcome) {
    let combined = combined_matrix(world, host_matrix);
    let camera = scene.camera();
    let outcome = match scene.world.camera_mut(camera) {
        Some(cam) => {
            cam.freeze_projection(combined);
            scene.engine.wipe_caches();
            match scene.engine.render(&scene.world, camera, false) {
                Ok(stats) => FrameOutcome::Rendered(stats),
                Err(err) => {
                    warn!(error = %err, "render pass failed, skipping frame");
                    FrameOutcome::Skipped(err)
                }
            }
        }
        None => FrameOutcome::Skipped(RenderError::MissingCamera(camera.index())),
    };
    host.trigger_repaint();
    (combined, outcome)
}

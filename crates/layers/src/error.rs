use foundation::InvalidAnchorError;
use futures::task::SpawnError;
use gpu::RenderError;
use thiserror::Error;

use crate::lifecycle::LayerState;

#[derive(Debug, Error)]
pub enum LayerError {
    #[error("invalid anchor: {0}")]
    InvalidAnchor(#[from] InvalidAnchorError),
    /// The layer has not finished attaching to a host.
    #[error("layer {layer} is not ready (state: {state})")]
    NotReady { layer: String, state: LayerState },
    /// Use after `detach`.
    #[error("layer {0} has been disposed")]
    Disposed(String),
    #[error("layer {0} is already attached")]
    AlreadyAttached(String),
    #[error("render context error: {0}")]
    RenderContext(#[from] RenderError),
    #[error("host executor refused asset task: {0}")]
    Spawn(#[from] SpawnError),
}

impl LayerError {
    pub fn is_disposed(&self) -> bool {
        matches!(self, LayerError::Disposed(_))
    }
}

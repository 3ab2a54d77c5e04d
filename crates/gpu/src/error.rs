use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The host's graphics context was lost or destroyed.
    #[error("graphics context lost")]
    ContextLost,
    #[error("scene has no camera on entity {0}")]
    MissingCamera(u32),
    #[error("camera {0} has no frozen projection for this frame")]
    UnfrozenProjection(u32),
    #[error("surface rejected frame: {0}")]
    Submit(String),
}

impl RenderError {
    pub fn is_context_loss(&self) -> bool {
        matches!(self, RenderError::ContextLost)
    }
}

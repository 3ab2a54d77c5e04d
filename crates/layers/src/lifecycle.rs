use std::fmt;

/// Render layer lifecycle. `Disposed` is terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LayerState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    Disposed,
}

impl LayerState {
    pub fn is_ready(self) -> bool {
        self == LayerState::Ready
    }

    pub fn is_disposed(self) -> bool {
        self == LayerState::Disposed
    }

    /// Whether `self -> next` is a legal transition.
    ///
    /// A failed bootstrap falls back from `Initializing` to `Uninitialized` so
    /// the host can attach again.
    pub fn can_transition_to(self, next: LayerState) -> bool {
        use LayerState::*;
        matches!(
            (self, next),
            (Uninitialized, Initializing)
                | (Initializing, Ready)
                | (Initializing, Uninitialized)
                | (Uninitialized, Disposed)
                | (Ready, Disposed)
        )
    }
}

impl fmt::Display for LayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayerState::Uninitialized => "uninitialized",
            LayerState::Initializing => "initializing",
            LayerState::Ready => "ready",
            LayerState::Disposed => "disposed",
        };
        f.write_str(name)
    }
}

use thiserror::Error;

use crate::gltf_loader::GltfDecodeError;
use crate::source::FetchError;

/// A model could not be turned into scene nodes. Never fatal for the layer.
#[derive(Debug, Error)]
#[error("failed to load asset {url}: {cause}")]
pub struct AssetLoadError {
    pub url: String,
    #[source]
    pub cause: AssetLoadCause,
}

#[derive(Debug, Error)]
pub enum AssetLoadCause {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Decode(#[from] GltfDecodeError),
}

impl AssetLoadError {
    pub fn new(url: impl Into<String>, cause: impl Into<AssetLoadCause>) -> Self {
        Self {
            url: url.into(),
            cause: cause.into(),
        }
    }
}

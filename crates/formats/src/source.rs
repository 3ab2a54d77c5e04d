//! Where asset bytes come from.
//!
//! Sources return `'static` local futures so a load can be spawned on the
//! host's single-threaded executor and outlive the call that started it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use thiserror::Error;
use tokio::runtime::Handle;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP request for {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
    #[error("no tokio runtime available to fetch {0}")]
    NoRuntime(String),
    #[error("fetch task for {0} was cancelled")]
    Cancelled(String),
}

pub trait AssetSource {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<Vec<u8>, FetchError>>;
}

fn scheme(url: &str) -> Option<&str> {
    let (scheme, _) = url.split_once("://")?;
    scheme
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        .then_some(scheme)
}

/// Resolves `reference` against the URL or path of the document that mentions it.
pub fn resolve_relative(base: &str, reference: &str) -> String {
    if scheme(reference).is_some() || reference.starts_with("data:") {
        return reference.to_string();
    }
    if let Some(path) = reference.strip_prefix('/') {
        return match scheme(base) {
            Some(s) => {
                let rest = &base[s.len() + 3..];
                let host = rest.split('/').next().unwrap_or(rest);
                format!("{s}://{host}/{path}")
            }
            None => reference.to_string(),
        };
    }
    match base.rfind('/') {
        Some(idx) => format!("{}/{}", &base[..idx], reference),
        None => reference.to_string(),
    }
}

/// Reads plain paths and `file://` URLs, relative ones against `root`.
#[derive(Debug, Clone, Default)]
pub struct FileAssetSource {
    root: Option<PathBuf>,
}

impl FileAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub fn resolve(&self, url: &str) -> PathBuf {
        let path = Path::new(url.strip_prefix("file://").unwrap_or(url));
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl AssetSource for FileAssetSource {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<Vec<u8>, FetchError>> {
        if let Some(s) = scheme(url).filter(|s| *s != "file") {
            return futures::future::ready(Err(FetchError::UnsupportedScheme(s.to_string())))
                .boxed_local();
        }
        let path = self.resolve(url);
        async move {
            std::fs::read(&path).map_err(|source| match source.kind() {
                std::io::ErrorKind::NotFound => FetchError::NotFound(path.display().to_string()),
                _ => FetchError::Io { path, source },
            })
        }
        .boxed_local()
    }
}

/// Fetches `http(s)://` URLs.
///
/// Requests run on a tokio runtime: the one given to
/// [`HttpAssetSource::with_runtime`], else the runtime entered when the source
/// was built, else the one entered when the fetch starts. Without any of them
/// the fetch fails with [`FetchError::NoRuntime`].
#[derive(Debug, Clone, Default)]
pub struct HttpAssetSource {
    client: reqwest::Client,
    runtime: Option<Handle>,
}

impl HttpAssetSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            runtime: Handle::try_current().ok(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            runtime: Handle::try_current().ok(),
        }
    }

    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }
}

async fn get(client: reqwest::Client, url: String) -> Result<Vec<u8>, FetchError> {
    let http = |source| FetchError::Http {
        url: url.clone(),
        source,
    };
    let response = client.get(&url).send().await.map_err(http)?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url,
            status: status.as_u16(),
        });
    }
    let bytes = response.bytes().await.map_err(http)?;
    tracing::debug!(%url, bytes = bytes.len(), "fetched asset");
    Ok(bytes.to_vec())
}

impl AssetSource for HttpAssetSource {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<Vec<u8>, FetchError>> {
        let Some(runtime) = self.runtime.clone().or_else(|| Handle::try_current().ok()) else {
            tracing::warn!(%url, "no tokio runtime for HTTP fetch");
            return futures::future::ready(Err(FetchError::NoRuntime(url.to_string())))
                .boxed_local();
        };
        let url = url.to_string();
        let request = runtime.spawn(get(self.client.clone(), url.clone()));
        async move {
            match request.await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Cancelled(url)),
            }
        }
        .boxed_local()
    }
}

/// Dispatches on URL scheme: `http(s)` to the network, everything else to disk.
#[derive(Debug, Clone, Default)]
pub struct RoutedAssetSource {
    pub file: FileAssetSource,
    pub http: HttpAssetSource,
}

impl AssetSource for RoutedAssetSource {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<Vec<u8>, FetchError>> {
        match scheme(url) {
            Some("http" | "https") => self.http.fetch(url),
            _ => self.file.fetch(url),
        }
    }
}

enum MemoryEntry {
    Ready(Vec<u8>),
    Deferred(oneshot::Receiver<Result<Vec<u8>, FetchError>>),
}

/// In-memory source for tests and embedded assets.
///
/// [`MemoryAssetSource::defer`] registers a URL whose fetch stays pending until
/// the returned [`DeferredAsset`] is resolved, which lets callers hold a load
/// in flight deliberately.
#[derive(Clone, Default)]
pub struct MemoryAssetSource {
    entries: Rc<RefCell<HashMap<String, MemoryEntry>>>,
}

pub struct DeferredAsset {
    sender: oneshot::Sender<Result<Vec<u8>, FetchError>>,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, bytes: Vec<u8>) {
        self.entries
            .borrow_mut()
            .insert(url.into(), MemoryEntry::Ready(bytes));
    }

    pub fn defer(&self, url: impl Into<String>) -> DeferredAsset {
        let (sender, receiver) = oneshot::channel();
        self.entries
            .borrow_mut()
            .insert(url.into(), MemoryEntry::Deferred(receiver));
        DeferredAsset { sender }
    }
}

impl DeferredAsset {
    /// Completes the pending fetch. Returns `false` if nobody is waiting any more.
    pub fn resolve(self, bytes: Vec<u8>) -> bool {
        self.sender.send(Ok(bytes)).is_ok()
    }

    pub fn fail(self, error: FetchError) -> bool {
        self.sender.send(Err(error)).is_ok()
    }
}

impl AssetSource for MemoryAssetSource {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<Vec<u8>, FetchError>> {
        let mut entries = self.entries.borrow_mut();
        match entries.remove(url) {
            Some(MemoryEntry::Ready(bytes)) => {
                entries.insert(url.to_string(), MemoryEntry::Ready(bytes.clone()));
                futures::future::ready(Ok(bytes)).boxed_local()
            }
            Some(MemoryEntry::Deferred(receiver)) => {
                let url = url.to_string();
                async move { receiver.await.unwrap_or(Err(FetchError::NotFound(url))) }
                    .boxed_local()
            }
            None => futures::future::ready(Err(FetchError::NotFound(url.to_string()))).boxed_local(),
        }
    }
}

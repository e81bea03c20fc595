//! Object storage backends for product archives.
//!
//! The gate only needs `get(key)`: either a byte stream or "absent".

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

/// Read size for local files.
const CHUNK_SIZE: usize = 64 * 1024;

pub type ByteStream = BoxStream<'static, Result<Bytes, io::Error>>;

/// An object fetched from storage.
pub struct StoredObject {
    /// Length in bytes, when the backend knows it up front
    pub size: Option<u64>,
    pub body: ByteStream,
}

impl std::fmt::Debug for StoredObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredObject")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Key → byte stream store.
pub trait ObjectStore: Send + Sync {
    /// `Ok(None)` when no object exists under `key`.
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<StoredObject>, StorageError>> + Send;
}

/// Keys are relative, `/`-separated and may not climb out of the root.
fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('/')
        && !key.contains('\\')
        && !key.contains('\0')
        && key.split('/').all(|seg| !seg.is_empty() && seg != "." && seg != "..")
}

/// Objects stored as files under a root directory.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ObjectStore for LocalObjectStore {
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        if !is_safe_key(key) {
            tracing::warn!(key = %key, "rejected unsafe storage key");
            return Ok(None);
        }

        let path = self.root.join(key);
        let file = match tokio::fs::File::open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let meta = file.metadata().await?;
        if !meta.is_file() {
            return Ok(None);
        }

        let body = stream::try_unfold(file, |mut file| async move {
            let mut buf = vec![0u8; CHUNK_SIZE];
            let n = file.read(&mut buf).await?;
            if n == 0 {
                return Ok::<_, io::Error>(None);
            }
            buf.truncate(n);
            Ok(Some((Bytes::from(buf), file)))
        })
        .boxed();

        Ok(Some(StoredObject {
            size: Some(meta.len()),
            body,
        }))
    }
}

/// Objects served over HTTP from a bucket's public base URL.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    http: reqwest::Client,
    base_url: String,
}

impl HttpObjectStore {
    pub fn new(base_url: &str) -> Result<Self, StorageError> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| StorageError::Backend(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn object_url(&self, key: &str) -> String {
        let encoded: Vec<_> = key.split('/').map(urlencoding::encode).collect();
        format!("{}/{}", self.base_url, encoded.join("/"))
    }
}

impl ObjectStore for HttpObjectStore {
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        if !is_safe_key(key) {
            tracing::warn!(key = %key, "rejected unsafe storage key");
            return Ok(None);
        }

        let resp = self
            .http
            .get(self.object_url(key))
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("object request failed: {e}")))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StorageError::Backend(format!(
                "object request returned {status}"
            )));
        }

        let size = resp.content_length();
        let body = resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(io::Error::other))
            .boxed();

        Ok(Some(StoredObject { size, body }))
    }
}

/// Backend selected at startup.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    Local(LocalObjectStore),
    Http(HttpObjectStore),
}

impl ObjectStore for StorageBackend {
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        match self {
            StorageBackend::Local(store) => store.get(key).await,
            StorageBackend::Http(store) => store.get(key).await,
        }
    }
}

//! Blob transfer boundary
//!
//! The remote blob store is reached only through [`BlobTransfer`]. An upload
//! is started with `begin_upload` and then observed through the returned
//! [`UploadHandle`], which yields progress events followed by exactly one
//! terminal event.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use lx_core::error::ErrorKind;
use lx_core::types::AssetCategory;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::locator::AssetLocator;

/// Storage errors
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Storage backend error: {0}")]
    BackendError(String),
}

impl TransferError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Transfer
    }
}

pub type TransferResult<T> = Result<T, TransferError>;

/// Event emitted while an upload runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    Progress {
        bytes_transferred: u64,
        total_bytes: u64,
    },
    /// Bytes are stored; `location` is the object path to resolve
    Completed { location: String },
    Failed { message: String },
}

/// Receiving side of a running upload
#[derive(Debug)]
pub struct UploadHandle {
    destination: String,
    events: mpsc::UnboundedReceiver<TransferEvent>,
}

impl UploadHandle {
    /// Handle plus the sender a backend publishes events into
    pub fn channel(destination: impl Into<String>) -> (Self, mpsc::UnboundedSender<TransferEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = Self {
            destination: destination.into(),
            events: rx,
        };
        (handle, tx)
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Next event, or `None` once the backend dropped its sender
    pub async fn next_event(&mut self) -> Option<TransferEvent> {
        self.events.recv().await
    }
}

/// Unified interface for blob store backends
#[async_trait]
pub trait BlobTransfer: Send + Sync {
    /// Start moving `data` to `destination`
    async fn begin_upload(
        &self,
        data: Bytes,
        destination: &str,
        content_type: &str,
    ) -> TransferResult<UploadHandle>;

    /// Turn a completed upload's location into a stable retrieval locator
    async fn resolve_locator(&self, location: &str) -> TransferResult<String>;

    /// Delete the object stored at `path`
    async fn delete(&self, path: &str) -> TransferResult<()>;

    /// Check if an object exists
    async fn exists(&self, path: &str) -> TransferResult<bool>;

    /// Public base URL the store's locators are built under
    fn base_url(&self) -> &str;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Replace every character outside `[A-Za-z0-9.]` with `_`
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
        .collect()
}

/// `{category}/{unix_millis}_{sanitized name}`
pub fn destination_path(category: AssetCategory, file_name: &str, unix_millis: i64) -> String {
    format!("{}/{}_{}", category, unix_millis, sanitize_file_name(file_name))
}

/// Destination path stamped with the current time
pub fn destination_path_now(category: AssetCategory, file_name: &str) -> String {
    destination_path(category, file_name, chrono::Utc::now().timestamp_millis())
}

/// Reject keys that could escape the store root
fn check_key(key: &str) -> TransferResult<()> {
    if key.is_empty()
        || key.starts_with('/')
        || key.starts_with('\\')
        || key.split(['/', '\\']).any(|segment| segment == "..")
    {
        return Err(TransferError::InvalidPath(key.to_string()));
    }
    Ok(())
}

/// Failure injection for [`MemoryBlobStore`]
#[derive(Debug, Clone, Default)]
pub struct FailurePlan {
    /// Emit a failure event once progress reaches this percentage
    pub fail_at_percent: Option<u8>,
    /// Message carried by the injected failure event
    pub message: String,
    /// Fail locator resolution after a completed transfer
    pub fail_resolution: bool,
    /// Refuse to start uploads at all
    pub refuse_start: bool,
}

/// In-memory blob store for testing
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, Bytes>>,
    base_url: String,
    chunk_size: usize,
    failure: FailurePlan,
    uploads_started: AtomicUsize,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            base_url: "https://blobs.test".to_string(),
            chunk_size: 64 * 1024,
            failure: FailurePlan::default(),
            uploads_started: AtomicUsize::new(0),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_failure(mut self, failure: FailurePlan) -> Self {
        self.failure = failure;
        self
    }

    /// Number of `begin_upload` calls that got past the start check
    pub fn uploads_started(&self) -> usize {
        self.uploads_started.load(Ordering::SeqCst)
    }

    /// Stored object paths, sorted
    pub async fn object_paths(&self) -> Vec<String> {
        let objects = self.objects.read().await;
        let mut paths: Vec<String> = objects.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Put an object directly, bypassing the event protocol
    pub async fn insert(&self, path: &str, data: Bytes) {
        self.objects.write().await.insert(path.to_string(), data);
    }
}

#[async_trait]
impl BlobTransfer for MemoryBlobStore {
    async fn begin_upload(
        &self,
        data: Bytes,
        destination: &str,
        _content_type: &str,
    ) -> TransferResult<UploadHandle> {
        check_key(destination)?;
        if self.failure.refuse_start {
            return Err(TransferError::BackendError(self.failure.message.clone()));
        }
        self.uploads_started.fetch_add(1, Ordering::SeqCst);

        let (handle, tx) = UploadHandle::channel(destination);
        let total = data.len() as u64;

        // The receiver is still held by `handle`, so sends cannot fail here
        let _ = tx.send(TransferEvent::Progress {
            bytes_transferred: 0,
            total_bytes: total,
        });

        let mut transferred = 0u64;
        while transferred < total {
            let next = (transferred + self.chunk_size as u64).min(total);

            if let Some(fail_at) = self.failure.fail_at_percent {
                let fail_bytes = total * u64::from(fail_at.min(100)) / 100;
                if next >= fail_bytes {
                    let _ = tx.send(TransferEvent::Progress {
                        bytes_transferred: fail_bytes,
                        total_bytes: total,
                    });
                    let _ = tx.send(TransferEvent::Failed {
                        message: self.failure.message.clone(),
                    });
                    return Ok(handle);
                }
            }

            transferred = next;
            let _ = tx.send(TransferEvent::Progress {
                bytes_transferred: transferred,
                total_bytes: total,
            });
        }

        self.objects
            .write()
            .await
            .insert(destination.to_string(), data);
        let _ = tx.send(TransferEvent::Completed {
            location: destination.to_string(),
        });

        Ok(handle)
    }

    async fn resolve_locator(&self, location: &str) -> TransferResult<String> {
        if self.failure.fail_resolution {
            return Err(TransferError::BackendError(
                "download URL unavailable".to_string(),
            ));
        }
        let objects = self.objects.read().await;
        if !objects.contains_key(location) {
            return Err(TransferError::NotFound(location.to_string()));
        }
        Ok(AssetLocator::format(&self.base_url, location))
    }

    async fn delete(&self, path: &str) -> TransferResult<()> {
        let mut objects = self.objects.write().await;
        objects.remove(path);
        Ok(())
    }

    async fn exists(&self, path: &str) -> TransferResult<bool> {
        let objects = self.objects.read().await;
        Ok(objects.contains_key(path))
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Local filesystem blob store
///
/// Bytes are written to a `.part` file in chunks and renamed into place on
/// completion, so a half-written upload is never visible under its key.
pub struct LocalBlobStore {
    /// Root directory for storage
    root: PathBuf,
    /// Base URL for generating locators
    base_url: String,
    chunk_size: usize,
}

impl LocalBlobStore {
    /// Create a new local blob store
    pub fn new(root: impl AsRef<Path>, base_url: impl Into<String>, chunk_size: usize) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            base_url: base_url.into(),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Resolve a key to a full path
    fn resolve_path(&self, key: &str) -> TransferResult<PathBuf> {
        check_key(key)?;
        Ok(self.root.join(key))
    }

    async fn write_chunks(
        path: &Path,
        data: &Bytes,
        chunk_size: usize,
        tx: &mpsc::UnboundedSender<TransferEvent>,
    ) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let partial = partial_path(path);
        let file = fs::File::create(&partial).await?;

        let result = match Self::fill(file, data, chunk_size, tx).await {
            Ok(()) => fs::rename(&partial, path).await,
            Err(e) => Err(e),
        };

        if result.is_err() {
            if let Err(e) = fs::remove_file(&partial).await {
                warn!(path = ?partial, error = %e, "Failed to remove partial upload");
            }
        }
        result
    }

    async fn fill(
        mut file: fs::File,
        data: &Bytes,
        chunk_size: usize,
        tx: &mpsc::UnboundedSender<TransferEvent>,
    ) -> std::io::Result<()> {
        let total = data.len() as u64;
        let mut transferred = 0u64;

        for chunk in data.chunks(chunk_size) {
            file.write_all(chunk).await?;
            transferred += chunk.len() as u64;
            let _ = tx.send(TransferEvent::Progress {
                bytes_transferred: transferred,
                total_bytes: total,
            });
        }

        file.sync_all().await
    }
}

/// Temp file an upload is written to: `news/1_a.jpg` becomes `news/1_a.jpg.part`
fn partial_path(path: &Path) -> PathBuf {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    PathBuf::from(partial)
}

#[async_trait]
impl BlobTransfer for LocalBlobStore {
    #[instrument(skip(self, data), fields(storage = "local", size = data.len()))]
    async fn begin_upload(
        &self,
        data: Bytes,
        destination: &str,
        _content_type: &str,
    ) -> TransferResult<UploadHandle> {
        let path = self.resolve_path(destination)?;
        let (handle, tx) = UploadHandle::channel(destination);
        let location = destination.to_string();
        let chunk_size = self.chunk_size;

        let _ = tx.send(TransferEvent::Progress {
            bytes_transferred: 0,
            total_bytes: data.len() as u64,
        });

        tokio::spawn(async move {
            match Self::write_chunks(&path, &data, chunk_size, &tx).await {
                Ok(()) => {
                    debug!(path = ?path, "Object stored");
                    let _ = tx.send(TransferEvent::Completed { location });
                }
                Err(e) => {
                    warn!(path = ?path, error = %e, "Local upload failed");
                    let _ = tx.send(TransferEvent::Failed {
                        message: e.to_string(),
                    });
                }
            }
        });

        Ok(handle)
    }

    async fn resolve_locator(&self, location: &str) -> TransferResult<String> {
        let path = self.resolve_path(location)?;
        if !fs::try_exists(&path).await? {
            return Err(TransferError::NotFound(location.to_string()));
        }
        Ok(AssetLocator::format(&self.base_url, location))
    }

    #[instrument(skip(self), fields(storage = "local"))]
    async fn delete(&self, path: &str) -> TransferResult<()> {
        let full = self.resolve_path(path)?;

        if fs::try_exists(&full).await? {
            fs::remove_file(&full).await?;
            info!(path = ?full, "Object deleted");
        }

        Ok(())
    }

    async fn exists(&self, path: &str) -> TransferResult<bool> {
        let full = self.resolve_path(path)?;
        Ok(fs::try_exists(&full).await?)
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn name(&self) -> &str {
        "local"
    }
}

//! # lx-assets
//!
//! Image asset handling for Lexportal forms.
//!
//! ## Features
//!
//! - File validation against media type and size limits
//! - Local previews as `data:` URIs
//! - Blob transfer boundary with memory and local filesystem backends
//! - Upload sessions with an explicit state machine and progress reporting
//! - Per-form asset state (persisted reference or pending file)
//!
//! ## Example
//!
//! ```rust,ignore
//! use lx_assets::{AssetService, MemoryBlobStore, UploadProgress};
//! use lx_core::{config::AssetConfig, AssetCategory};
//! use std::sync::Arc;
//!
//! let service = AssetService::new(Arc::new(MemoryBlobStore::new()), &AssetConfig::default());
//! let mut session = service.new_session(AssetCategory::News);
//! let mut history: Vec<UploadProgress> = Vec::new();
//!
//! let file = service.validator().read_file("photo.jpg").await?;
//! let reference = session.run(&file, &mut history).await?;
//! ```

pub mod locator;
pub mod model;
pub mod preview;
pub mod reference;
pub mod service;
pub mod session;
pub mod storage;
pub mod validator;

pub use locator::{AssetLocator, ReferenceParseError};
pub use model::{AssetReference, CandidateFile, FileHeader};
pub use preview::{DataUriPreviewGenerator, Preview, PreviewError, PreviewGenerator};
pub use reference::{AssetError, AssetReferenceStore, AssetSlot, PendingAsset};
pub use service::{AssetService, DeleteError};
pub use session::{
    percent_complete, ProgressSink, UploadError, UploadProgress, UploadSession, UploadState,
    GENERIC_TRANSFER_FAILURE,
};
pub use storage::{
    destination_path, destination_path_now, sanitize_file_name, BlobTransfer, FailurePlan,
    LocalBlobStore, MemoryBlobStore, TransferError, TransferEvent, TransferResult, UploadHandle,
};
pub use validator::{FileValidator, ReadFileError, RejectReason};

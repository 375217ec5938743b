//! Asset Service
//!
//! Ties a blob transfer backend to the validator limits and hands out
//! upload sessions and per-form stores. Also owns deletion by locator.

use std::sync::Arc;

use lx_core::config::AssetConfig;
use lx_core::error::ErrorKind;
use lx_core::types::AssetCategory;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::locator::{AssetLocator, ReferenceParseError};
use crate::model::AssetReference;
use crate::reference::AssetReferenceStore;
use crate::session::UploadSession;
use crate::storage::{BlobTransfer, TransferError};
use crate::validator::FileValidator;

#[derive(Debug, Error)]
pub enum DeleteError {
    #[error(transparent)]
    Reference(#[from] ReferenceParseError),
    #[error("Delete failed: {0}")]
    Transfer(#[from] TransferError),
}

impl DeleteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeleteError::Reference(e) => e.kind(),
            DeleteError::Transfer(_) => ErrorKind::Transfer,
        }
    }
}

/// Asset service
pub struct AssetService<B: BlobTransfer> {
    transfer: Arc<B>,
    validator: FileValidator,
}

impl<B: BlobTransfer> Clone for AssetService<B> {
    fn clone(&self) -> Self {
        Self {
            transfer: Arc::clone(&self.transfer),
            validator: self.validator.clone(),
        }
    }
}

impl<B: BlobTransfer> AssetService<B> {
    pub fn new(transfer: Arc<B>, config: &AssetConfig) -> Self {
        Self {
            transfer,
            validator: FileValidator::new(config),
        }
    }

    pub fn validator(&self) -> &FileValidator {
        &self.validator
    }

    pub fn transfer(&self) -> &Arc<B> {
        &self.transfer
    }

    /// Fresh single-attempt session uploading under `category`
    pub fn new_session(&self, category: AssetCategory) -> UploadSession<B> {
        UploadSession::new(Arc::clone(&self.transfer), self.validator.clone(), category)
    }

    /// Empty store for a create form
    pub fn new_store(&self) -> AssetReferenceStore {
        AssetReferenceStore::new(self.validator.clone())
    }

    /// Store for an edit form
    pub fn store_from_persisted(&self, reference: impl Into<AssetReference>) -> AssetReferenceStore {
        AssetReferenceStore::from_persisted(self.validator.clone(), reference)
    }

    /// Delete the object a locator points at.
    ///
    /// A locator that does not parse, or that was not issued under this
    /// store's base URL, is refused and nothing is deleted. Returns the
    /// deleted object path.
    #[instrument(skip(self), fields(backend = self.transfer.name()))]
    pub async fn delete_by_locator(&self, locator: &str) -> Result<String, DeleteError> {
        let path = match AssetLocator::parse_under(self.transfer.base_url(), locator) {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "Skipping asset deletion");
                return Err(e.into());
            }
        };

        self.transfer.delete(&path).await?;
        info!(path = %path, "Asset deleted");
        Ok(path)
    }
}

//! Save coordinator
//!
//! The transaction boundary of every create/edit screen: contract check,
//! upload of a pending file, merge of the resolved locator, then persistence.
//! Persistence is never called unless the upload feeding it succeeded.

use std::sync::Arc;

use lx_assets::{AssetService, BlobTransfer, RejectReason, UploadError, GENERIC_TRANSFER_FAILURE};
use lx_contracts::Contract;
use lx_core::error::{ErrorKind, LxError, ValidationErrors};
use lx_models::FormDraft;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::form::AssetForm;
use crate::persistence::{PersistedEntity, PersistenceApi, PersistenceError};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SaveError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("Upload rejected: {0}")]
    Rejected(RejectReason),
    #[error("Upload failed: {message}")]
    Transfer { message: String },
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl SaveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SaveError::Validation(_) | SaveError::Rejected(_) => ErrorKind::Validation,
            SaveError::Transfer { .. } => ErrorKind::Transfer,
            SaveError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// Message shown next to the form
    pub fn user_message(&self) -> String {
        match self {
            SaveError::Validation(errors) => errors.to_string(),
            SaveError::Rejected(reason) => reason.to_string(),
            SaveError::Transfer { message } if message.trim().is_empty() => {
                GENERIC_TRANSFER_FAILURE.to_string()
            }
            SaveError::Transfer { message } => message.clone(),
            SaveError::Persistence(e) => e.to_string(),
        }
    }
}

impl From<UploadError> for SaveError {
    fn from(error: UploadError) -> Self {
        match error {
            UploadError::Rejected(reason) => SaveError::Rejected(reason),
            UploadError::Transfer { message, .. } => SaveError::Transfer { message },
            UploadError::Busy => SaveError::Transfer {
                message: UploadError::Busy.to_string(),
            },
        }
    }
}

impl From<SaveError> for LxError {
    fn from(error: SaveError) -> Self {
        match error {
            SaveError::Validation(errors) => LxError::Validation(errors),
            SaveError::Rejected(reason) => {
                let mut errors = ValidationErrors::new();
                errors.add("asset", reason.to_string());
                LxError::Validation(errors)
            }
            e @ SaveError::Transfer { .. } => LxError::Transfer {
                message: e.user_message(),
            },
            SaveError::Persistence(e) => LxError::Persistence {
                message: e.to_string(),
            },
        }
    }
}

/// Submits asset-bearing forms
pub struct SaveCoordinator<B: BlobTransfer, P, C> {
    assets: AssetService<B>,
    persistence: Arc<P>,
    contract: C,
}

impl<B: BlobTransfer, P, C> SaveCoordinator<B, P, C> {
    pub fn new(assets: AssetService<B>, persistence: Arc<P>, contract: C) -> Self {
        Self {
            assets,
            persistence,
            contract,
        }
    }

    pub fn assets(&self) -> &AssetService<B> {
        &self.assets
    }

    pub fn persistence(&self) -> &Arc<P> {
        &self.persistence
    }

    /// Validate, upload the pending file if any, then persist.
    ///
    /// On a failed or rejected upload the pending file is dropped, the
    /// superseded reference comes back and the error stays in the form's
    /// progress record. Field values are left as they were.
    #[instrument(skip_all, fields(entity = D::ENTITY_NAME, mode = ?form.mode()))]
    pub async fn submit<D>(
        &self,
        form: &mut AssetForm<D>,
    ) -> Result<PersistedEntity<D::Entity>, SaveError>
    where
        D: FormDraft,
        P: PersistenceApi<D::Entity>,
        C: Contract<D::Entity>,
    {
        let context = form.submit_context();
        if let Err(errors) = self.contract.validate(&form.draft().to_entity(), &context) {
            warn!(errors = %errors, "Submission blocked by validation");
            return Err(SaveError::Validation(errors));
        }

        if let Some(file) = form.assets().pending_file().cloned() {
            let mut session = self.assets.new_session(D::ASSET_CATEGORY);
            match session.run(&file, form.assets_mut()).await {
                Ok(reference) => form.merge_reference(reference),
                Err(e) => {
                    form.assets_mut().abandon_pending();
                    return Err(e.into());
                }
            }
        }

        let target = form.mode().save_target();
        let saved = match self.persistence.save(target, form.draft().to_entity()).await {
            Ok(saved) => saved,
            Err(e) => {
                // The uploaded asset stays where it is; a retry reuses its reference
                warn!(error = %e, reference = form.draft().asset_reference(), "Save failed");
                return Err(e.into());
            }
        };

        info!(id = %saved.id, "Saved");
        form.mark_persisted(saved.id.clone());
        Ok(saved)
    }
}

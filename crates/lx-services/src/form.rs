//! Asset-bearing form
//!
//! Pairs a draft with its [`AssetReferenceStore`] and keeps the draft's asset
//! reference in step with manual edits and removals.

use lx_assets::{
    AssetError, AssetReference, AssetReferenceStore, CandidateFile, FileValidator,
    PreviewGenerator, UploadProgress,
};
use lx_contracts::SubmitContext;
use lx_core::traits::EntityId;
use lx_models::FormDraft;
use tracing::{debug, warn};

use crate::persistence::{PersistenceApi, PersistenceResult, SaveTarget};

/// Create or edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(EntityId),
}

impl FormMode {
    pub fn save_target(&self) -> SaveTarget {
        match self {
            FormMode::Create => SaveTarget::Create,
            FormMode::Edit(id) => SaveTarget::Update(id.clone()),
        }
    }
}

/// State of one create/edit screen
#[derive(Debug, Clone)]
pub struct AssetForm<D: FormDraft> {
    draft: D,
    assets: AssetReferenceStore,
    mode: FormMode,
}

impl<D: FormDraft> AssetForm<D> {
    /// Empty form for the create flow
    pub fn create(validator: FileValidator) -> Self {
        Self {
            draft: D::default(),
            assets: AssetReferenceStore::new(validator),
            mode: FormMode::Create,
        }
    }

    /// Form for the edit flow, populated from an already fetched entity
    pub fn edit(id: impl Into<EntityId>, entity: &D::Entity, validator: FileValidator) -> Self {
        let draft = D::from_entity(entity);
        let assets = AssetReferenceStore::from_persisted(validator, draft.asset_reference());
        Self {
            draft,
            assets,
            mode: FormMode::Edit(id.into()),
        }
    }

    /// Fetch `id` and open it for editing
    pub async fn load_for_edit<P>(
        persistence: &P,
        id: &str,
        validator: FileValidator,
    ) -> PersistenceResult<Self>
    where
        P: PersistenceApi<D::Entity> + ?Sized,
    {
        let entity = persistence.fetch(id).await?;
        debug!(entity = D::ENTITY_NAME, id = %id, "Loaded for edit");
        Ok(Self::edit(id, &entity, validator))
    }

    pub fn draft(&self) -> &D {
        &self.draft
    }

    pub fn assets(&self) -> &AssetReferenceStore {
        &self.assets
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn progress(&self) -> &UploadProgress {
        self.assets.progress()
    }

    /// Apply one field update
    pub fn update(&mut self, field: D::Field) {
        let draft = std::mem::take(&mut self.draft);
        self.draft = draft.apply(field);
    }

    /// Select a local file and try to preview it.
    ///
    /// A rejected file is reported; a failed preview is only logged and the
    /// file stays selected.
    pub async fn select_file<G>(&mut self, file: CandidateFile, previews: &G) -> Result<(), AssetError>
    where
        G: PreviewGenerator + ?Sized,
    {
        self.assets.select_file(file.clone())?;

        match previews.generate(&file).await {
            Ok(preview) => self.assets.attach_preview(preview),
            Err(e) => warn!(file = %file.name(), error = %e, "Preview unavailable"),
        }
        Ok(())
    }

    /// Remove the selection and the displayed reference
    pub fn remove_selection(&mut self) -> Result<(), AssetError> {
        self.assets.remove_selection()?;
        self.set_draft_reference("");
        Ok(())
    }

    /// Typed-in reference, accepted only when no file is pending
    pub fn set_manual_reference(&mut self, value: &str) -> Result<(), AssetError> {
        self.assets.set_manual_reference(value)?;
        self.set_draft_reference(value.trim());
        Ok(())
    }

    pub fn submit_context(&self) -> SubmitContext {
        SubmitContext {
            asset_pending: self.assets.has_pending_file(),
        }
    }

    pub(crate) fn assets_mut(&mut self) -> &mut AssetReferenceStore {
        &mut self.assets
    }

    /// Put an uploaded asset's locator into both the draft and the store
    pub(crate) fn merge_reference(&mut self, reference: AssetReference) {
        self.set_draft_reference(reference.as_str());
        self.assets.complete_upload(reference);
    }

    pub(crate) fn mark_persisted(&mut self, id: EntityId) {
        self.mode = FormMode::Edit(id);
    }

    fn set_draft_reference(&mut self, reference: &str) {
        let draft = std::mem::take(&mut self.draft);
        self.draft = draft.with_asset_reference(reference);
    }
}

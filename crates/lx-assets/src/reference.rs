//! Per-form asset state
//!
//! A form owns exactly one [`AssetReferenceStore`]. It holds either nothing, a
//! persisted reference, or a pending local file waiting for submission, plus
//! the progress record of the latest upload attempt.

use lx_core::error::ErrorKind;
use thiserror::Error;
use tracing::debug;

use crate::model::{AssetReference, CandidateFile};
use crate::preview::Preview;
use crate::session::{ProgressSink, UploadProgress};
use crate::validator::{FileValidator, RejectReason};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssetError {
    #[error("{0}")]
    Rejected(#[from] RejectReason),
    #[error("an upload is in progress")]
    UploadInProgress,
    #[error("manual reference entry is disabled while a file is pending")]
    ManualEntryDisabled,
}

impl AssetError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Local file selected but not uploaded yet
#[derive(Debug, Clone)]
pub struct PendingAsset {
    file: CandidateFile,
    preview: Option<Preview>,
    /// Persisted reference this file will replace
    superseded: Option<AssetReference>,
}

impl PendingAsset {
    pub fn file(&self) -> &CandidateFile {
        &self.file
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn superseded(&self) -> Option<&AssetReference> {
        self.superseded.as_ref()
    }
}

#[derive(Debug, Clone, Default)]
pub enum AssetSlot {
    #[default]
    Empty,
    Persisted(AssetReference),
    Pending(PendingAsset),
}

impl AssetSlot {
    fn from_reference(reference: AssetReference) -> Self {
        if reference.is_empty() {
            AssetSlot::Empty
        } else {
            AssetSlot::Persisted(reference)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssetReferenceStore {
    slot: AssetSlot,
    progress: UploadProgress,
    validator: FileValidator,
}

impl AssetReferenceStore {
    pub fn new(validator: FileValidator) -> Self {
        Self {
            slot: AssetSlot::Empty,
            progress: UploadProgress::default(),
            validator,
        }
    }

    /// Store for the edit flow, seeded with the reference loaded from persistence
    pub fn from_persisted(validator: FileValidator, reference: impl Into<AssetReference>) -> Self {
        Self {
            slot: AssetSlot::from_reference(reference.into()),
            progress: UploadProgress::default(),
            validator,
        }
    }

    pub fn slot(&self) -> &AssetSlot {
        &self.slot
    }

    pub fn progress(&self) -> &UploadProgress {
        &self.progress
    }

    /// Reference that would be saved if no file were pending
    pub fn current_reference(&self) -> Option<&AssetReference> {
        match &self.slot {
            AssetSlot::Persisted(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn pending_file(&self) -> Option<&CandidateFile> {
        match &self.slot {
            AssetSlot::Pending(pending) => Some(pending.file()),
            _ => None,
        }
    }

    pub fn preview(&self) -> Option<&Preview> {
        match &self.slot {
            AssetSlot::Pending(pending) => pending.preview(),
            _ => None,
        }
    }

    pub fn has_pending_file(&self) -> bool {
        matches!(self.slot, AssetSlot::Pending(_))
    }

    pub fn is_transferring(&self) -> bool {
        self.progress.is_active
    }

    /// The manual reference field is editable only without a pending file
    pub fn manual_entry_enabled(&self) -> bool {
        !self.has_pending_file()
    }

    /// Hold `file` for upload at submission.
    ///
    /// A rejected file leaves the slot as it was and records the reason in
    /// the progress record.
    pub fn select_file(&mut self, file: CandidateFile) -> Result<(), AssetError> {
        if self.is_transferring() {
            return Err(AssetError::UploadInProgress);
        }

        if let Err(reason) = self.validator.validate_selection(&file) {
            self.progress = UploadProgress {
                percent_complete: 0,
                is_active: false,
                last_error: Some(reason.to_string()),
            };
            return Err(reason.into());
        }

        let superseded = match std::mem::take(&mut self.slot) {
            AssetSlot::Empty => None,
            AssetSlot::Persisted(reference) => Some(reference),
            AssetSlot::Pending(previous) => previous.superseded,
        };
        debug!(file = %file.name(), size = file.size(), "File selected");

        self.slot = AssetSlot::Pending(PendingAsset {
            file,
            preview: None,
            superseded,
        });
        self.progress = UploadProgress::default();
        Ok(())
    }

    /// Attach a preview to the pending file; ignored when nothing is pending
    pub fn attach_preview(&mut self, preview: Preview) {
        if let AssetSlot::Pending(pending) = &mut self.slot {
            pending.preview = Some(preview);
        }
    }

    /// Clear the pending file and any displayed reference.
    ///
    /// Does not delete anything remotely.
    pub fn remove_selection(&mut self) -> Result<(), AssetError> {
        if self.is_transferring() {
            return Err(AssetError::UploadInProgress);
        }
        self.slot = AssetSlot::Empty;
        self.progress = UploadProgress::default();
        Ok(())
    }

    /// Typed-in reference; refused while a file is pending
    pub fn set_manual_reference(&mut self, value: impl Into<String>) -> Result<(), AssetError> {
        if !self.manual_entry_enabled() {
            return Err(AssetError::ManualEntryDisabled);
        }
        self.slot = AssetSlot::from_reference(AssetReference::new(value.into().trim()));
        Ok(())
    }

    /// Replace the pending file with the reference its upload resolved to
    pub fn complete_upload(&mut self, reference: AssetReference) {
        self.slot = AssetSlot::from_reference(reference);
    }

    /// Drop the pending file after a failed or rejected upload.
    ///
    /// The superseded reference comes back and the progress record keeps the
    /// error. Returns the dropped file.
    pub fn abandon_pending(&mut self) -> Option<CandidateFile> {
        match std::mem::take(&mut self.slot) {
            AssetSlot::Pending(pending) => {
                self.slot = pending
                    .superseded
                    .map(AssetSlot::Persisted)
                    .unwrap_or_default();
                Some(pending.file)
            }
            other => {
                self.slot = other;
                None
            }
        }
    }
}

impl ProgressSink for AssetReferenceStore {
    fn publish(&mut self, progress: &UploadProgress) {
        self.progress = progress.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: usize = 1024 * 1024;

    fn jpeg(name: &str, size: usize) -> CandidateFile {
        CandidateFile::new(name, "image/jpeg", vec![0u8; size])
    }

    #[test]
    fn test_from_persisted() {
        let store = AssetReferenceStore::from_persisted(FileValidator::default(), "https://x/y.jpg");
        assert_eq!(store.current_reference().unwrap().as_str(), "https://x/y.jpg");
        assert!(store.manual_entry_enabled());

        let empty = AssetReferenceStore::from_persisted(FileValidator::default(), "  ");
        assert!(matches!(empty.slot(), AssetSlot::Empty));
    }

    #[test]
    fn test_select_supersedes_persisted_reference() {
        let mut store = AssetReferenceStore::from_persisted(FileValidator::default(), "https://x/y.jpg");
        store.select_file(jpeg("new.jpg", 4096)).unwrap();

        assert!(store.has_pending_file());
        assert_eq!(store.current_reference(), None);
        assert_eq!(store.pending_file().unwrap().name(), "new.jpg");
        assert!(!store.manual_entry_enabled());
        match store.slot() {
            AssetSlot::Pending(pending) => {
                assert_eq!(pending.superseded().unwrap().as_str(), "https://x/y.jpg")
            }
            other => panic!("unexpected slot {:?}", other),
        }
    }

    #[test]
    fn test_rejected_selection_keeps_slot() {
        let mut store = AssetReferenceStore::from_persisted(FileValidator::default(), "https://x/y.jpg");
        let err = store
            .select_file(CandidateFile::new("big.png", "image/png", vec![0u8; 10 * MIB]))
            .unwrap_err();

        assert!(matches!(err, AssetError::Rejected(RejectReason::TooLarge { .. })));
        assert_eq!(store.current_reference().unwrap().as_str(), "https://x/y.jpg");
        assert_eq!(
            store.progress(),
            &UploadProgress {
                percent_complete: 0,
                is_active: false,
                last_error: Some("exceeds maximum size".to_string()),
            }
        );
    }

    #[test]
    fn test_new_selection_resets_progress() {
        let mut store = AssetReferenceStore::default();
        store.publish(&UploadProgress {
            percent_complete: 60,
            is_active: false,
            last_error: Some("network connection lost".to_string()),
        });

        store.select_file(jpeg("retry.jpg", 4096)).unwrap();
        assert_eq!(store.progress(), &UploadProgress::default());
    }

    #[test]
    fn test_manual_reference_refused_while_pending() {
        let mut store = AssetReferenceStore::default();
        store.select_file(jpeg("a.jpg", 4096)).unwrap();

        assert_eq!(
            store.set_manual_reference("https://x/other.jpg"),
            Err(AssetError::ManualEntryDisabled)
        );
        assert!(store.has_pending_file());
    }

    #[test]
    fn test_manual_reference_accepted_without_pending_file() {
        let mut store = AssetReferenceStore::default();
        store.set_manual_reference(" https://x/typed.jpg ").unwrap();
        assert_eq!(store.current_reference().unwrap().as_str(), "https://x/typed.jpg");

        store.set_manual_reference("").unwrap();
        assert!(matches!(store.slot(), AssetSlot::Empty));
    }

    #[test]
    fn test_remove_selection_restores_manual_entry() {
        let mut store = AssetReferenceStore::from_persisted(FileValidator::default(), "https://x/y.jpg");
        store.select_file(jpeg("a.jpg", 4096)).unwrap();
        store.attach_preview(Preview::new("image/jpeg", "data:image/jpeg;base64,AAAA"));
        assert!(store.preview().is_some());

        store.remove_selection().unwrap();

        assert!(matches!(store.slot(), AssetSlot::Empty));
        assert_eq!(store.current_reference(), None);
        assert_eq!(store.preview(), None);
        assert_eq!(store.progress(), &UploadProgress::default());
        assert!(store.manual_entry_enabled());
    }

    #[test]
    fn test_selection_locked_while_transferring() {
        let mut store = AssetReferenceStore::default();
        store.select_file(jpeg("a.jpg", 4096)).unwrap();
        store.publish(&UploadProgress {
            percent_complete: 30,
            is_active: true,
            last_error: None,
        });

        assert_eq!(
            store.select_file(jpeg("b.jpg", 4096)),
            Err(AssetError::UploadInProgress)
        );
        assert_eq!(store.remove_selection(), Err(AssetError::UploadInProgress));
        assert_eq!(store.pending_file().unwrap().name(), "a.jpg");
    }

    #[test]
    fn test_complete_upload() {
        let mut store = AssetReferenceStore::default();
        store.select_file(jpeg("a.jpg", 4096)).unwrap();
        store.complete_upload(AssetReference::new("https://blobs.test/o/news%2F1_a.jpg?alt=media"));

        assert!(!store.has_pending_file());
        assert_eq!(
            store.current_reference().unwrap().as_str(),
            "https://blobs.test/o/news%2F1_a.jpg?alt=media"
        );
    }

    #[test]
    fn test_abandon_pending_restores_superseded() {
        let mut store = AssetReferenceStore::from_persisted(FileValidator::default(), "https://x/y.jpg");
        store.select_file(jpeg("a.jpg", 4096)).unwrap();
        store.publish(&UploadProgress {
            percent_complete: 60,
            is_active: false,
            last_error: Some("network connection lost".to_string()),
        });

        let dropped = store.abandon_pending().unwrap();

        assert_eq!(dropped.name(), "a.jpg");
        assert_eq!(store.current_reference().unwrap().as_str(), "https://x/y.jpg");
        assert_eq!(
            store.progress().last_error.as_deref(),
            Some("network connection lost")
        );
        assert!(store.abandon_pending().is_none());
    }
}

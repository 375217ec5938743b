//! Upload session
//!
//! Drives one candidate file through validation, transfer and locator
//! resolution. The session's state is an explicit [`UploadState`]; the
//! user-facing [`UploadProgress`] record is derived from it and published to a
//! [`ProgressSink`] on every transition.

use std::sync::Arc;

use lx_core::error::ErrorKind;
use lx_core::types::AssetCategory;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::model::{AssetReference, CandidateFile};
use crate::storage::{destination_path_now, BlobTransfer, TransferEvent};
use crate::validator::{FileValidator, RejectReason};

/// Shown when the backend failed without saying why
pub const GENERIC_TRANSFER_FAILURE: &str = "upload failed, please select the file and try again";

/// State of an upload session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    /// No candidate file held
    Idle,
    Validating,
    Transferring { percent: u8 },
    Succeeded { reference: AssetReference },
    Failed { message: String, percent: u8 },
    Rejected { reason: RejectReason },
}

impl UploadState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Transferring { .. } => "transferring",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
            Self::Rejected { .. } => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded { .. } | Self::Failed { .. } | Self::Rejected { .. }
        )
    }

    /// Progress record as the UI sees it
    pub fn progress(&self) -> UploadProgress {
        match self {
            Self::Idle | Self::Validating => UploadProgress::default(),
            Self::Transferring { percent } => UploadProgress {
                percent_complete: *percent,
                is_active: true,
                last_error: None,
            },
            Self::Succeeded { .. } => UploadProgress {
                percent_complete: 100,
                is_active: false,
                last_error: None,
            },
            Self::Failed { message, percent } => UploadProgress {
                percent_complete: *percent,
                is_active: false,
                last_error: Some(message.clone()),
            },
            Self::Rejected { reason } => UploadProgress {
                percent_complete: 0,
                is_active: false,
                last_error: Some(reason.to_string()),
            },
        }
    }
}

/// Transient progress record, one per session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgress {
    pub percent_complete: u8,
    pub is_active: bool,
    pub last_error: Option<String>,
}

/// Receives every progress update of a session
pub trait ProgressSink {
    fn publish(&mut self, progress: &UploadProgress);
}

/// Records the full history; handy for asserting on a session's lifetime
impl ProgressSink for Vec<UploadProgress> {
    fn publish(&mut self, progress: &UploadProgress) {
        self.push(progress.clone());
    }
}

/// Feeds UI observers holding a `watch::Receiver`
impl ProgressSink for watch::Sender<UploadProgress> {
    fn publish(&mut self, progress: &UploadProgress) {
        self.send_replace(progress.clone());
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("{0}")]
    Rejected(RejectReason),
    #[error("{message}")]
    Transfer { message: String, percent: u8 },
    #[error("an upload is already running in this session")]
    Busy,
}

impl UploadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UploadError::Rejected(_) | UploadError::Busy => ErrorKind::Validation,
            UploadError::Transfer { .. } => ErrorKind::Transfer,
        }
    }
}

/// `round(100 * transferred / total)`, clamped to `0..=100`
pub fn percent_complete(bytes_transferred: u64, total_bytes: u64) -> u8 {
    if total_bytes == 0 {
        return 0;
    }
    let ratio = bytes_transferred.min(total_bytes) as f64 / total_bytes as f64;
    (ratio * 100.0).round() as u8
}

/// Single-file, single-attempt upload
pub struct UploadSession<B: BlobTransfer> {
    transfer: Arc<B>,
    validator: FileValidator,
    category: AssetCategory,
    state: UploadState,
}

impl<B: BlobTransfer> UploadSession<B> {
    pub fn new(transfer: Arc<B>, validator: FileValidator, category: AssetCategory) -> Self {
        Self {
            transfer,
            validator,
            category,
            state: UploadState::Idle,
        }
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn progress(&self) -> UploadProgress {
        self.state.progress()
    }

    /// Validate, transfer and resolve `file`, publishing every transition
    #[instrument(
        skip(self, file, sink),
        fields(file = %file.name(), size = file.size(), category = %self.category)
    )]
    pub async fn run(
        &mut self,
        file: &CandidateFile,
        sink: &mut dyn ProgressSink,
    ) -> Result<AssetReference, UploadError> {
        if matches!(
            self.state,
            UploadState::Validating | UploadState::Transferring { .. }
        ) {
            return Err(UploadError::Busy);
        }

        self.transition(UploadState::Validating, sink);
        if let Err(reason) = self.validator.validate_upload(file) {
            warn!(reason = %reason, "Upload rejected");
            self.transition(
                UploadState::Rejected {
                    reason: reason.clone(),
                },
                sink,
            );
            return Err(UploadError::Rejected(reason));
        }

        let destination = destination_path_now(self.category, file.name());
        self.transition(UploadState::Transferring { percent: 0 }, sink);

        let mut handle = match self
            .transfer
            .begin_upload(file.data().clone(), &destination, file.media_type())
            .await
        {
            Ok(handle) => handle,
            Err(e) => return Err(self.fail(e.to_string(), sink)),
        };

        let location = loop {
            match handle.next_event().await {
                Some(TransferEvent::Progress {
                    bytes_transferred,
                    total_bytes,
                }) => {
                    let percent = percent_complete(bytes_transferred, total_bytes);
                    // never step backwards, never re-publish the same value
                    if percent > self.current_percent() {
                        debug!(percent, "Upload progress");
                        self.transition(UploadState::Transferring { percent }, sink);
                    }
                }
                Some(TransferEvent::Completed { location }) => break location,
                Some(TransferEvent::Failed { message }) => return Err(self.fail(message, sink)),
                None => {
                    return Err(self.fail(
                        "upload interrupted before completion".to_string(),
                        sink,
                    ))
                }
            }
        };

        match self.transfer.resolve_locator(&location).await {
            Ok(locator) => {
                let reference = AssetReference::new(locator);
                info!(
                    destination = %destination,
                    backend = self.transfer.name(),
                    "Upload succeeded"
                );
                self.transition(
                    UploadState::Succeeded {
                        reference: reference.clone(),
                    },
                    sink,
                );
                Ok(reference)
            }
            Err(e) => Err(self.fail(format!("could not resolve uploaded asset: {}", e), sink)),
        }
    }

    /// Abandon the session and reset progress.
    ///
    /// Nothing is sent to the blob store; a transfer that is already running
    /// is simply no longer observed.
    pub fn discard(&mut self, sink: &mut dyn ProgressSink) {
        self.transition(UploadState::Idle, sink);
    }

    fn current_percent(&self) -> u8 {
        match self.state {
            UploadState::Transferring { percent } | UploadState::Failed { percent, .. } => percent,
            UploadState::Succeeded { .. } => 100,
            _ => 0,
        }
    }

    fn fail(&mut self, message: String, sink: &mut dyn ProgressSink) -> UploadError {
        let message = if message.trim().is_empty() {
            GENERIC_TRANSFER_FAILURE.to_string()
        } else {
            message
        };
        let percent = self.current_percent();
        warn!(error = %message, percent, "Upload failed");

        self.transition(
            UploadState::Failed {
                message: message.clone(),
                percent,
            },
            sink,
        );
        UploadError::Transfer { message, percent }
    }

    fn transition(&mut self, next: UploadState, sink: &mut dyn ProgressSink) {
        self.state = next;
        sink.publish(&self.state.progress());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::AssetLocator;
    use crate::storage::{FailurePlan, MemoryBlobStore, TransferResult, UploadHandle};
    use async_trait::async_trait;
    use bytes::Bytes;

    const MIB: usize = 1024 * 1024;

    /// Backend that replays a fixed list of events
    struct ScriptedTransfer {
        events: Vec<TransferEvent>,
    }

    #[async_trait]
    impl BlobTransfer for ScriptedTransfer {
        async fn begin_upload(
            &self,
            _data: Bytes,
            destination: &str,
            _content_type: &str,
        ) -> TransferResult<UploadHandle> {
            let (handle, tx) = UploadHandle::channel(destination);
            for event in &self.events {
                let _ = tx.send(event.clone());
            }
            Ok(handle)
        }

        async fn resolve_locator(&self, location: &str) -> TransferResult<String> {
            Ok(AssetLocator::format(self.base_url(), location))
        }

        async fn delete(&self, _path: &str) -> TransferResult<()> {
            Ok(())
        }

        async fn exists(&self, _path: &str) -> TransferResult<bool> {
            Ok(true)
        }

        fn base_url(&self) -> &str {
            "https://blobs.test"
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn jpeg(size: usize) -> CandidateFile {
        CandidateFile::new("photo.jpg", "image/jpeg", vec![0u8; size])
    }

    fn progress_events(total: u64, percents: &[u64]) -> Vec<TransferEvent> {
        percents
            .iter()
            .map(|p| TransferEvent::Progress {
                bytes_transferred: total * p / 100,
                total_bytes: total,
            })
            .collect()
    }

    fn session<B: BlobTransfer>(transfer: B) -> UploadSession<B> {
        UploadSession::new(
            Arc::new(transfer),
            FileValidator::default(),
            AssetCategory::News,
        )
    }

    #[test]
    fn test_percent_complete_rounds() {
        assert_eq!(percent_complete(0, 1000), 0);
        assert_eq!(percent_complete(1, 3), 33);
        assert_eq!(percent_complete(2, 3), 67);
        assert_eq!(percent_complete(1000, 1000), 100);
        assert_eq!(percent_complete(2000, 1000), 100);
        assert_eq!(percent_complete(5, 0), 0);
    }

    #[tokio::test]
    async fn test_successful_upload_publishes_progress() {
        let total = 2_000_000u64;
        let mut events = progress_events(total, &[0, 40, 100]);
        events.push(TransferEvent::Completed {
            location: "news/1_photo.jpg".to_string(),
        });
        let mut session = session(ScriptedTransfer { events });
        let mut history: Vec<UploadProgress> = Vec::new();

        let reference = session.run(&jpeg(total as usize), &mut history).await.unwrap();

        assert_eq!(reference.as_str(), "https://blobs.test/o/news%2F1_photo.jpg?alt=media");
        assert_eq!(
            session.state(),
            &UploadState::Succeeded {
                reference: reference.clone()
            }
        );
        let percents: Vec<(u8, bool)> = history
            .iter()
            .map(|p| (p.percent_complete, p.is_active))
            .collect();
        assert_eq!(
            percents,
            vec![(0, false), (0, true), (40, true), (100, true), (100, false)]
        );
        assert_eq!(history.last().unwrap().last_error, None);
    }

    #[tokio::test]
    async fn test_progress_never_decreases() {
        let total = 10_000u64;
        let mut events = progress_events(total, &[10, 50, 30, 50, 90, 70]);
        events.push(TransferEvent::Completed {
            location: "news/1_photo.jpg".to_string(),
        });
        let mut session = session(ScriptedTransfer { events });
        let mut history: Vec<UploadProgress> = Vec::new();

        session.run(&jpeg(total as usize), &mut history).await.unwrap();

        let active: Vec<u8> = history
            .iter()
            .filter(|p| p.is_active)
            .map(|p| p.percent_complete)
            .collect();
        assert_eq!(active, vec![0, 10, 50, 90]);
        assert!(active.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_oversized_file_rejected_before_transfer() {
        let store = MemoryBlobStore::new();
        let mut session = session(store);
        let png = CandidateFile::new("scan.png", "image/png", vec![0u8; 10 * MIB]);
        let mut history: Vec<UploadProgress> = Vec::new();

        let err = session.run(&png, &mut history).await.unwrap_err();

        assert!(matches!(err, UploadError::Rejected(RejectReason::TooLarge { .. })));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(session.transfer.uploads_started(), 0);
        assert_eq!(
            history.last(),
            Some(&UploadProgress {
                percent_complete: 0,
                is_active: false,
                last_error: Some("exceeds maximum size".to_string()),
            })
        );
    }

    #[tokio::test]
    async fn test_tiny_file_rejected_at_upload_time() {
        let mut session = session(MemoryBlobStore::new());
        let mut history: Vec<UploadProgress> = Vec::new();

        let err = session.run(&jpeg(512), &mut history).await.unwrap_err();
        assert_eq!(err.to_string(), "file is empty or corrupted");
        assert!(matches!(session.state(), UploadState::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_failure_event_keeps_last_percent() {
        let total = 100_000u64;
        let mut events = progress_events(total, &[0, 30, 60]);
        events.push(TransferEvent::Failed {
            message: "network connection lost".to_string(),
        });
        let mut session = session(ScriptedTransfer { events });
        let mut history: Vec<UploadProgress> = Vec::new();

        let err = session.run(&jpeg(total as usize), &mut history).await.unwrap_err();

        assert_eq!(
            err,
            UploadError::Transfer {
                message: "network connection lost".to_string(),
                percent: 60
            }
        );
        assert_eq!(err.kind(), ErrorKind::Transfer);
        assert_eq!(
            history.last(),
            Some(&UploadProgress {
                percent_complete: 60,
                is_active: false,
                last_error: Some("network connection lost".to_string()),
            })
        );
    }

    #[tokio::test]
    async fn test_blank_failure_message_gets_fallback() {
        let store = MemoryBlobStore::new().with_failure(FailurePlan {
            fail_at_percent: Some(50),
            ..FailurePlan::default()
        });
        let mut session = session(store);
        let mut history: Vec<UploadProgress> = Vec::new();

        let err = session.run(&jpeg(4096), &mut history).await.unwrap_err();
        assert_eq!(err.to_string(), GENERIC_TRANSFER_FAILURE);
    }

    #[tokio::test]
    async fn test_resolution_failure_is_upload_failure() {
        let store = MemoryBlobStore::new().with_failure(FailurePlan {
            fail_resolution: true,
            ..FailurePlan::default()
        });
        let mut session = session(store);
        let mut history: Vec<UploadProgress> = Vec::new();

        let err = session.run(&jpeg(4096), &mut history).await.unwrap_err();

        assert!(matches!(err, UploadError::Transfer { percent: 100, .. }));
        assert!(err.to_string().starts_with("could not resolve uploaded asset"));
        // bytes did land in the store
        assert_eq!(session.transfer.object_paths().await.len(), 1);
        assert!(matches!(session.state(), UploadState::Failed { .. }));
    }

    #[tokio::test]
    async fn test_stream_closed_without_terminal_event() {
        let total = 10_000u64;
        let events = progress_events(total, &[0, 20]);
        let mut session = session(ScriptedTransfer { events });
        let mut history: Vec<UploadProgress> = Vec::new();

        let err = session.run(&jpeg(total as usize), &mut history).await.unwrap_err();
        assert_eq!(
            err,
            UploadError::Transfer {
                message: "upload interrupted before completion".to_string(),
                percent: 20
            }
        );
    }

    #[tokio::test]
    async fn test_discard_resets_progress() {
        let mut session = session(MemoryBlobStore::new());
        let (mut tx, rx) = watch::channel(UploadProgress::default());

        session.run(&jpeg(4096), &mut tx).await.unwrap();
        assert_eq!(rx.borrow().percent_complete, 100);

        session.discard(&mut tx);
        assert_eq!(session.state(), &UploadState::Idle);
        assert_eq!(*rx.borrow(), UploadProgress::default());
    }

    #[tokio::test]
    async fn test_upload_goes_to_category_folder() {
        let mut session = session(MemoryBlobStore::new());
        let mut history: Vec<UploadProgress> = Vec::new();
        let file = CandidateFile::new("Court ruling.png", "image/png", vec![0u8; 4096]);

        session.run(&file, &mut history).await.unwrap();

        let paths = session.transfer.object_paths().await;
        assert_eq!(paths.len(), 1);
        assert!(paths[0].starts_with("news/"));
        assert!(paths[0].ends_with("_Court_ruling.png"));
    }
}

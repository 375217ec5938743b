//! Candidate file validation
//!
//! Pure checks over a file's declared media type and size. Rules run in
//! order and the first failure wins.

use std::path::Path;

use lx_core::config::AssetConfig;
use lx_core::error::ErrorKind;
use thiserror::Error;

use crate::model::{CandidateFile, FileHeader};

/// Why a candidate file was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("not an image type")]
    NotAnImage { media_type: String },
    #[error("exceeds maximum size")]
    TooLarge { size: u64, max: u64 },
    #[error("file is empty or corrupted")]
    EmptyOrCorrupted { size: u64, min: u64 },
}

impl RejectReason {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Why a local file could not be loaded as a candidate
#[derive(Debug, Error)]
pub enum ReadFileError {
    #[error(transparent)]
    Rejected(#[from] RejectReason),
    #[error("cannot read file: {0}")]
    Io(#[from] std::io::Error),
}

impl ReadFileError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Size and type limits for candidate files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileValidator {
    accepted_family: String,
    max_bytes: u64,
    min_bytes: u64,
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::new(&AssetConfig::default())
    }
}

impl FileValidator {
    pub fn new(config: &AssetConfig) -> Self {
        Self {
            accepted_family: config.accepted_family.clone(),
            max_bytes: config.max_upload_bytes,
            min_bytes: config.min_upload_bytes,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn min_bytes(&self) -> u64 {
        self.min_bytes
    }

    /// Checks run when the user picks a file (no minimum size)
    pub fn validate_selection(&self, file: &CandidateFile) -> Result<(), RejectReason> {
        self.check_family(file.media_type())?;
        self.check_max(file.size())
    }

    /// Checks run right before transfer
    pub fn validate_upload(&self, file: &CandidateFile) -> Result<(), RejectReason> {
        self.validate_selection(file)?;
        if file.size() < self.min_bytes {
            return Err(RejectReason::EmptyOrCorrupted {
                size: file.size(),
                min: self.min_bytes,
            });
        }
        Ok(())
    }

    /// Selection checks on file metadata alone
    pub fn validate_header(&self, header: &FileHeader) -> Result<(), RejectReason> {
        self.check_family(header.media_type())?;
        self.check_max(header.size())
    }

    /// Load a local file, refusing it on its metadata before reading any bytes
    pub async fn read_file(&self, path: impl AsRef<Path>) -> Result<CandidateFile, ReadFileError> {
        let header = FileHeader::inspect(path).await?;
        self.read_header(header).await
    }

    /// Load an inspected file, refusing it before reading if it fails selection
    pub async fn read_header(&self, header: FileHeader) -> Result<CandidateFile, ReadFileError> {
        self.validate_header(&header)?;
        let file = header.read(self.max_bytes).await?;
        self.check_max(file.size())?;
        Ok(file)
    }

    fn check_family(&self, media_type: &str) -> Result<(), RejectReason> {
        let accepted = media_type
            .parse::<mime::Mime>()
            .map(|m| m.type_().as_str().eq_ignore_ascii_case(&self.accepted_family))
            .unwrap_or(false);

        if accepted {
            Ok(())
        } else {
            Err(RejectReason::NotAnImage {
                media_type: media_type.to_string(),
            })
        }
    }

    fn check_max(&self, size: u64) -> Result<(), RejectReason> {
        if size > self.max_bytes {
            return Err(RejectReason::TooLarge {
                size,
                max: self.max_bytes,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: usize = 1024 * 1024;

    fn file(media_type: &str, size: usize) -> CandidateFile {
        CandidateFile::new("file", media_type, vec![0u8; size])
    }

    #[test]
    fn test_non_image_types_rejected() {
        let validator = FileValidator::default();
        for media_type in ["application/pdf", "text/plain", "video/mp4", "", "garbage"] {
            let result = validator.validate_selection(&file(media_type, 2048));
            assert!(
                matches!(result, Err(RejectReason::NotAnImage { .. })),
                "media type {:?}",
                media_type
            );
            assert_eq!(result.unwrap_err().to_string(), "not an image type");
        }
    }

    #[test]
    fn test_image_types_accepted() {
        let validator = FileValidator::default();
        for media_type in ["image/jpeg", "image/png", "image/webp", "image/svg+xml"] {
            assert!(validator.validate_selection(&file(media_type, 2048)).is_ok());
        }
    }

    #[test]
    fn test_type_rule_wins_over_size_rule() {
        let validator = FileValidator::default();
        let result = validator.validate_selection(&file("application/zip", 10 * MIB));
        assert!(matches!(result, Err(RejectReason::NotAnImage { .. })));
    }

    #[test]
    fn test_oversized_rejected() {
        let validator = FileValidator::default();
        let result = validator.validate_selection(&file("image/png", 10 * MIB));
        assert_eq!(
            result,
            Err(RejectReason::TooLarge {
                size: 10 * MIB as u64,
                max: 5 * MIB as u64
            })
        );
        assert_eq!(result.unwrap_err().to_string(), "exceeds maximum size");

        // exactly at the limit is fine
        assert!(validator.validate_selection(&file("image/png", 5 * MIB)).is_ok());
    }

    #[test]
    fn test_minimum_size_only_at_upload_time() {
        let validator = FileValidator::default();
        let tiny = file("image/jpeg", 100);

        assert!(validator.validate_selection(&tiny).is_ok());

        let result = validator.validate_upload(&tiny);
        assert!(matches!(result, Err(RejectReason::EmptyOrCorrupted { .. })));
        assert_eq!(result.unwrap_err().to_string(), "file is empty or corrupted");

        assert!(validator.validate_upload(&file("image/jpeg", 1024)).is_ok());
    }

    #[test]
    fn test_custom_limits() {
        let config = AssetConfig {
            max_upload_bytes: 4096,
            min_upload_bytes: 16,
            ..AssetConfig::default()
        };
        let validator = FileValidator::new(&config);

        assert!(validator.validate_upload(&file("image/gif", 4096)).is_ok());
        assert!(validator.validate_upload(&file("image/gif", 4097)).is_err());
        assert_eq!(validator.max_bytes(), 4096);
        assert_eq!(validator.min_bytes(), 16);
    }

    #[tokio::test]
    async fn test_oversized_file_refused_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        let sparse = std::fs::File::create(&path).unwrap();
        sparse.set_len(8 * 1024 * MIB as u64).unwrap();

        let err = FileValidator::default().read_file(&path).await.unwrap_err();

        assert!(matches!(
            err,
            ReadFileError::Rejected(RejectReason::TooLarge { size, .. }) if size == 8 * 1024 * MIB as u64
        ));
        assert_eq!(err.to_string(), "exceeds maximum size");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_read_file_checks_type_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brief.pdf");
        std::fs::File::create(&path)
            .unwrap()
            .set_len(10 * MIB as u64)
            .unwrap();

        let err = FileValidator::default().read_file(&path).await.unwrap_err();
        assert!(matches!(
            err,
            ReadFileError::Rejected(RejectReason::NotAnImage { .. })
        ));
    }

    #[tokio::test]
    async fn test_read_file_within_limits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portrait.jpg");
        std::fs::write(&path, vec![4u8; 2048]).unwrap();

        let file = FileValidator::default().read_file(&path).await.unwrap();
        assert_eq!(file.media_type(), "image/jpeg");
        assert_eq!(file.size(), 2048);

        let missing = FileValidator::default()
            .read_file(dir.path().join("gone.jpg"))
            .await;
        assert!(matches!(missing, Err(ReadFileError::Io(_))));
    }
}

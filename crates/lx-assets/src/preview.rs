//! Local previews
//!
//! Previews never touch the network. A failed preview only degrades the UI;
//! the selection and the later upload go ahead regardless.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use lx_core::config::AssetConfig;
use lx_core::error::ErrorKind;
use thiserror::Error;
use tracing::debug;

use crate::model::CandidateFile;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreviewError {
    #[error("file is empty")]
    Empty,
    #[error("file too large to preview: {size} bytes (max: {max} bytes)")]
    TooLarge { size: u64, max: u64 },
    #[error("preview generation failed: {0}")]
    Failed(String),
}

impl PreviewError {
    /// Previews are local; a failure never involves the network
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Locally renderable representation of a selected file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    media_type: String,
    data_uri: String,
}

impl Preview {
    pub fn new(media_type: impl Into<String>, data_uri: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            data_uri: data_uri.into(),
        }
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }
}

/// Produces a preview for a candidate file
#[async_trait]
pub trait PreviewGenerator: Send + Sync {
    async fn generate(&self, file: &CandidateFile) -> Result<Preview, PreviewError>;
}

/// Encodes the file as a `data:` URI
#[derive(Debug, Clone)]
pub struct DataUriPreviewGenerator {
    max_bytes: u64,
}

impl Default for DataUriPreviewGenerator {
    fn default() -> Self {
        Self::new(&AssetConfig::default())
    }
}

impl DataUriPreviewGenerator {
    pub fn new(config: &AssetConfig) -> Self {
        Self {
            max_bytes: config.max_preview_bytes,
        }
    }
}

#[async_trait]
impl PreviewGenerator for DataUriPreviewGenerator {
    async fn generate(&self, file: &CandidateFile) -> Result<Preview, PreviewError> {
        if file.size() == 0 {
            return Err(PreviewError::Empty);
        }
        if file.size() > self.max_bytes {
            return Err(PreviewError::TooLarge {
                size: file.size(),
                max: self.max_bytes,
            });
        }

        let data = file.data().clone();
        let encoded = tokio::task::spawn_blocking(move || general_purpose::STANDARD.encode(&data))
            .await
            .map_err(|e| PreviewError::Failed(e.to_string()))?;

        debug!(file = %file.name(), encoded_len = encoded.len(), "Preview generated");

        let data_uri = format!("data:{};base64,{}", file.media_type(), encoded);
        Ok(Preview::new(file.media_type(), data_uri))
    }
}

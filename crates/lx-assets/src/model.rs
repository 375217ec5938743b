//! Asset model
//!
//! A [`CandidateFile`] lives between selection and upload; an
//! [`AssetReference`] is what the form keeps once the bytes are stored.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;

/// A user-selected local file that has not been uploaded yet
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFile {
    name: String,
    media_type: String,
    data: Bytes,
}

impl CandidateFile {
    /// Create a candidate from its declared media type and raw bytes
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            data: data.into(),
        }
    }

    /// Display name, as chosen by the user
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared media type, e.g. `image/jpeg`
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Human-readable file size
    pub fn human_size(&self) -> String {
        human_size(self.size())
    }
}

/// A local file as seen through its metadata, before any byte is read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    path: PathBuf,
    name: String,
    media_type: String,
    size: u64,
}

impl FileHeader {
    /// Stat `path`, guessing the media type from its extension
    pub async fn inspect(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();

        Ok(Self {
            path: path.to_path_buf(),
            name,
            media_type,
            size: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Size reported by the filesystem
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn human_size(&self) -> String {
        human_size(self.size)
    }

    /// Read the contents, stopping one byte past `limit`.
    ///
    /// A file that grew since it was inspected comes back with `limit + 1`
    /// bytes, which still fails the size check.
    pub async fn read(self, limit: u64) -> io::Result<CandidateFile> {
        let cap = limit.saturating_add(1);
        let file = tokio::fs::File::open(&self.path).await?;
        let mut data = Vec::with_capacity(self.size.min(cap) as usize);
        file.take(cap).read_to_end(&mut data).await?;

        Ok(CandidateFile::new(self.name, self.media_type, data))
    }
}

fn human_size(bytes: u64) -> String {
    let size = bytes as f64;
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    if size == 0.0 {
        return "0 B".to_string();
    }

    let base = 1024.0_f64;
    let i = (size.ln() / base.ln()).floor() as usize;
    let i = i.min(UNITS.len() - 1);

    let value = size / base.powi(i as i32);
    format!("{:.1} {}", value, UNITS[i])
}

/// Stable locator of a stored asset, or empty
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetReference(String);

impl AssetReference {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for AssetReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AssetReference {
    fn from(locator: String) -> Self {
        Self(locator)
    }
}

impl From<&str> for AssetReference {
    fn from(locator: &str) -> Self {
        Self(locator.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_metadata() {
        let file = CandidateFile::new("photo.jpg", "image/jpeg", vec![0u8; 2048]);
        assert_eq!(file.name(), "photo.jpg");
        assert_eq!(file.media_type(), "image/jpeg");
        assert_eq!(file.size(), 2048);
    }

    #[test]
    fn test_human_size() {
        let cases = [
            (0usize, "0 B"),
            (512, "512.0 B"),
            (1536, "1.5 KB"),
            (2 * 1024 * 1024, "2.0 MB"),
        ];

        for (size, expected) in cases {
            let file = CandidateFile::new("f", "image/png", vec![0u8; size]);
            assert_eq!(file.human_size(), expected, "Size: {}", size);
        }
    }

    #[tokio::test]
    async fn test_inspect_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portrait.png");
        tokio::fs::write(&path, vec![7u8; 4096]).await.unwrap();

        let header = FileHeader::inspect(&path).await.unwrap();
        assert_eq!(header.name(), "portrait.png");
        assert_eq!(header.media_type(), "image/png");
        assert_eq!(header.size(), 4096);
        assert_eq!(header.human_size(), "4.0 KB");

        let file = header.read(8192).await.unwrap();
        assert_eq!(file.name(), "portrait.png");
        assert_eq!(file.size(), 4096);
    }

    #[tokio::test]
    async fn test_read_stops_past_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.jpg");
        tokio::fs::write(&path, vec![1u8; 10_000]).await.unwrap();

        let file = FileHeader::inspect(&path).await.unwrap().read(100).await.unwrap();
        assert_eq!(file.size(), 101);
    }

    #[tokio::test]
    async fn test_inspect_directory_refused() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileHeader::inspect(dir.path()).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_reference_emptiness() {
        assert!(AssetReference::default().is_empty());
        assert!(AssetReference::new("   ").is_empty());
        let reference = AssetReference::from("https://x/y.jpg");
        assert!(!reference.is_empty());
        assert_eq!(reference.to_string(), "https://x/y.jpg");
    }
}

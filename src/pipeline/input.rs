//! Input resolution: turn a user-supplied path or URL into an [`UploadedFile`].
//!
//! The declared type comes from the file name's extension, as it would for an
//! upload form. URL inputs whose last path segment has no usable extension
//! fall back to sniffing the magic bytes.

use crate::error::OcrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Declared type of an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Png,
    Jpg,
    Jpeg,
}

impl FileKind {
    /// Map a file name to its kind by extension, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(FileKind::Pdf),
            "png" => Some(FileKind::Png),
            "jpg" => Some(FileKind::Jpg),
            "jpeg" => Some(FileKind::Jpeg),
            _ => None,
        }
    }

    /// Guess the kind from the first bytes of the content.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF") {
            Some(FileKind::Pdf)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
            Some(FileKind::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(FileKind::Jpeg)
        } else {
            None
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Png => "png",
            FileKind::Jpg => "jpg",
            FileKind::Jpeg => "jpeg",
        }
    }

    pub fn is_pdf(self) -> bool {
        matches!(self, FileKind::Pdf)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One input file: name, raw content and declared type. Immutable once built.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    name: String,
    bytes: Vec<u8>,
    kind: FileKind,
}

impl UploadedFile {
    /// Build from a file name and its bytes; the kind comes from the extension.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, OcrError> {
        let name = name.into();
        let kind = FileKind::from_name(&name)
            .ok_or_else(|| OcrError::UnsupportedFileType { name: name.clone() })?;
        Ok(Self { name, bytes, kind })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a local path or an HTTP(S) URL into an [`UploadedFile`].
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<UploadedFile, OcrError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

async fn read_local(path: &Path) -> Result<UploadedFile, OcrError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    // Reject by extension before reading a potentially large file.
    if FileKind::from_name(&name).is_none() {
        return Err(OcrError::UnsupportedFileType { name });
    }

    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => OcrError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => OcrError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => OcrError::Internal(format!("Failed to read '{}': {}", path.display(), e)),
    })?;

    debug!("Read {} ({} bytes)", path.display(), bytes.len());
    UploadedFile::new(name, bytes)
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<UploadedFile, OcrError> {
    info!("Downloading input from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| OcrError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            OcrError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            OcrError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(OcrError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| OcrError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?
        .to_vec();

    let name = filename_for(url, &bytes)?;
    info!("Downloaded {} ({} bytes)", name, bytes.len());
    UploadedFile::new(name, bytes)
}

/// Name a downloaded file after the URL's last path segment, adding an
/// extension from the content when the segment has none we accept.
fn filename_for(url: &str, bytes: &[u8]) -> Result<String, OcrError> {
    let segment = reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "downloaded".to_string());

    if FileKind::from_name(&segment).is_some() {
        return Ok(segment);
    }
    match FileKind::sniff(bytes) {
        Some(kind) => Ok(format!("{segment}.{}", kind.extension())),
        None => Err(OcrError::UnsupportedFileType { name: segment }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/scan.png"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn kind_from_extension_is_case_insensitive() {
        assert_eq!(FileKind::from_name("doc.PDF"), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_name("scan.png"), Some(FileKind::Png));
        assert_eq!(FileKind::from_name("note.Jpg"), Some(FileKind::Jpg));
        assert_eq!(FileKind::from_name("photo.jpeg"), Some(FileKind::Jpeg));
        assert_eq!(FileKind::from_name("archive.tar.gz"), None);
        assert_eq!(FileKind::from_name("README"), None);
    }

    #[test]
    fn sniff_magic_bytes() {
        assert_eq!(FileKind::sniff(b"%PDF-1.7"), Some(FileKind::Pdf));
        assert_eq!(
            FileKind::sniff(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A]),
            Some(FileKind::Png)
        );
        assert_eq!(FileKind::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(FileKind::Jpeg));
        assert_eq!(FileKind::sniff(b"hello"), None);
    }

    #[test]
    fn uploaded_file_rejects_unknown_extension() {
        let err = UploadedFile::new("notes.txt", vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, OcrError::UnsupportedFileType { .. }));
    }

    #[test]
    fn filename_for_url_with_and_without_extension() {
        assert_eq!(
            filename_for("https://example.com/files/scan.png", b"").unwrap(),
            "scan.png"
        );
        assert_eq!(
            filename_for("https://example.com/download/42", b"%PDF-1.4").unwrap(),
            "42.pdf"
        );
        assert!(filename_for("https://example.com/x", b"plain").is_err());
    }

    #[tokio::test]
    async fn missing_local_file_is_reported() {
        let err = resolve_input("/definitely/not/here/scan.png", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::FileNotFound { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn local_file_is_read_with_its_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.JPG");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF]).unwrap();

        let file = resolve_input(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(file.name(), "note.JPG");
        assert_eq!(file.kind(), FileKind::Jpg);
        assert_eq!(file.bytes(), &[0xFF, 0xD8, 0xFF]);
    }
}

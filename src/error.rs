//! Error types for the ocr-enhance library.
//!
//! Errors are split by how far they reach:
//!
//! * [`OcrError`]: **fatal** for a run. A path that does not exist, an
//!   unsupported file type, an invalid configuration or an output file that
//!   cannot be written. Returned as `Err(OcrError)` from top-level functions.
//!
//! * [`ExtractionError`]: a single file could not be turned into text.
//!   Stored in [`crate::output::FileReport`]; the other files keep going.
//!
//! * [`EnhancementError`]: the LLM clean-up step was skipped or failed for a
//!   file. The raw OCR text is still reported.
//!
//! * [`LlmError`]: transport-level failure of a [`crate::pipeline::llm::CompletionClient`].
//!   Folded into [`EnhancementError::Api`] before it reaches a report.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors returned by the ocr-enhance library.
#[derive(Debug, Error)]
pub enum OcrError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Extension is not one of pdf, png, jpg, jpeg.
    #[error("Unsupported file type '{name}'\nAccepted extensions: pdf, png, jpg, jpeg.")]
    UnsupportedFileType { name: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output text file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation or value parsing failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a file produced no text.
///
/// Every variant is reported to the user; none of them aborts the run.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum ExtractionError {
    /// PDF rasterisation is not available in this build or environment.
    #[error(
        "PDF support is not available: {reason}\n\
- Install pdfium and set PDFIUM_LIB_PATH=/path/to/libpdfium, or put it on the library path.\n\
- Builds without the `pdf` feature cannot read PDFs at all; rebuild with `--features pdf`.\n\n\
Image files (PNG/JPG/JPEG) can still be processed."
    )]
    RasterizerUnavailable { reason: String },

    /// The Tesseract binary could not be started.
    #[error(
        "OCR engine '{command}' could not be started: {detail}\n\
Install tesseract with the 'vie' and 'eng' language packs, or point TESSERACT_CMD at the binary."
    )]
    OcrEngineMissing { command: String, detail: String },

    /// Image bytes could not be decoded.
    #[error("Failed to decode image: {detail}")]
    DecodeFailed { detail: String },

    /// The PDF could not be opened or a page could not be rendered.
    #[error("Failed to render PDF: {detail}")]
    RenderFailed { detail: String },

    /// The OCR engine ran but reported an error.
    #[error("Recognition failed{}: {detail}", page_suffix(.page))]
    RecognitionFailed { page: Option<usize>, detail: String },
}

fn page_suffix(page: &Option<usize>) -> String {
    page.map(|p| format!(" on page {p}")).unwrap_or_default()
}

/// Why the LLM clean-up did not produce text.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum EnhancementError {
    /// No API key in the session and none in the environment.
    #[error(
        "OpenAI API key is not configured.\n\
Pass --api-key or set OPENAI_API_KEY to enable text enhancement."
    )]
    MissingCredential,

    /// The completion call failed. Single attempt, never retried.
    #[error("OpenAI call failed: {detail}")]
    Api { detail: String },
}

/// Transport-level errors from a completion client.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Request could not be sent or the body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

impl From<LlmError> for EnhancementError {
    fn from(e: LlmError) -> Self {
        EnhancementError::Api {
            detail: e.to_string(),
        }
    }
}

//! # ocr-enhance
//!
//! Extract text from scanned PDFs and images with Tesseract, then optionally
//! let an LLM fix what OCR gets wrong in Vietnamese/English documents:
//! missing diacritics, confusable characters, spelling and broken paragraphs.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file (path or URL)
//!  │
//!  ├─ 1. Input     read bytes, declared type from the extension
//!  ├─ 2. Render    PDF only: rasterise each page via pdfium
//!  ├─ 3. OCR       tesseract --oem 1 --psm 6, pages joined with "--- Hết trang ---"
//!  ├─ 4. Enhance   optional: one chat-completion call per file
//!  ├─ 5. Polish    strip a code fence the model may wrap its reply in
//!  └─ 6. Output    FileReport + ket_qua_*.txt artifacts
//! ```
//!
//! Extraction results are memoised per session: the same bytes, extension
//! and language are recognised once.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ocr_enhance::{resolve_input, OcrConfig, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential seeded from OPENAI_API_KEY
//!     let config = OcrConfig::builder().enhance(true).build()?;
//!     let mut pipeline = Pipeline::new(config);
//!
//!     let file = resolve_input("scan.png", 120).await?;
//!     let report = pipeline.process_file(&file).await;
//!     if let Some(warning) = report.warning() {
//!         eprintln!("{warning}");
//!     }
//!     println!("{}", report.enhanced().or(report.raw_text.as_deref()).unwrap_or(""));
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ocr-enhance` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `pdf`   | on      | PDF input through pdfium-render; images work without it |
//!
//! ```toml
//! ocr-enhance = { version = "0.1", default-features = false, features = ["pdf"] }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cache;
pub mod config;
pub mod credential;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cache::ExtractionCache;
pub use config::{EnhancementLevel, Language, Model, OcrConfig, OcrConfigBuilder};
pub use credential::Credential;
pub use error::{EnhancementError, ExtractionError, LlmError, OcrError};
pub use output::{preview, Artifact, Comparison, FileReport, TextStats, PREVIEW_CHARS};
pub use pipeline::enhance::{enhance, EnhancementRequest};
pub use pipeline::extract::{Extractor, PAGE_BREAK};
pub use pipeline::input::{resolve_input, FileKind, UploadedFile};
pub use pipeline::llm::{CompletionClient, CompletionRequest, OpenAiClient};
pub use pipeline::ocr::{OcrEngine, TesseractEngine};
pub use pipeline::render::{PageRasterizer, PdfSupport};
pub use process::{diagnose, write_reports, Diagnostics, Pipeline};
pub use progress::{NoopProgressCallback, OcrProgressCallback, ProgressCallback};

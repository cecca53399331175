//! Pipeline stages for OCR extraction and LLM enhancement.
//!
//! Each submodule implements one step, and the external engines sit behind
//! traits ([`ocr::OcrEngine`], [`render::PageRasterizer`],
//! [`llm::CompletionClient`]) so each stage can be tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ ocr ──▶ extract ──▶ enhance ──▶ postprocess
//! (path/URL) (pdfium) (tesseract) (join+cache) (LLM)   (fence strip)
//! ```
//!
//! 1. [`input`]  : read a local file or download a URL; classify by extension
//! 2. [`render`] : PDF pages to images; optional, reported when unavailable
//! 3. [`ocr`]    : one image to text with the fixed Tesseract configuration
//! 4. [`extract`]: dispatch by file kind, join pages, memoise results
//! 5. [`enhance`]: build prompts and make the single completion call via [`llm`]
//! 6. [`postprocess`]: normalise OCR output, strip fences from replies

pub mod enhance;
pub mod extract;
pub mod input;
pub mod llm;
pub mod ocr;
pub mod postprocess;
pub mod render;

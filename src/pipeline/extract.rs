//! Extraction dispatcher: file bytes + declared type + language → text.
//!
//! PDFs are rasterised and recognised page by page, then joined with
//! [`PAGE_BREAK`]. Images are decoded once and recognised once. Every
//! failure comes back as an [`ExtractionError`] value.
//!
//! Results are memoised in an [`ExtractionCache`]: the same bytes, extension
//! and language are recognised at most once per cache lifetime.

use crate::cache::ExtractionCache;
use crate::config::{Language, OcrConfig};
use crate::error::ExtractionError;
use crate::pipeline::input::FileKind;
use crate::pipeline::ocr::{OcrEngine, TesseractEngine};
use crate::pipeline::render::PdfSupport;
use crate::progress::ProgressCallback;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Separator placed between the text of consecutive PDF pages.
pub const PAGE_BREAK: &str = "\n\n--- Hết trang ---\n\n";

/// Runs OCR on uploaded files and remembers what it has already read.
pub struct Extractor {
    engine: Arc<dyn OcrEngine>,
    pdf: PdfSupport,
    cache: ExtractionCache,
    progress: Option<ProgressCallback>,
}

impl Extractor {
    pub fn new(engine: Arc<dyn OcrEngine>, pdf: PdfSupport, cache_capacity_bytes: usize) -> Self {
        Self {
            engine,
            pdf,
            cache: ExtractionCache::new(cache_capacity_bytes),
            progress: None,
        }
    }

    /// Tesseract engine and pdfium rasteriser as configured.
    pub fn from_config(config: &OcrConfig) -> Self {
        let engine = TesseractEngine::resolve(config.tesseract_cmd.as_deref());
        debug!("OCR engine: {}", engine.command().display());
        let mut extractor = Self::new(
            Arc::new(engine),
            PdfSupport::detect(config),
            config.cache_capacity_bytes,
        );
        extractor.progress = config.progress_callback.clone();
        extractor
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn pdf_support(&self) -> &PdfSupport {
        &self.pdf
    }

    pub fn cache(&self) -> &ExtractionCache {
        &self.cache
    }

    /// Extract the text of one file.
    ///
    /// A repeated call with identical bytes, kind and language returns the
    /// memoised text without running OCR again. Failures are not memoised.
    pub fn extract(
        &mut self,
        bytes: &[u8],
        kind: FileKind,
        language: Language,
    ) -> Result<String, ExtractionError> {
        if let Some(text) = self.cache.get(bytes, kind, language) {
            debug!("Extraction cache hit ({} bytes, {})", bytes.len(), kind);
            return Ok(text);
        }

        let start = Instant::now();
        let text = if kind.is_pdf() {
            self.extract_pdf(bytes, language)?
        } else {
            self.extract_image(bytes, language)?
        };
        info!(
            "Extracted {} chars from {} input in {}ms",
            text.chars().count(),
            kind,
            start.elapsed().as_millis()
        );

        self.cache.insert(bytes, kind, language, text.clone());
        Ok(text)
    }

    fn extract_pdf(&self, bytes: &[u8], language: Language) -> Result<String, ExtractionError> {
        let pages = self.pdf.rasterize(bytes)?;
        let total = pages.len();
        if let Some(ref cb) = self.progress {
            cb.on_pages_start(total);
        }

        let mut texts = Vec::with_capacity(total);
        for (idx, image) in pages.iter().enumerate() {
            let page_num = idx + 1;
            let text = self
                .engine
                .recognize(image, language)
                .map_err(|e| with_page(e, page_num))?;
            debug!("Page {}/{}: {} chars", page_num, total, text.len());
            if let Some(ref cb) = self.progress {
                cb.on_page_complete(page_num, total, text.len());
            }
            texts.push(text);
        }
        Ok(texts.join(PAGE_BREAK))
    }

    fn extract_image(&self, bytes: &[u8], language: Language) -> Result<String, ExtractionError> {
        let image = image::load_from_memory(bytes).map_err(|e| ExtractionError::DecodeFailed {
            detail: e.to_string(),
        })?;
        self.engine.recognize(&image, language)
    }
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("pdf", &self.pdf)
            .field("cache_entries", &self.cache.len())
            .finish()
    }
}

fn with_page(err: ExtractionError, page_num: usize) -> ExtractionError {
    match err {
        ExtractionError::RecognitionFailed { page: None, detail } => {
            ExtractionError::RecognitionFailed {
                page: Some(page_num),
                detail,
            }
        }
        other => other,
    }
}

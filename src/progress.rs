//! Progress-callback trait for per-file and per-page events.
//!
//! Inject an [`Arc<dyn OcrProgressCallback>`] via
//! [`crate::config::OcrConfigBuilder::progress_callback`] to drive a progress
//! bar while a multi-page PDF is recognised and a spinner while the LLM call
//! is in flight.
//!
//! # Example
//!
//! ```rust
//! use ocr_enhance::{OcrConfig, OcrProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     pages: AtomicUsize,
//! }
//!
//! impl OcrProgressCallback for PageCounter {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page_num}/{total_pages}: {text_len} chars");
//!     }
//! }
//!
//! let config = OcrConfig::builder()
//!     .progress_callback(Arc::new(PageCounter { pages: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it processes each file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Files and pages are processed one at a time, in
/// order, on the caller's thread.
pub trait OcrProgressCallback: Send + Sync {
    /// Called before a file is extracted.
    ///
    /// # Arguments
    /// * `file_name`  : name of the input file
    /// * `index`      : 1-indexed position in the input list
    /// * `total_files`: number of files in this run
    fn on_file_start(&self, file_name: &str, index: usize, total_files: usize) {
        let _ = (file_name, index, total_files);
    }

    /// Called once a PDF has been rasterised and its page count is known.
    fn on_pages_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after each PDF page has been recognised.
    ///
    /// # Arguments
    /// * `page_num`   : 1-indexed page number
    /// * `total_pages`: pages in the document
    /// * `text_len`   : byte length of the recognised text
    fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
        let _ = (page_num, total_pages, text_len);
    }

    /// Called just before the completion request is sent.
    fn on_enhance_start(&self, file_name: &str, model: &str) {
        let _ = (file_name, model);
    }

    /// Called when the completion request returns, successfully or not.
    fn on_enhance_complete(&self, file_name: &str, success: bool) {
        let _ = (file_name, success);
    }

    /// Called once the report for a file is ready.
    fn on_file_complete(&self, file_name: &str, success: bool) {
        let _ = (file_name, success);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl OcrProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::OcrConfig`].
pub type ProgressCallback = Arc<dyn OcrProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        pages: AtomicUsize,
        enhances: AtomicUsize,
        files_ok: AtomicUsize,
        files_failed: AtomicUsize,
    }

    impl OcrProgressCallback for TrackingCallback {
        fn on_page_complete(&self, _page_num: usize, _total_pages: usize, _text_len: usize) {
            self.pages.fetch_add(1, Ordering::SeqCst);
        }

        fn on_enhance_start(&self, _file_name: &str, _model: &str) {
            self.enhances.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_complete(&self, _file_name: &str, success: bool) {
            if success {
                self.files_ok.fetch_add(1, Ordering::SeqCst);
            } else {
                self.files_failed.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_file_start("a.png", 1, 2);
        cb.on_pages_start(3);
        cb.on_page_complete(1, 3, 42);
        cb.on_enhance_start("a.png", "gpt-4o-mini");
        cb.on_enhance_complete("a.png", false);
        cb.on_file_complete("a.png", true);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_file_start("doc.pdf", 1, 2);
        tracker.on_pages_start(2);
        tracker.on_page_complete(1, 2, 100);
        tracker.on_page_complete(2, 2, 80);
        tracker.on_enhance_start("doc.pdf", "gpt-4o");
        tracker.on_file_complete("doc.pdf", true);
        tracker.on_file_complete("broken.png", false);

        assert_eq!(tracker.pages.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.enhances.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.files_ok.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.files_failed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_pages_start(10);
        cb.on_page_complete(1, 10, 512);
    }
}

//! Scenario tests for the extract → enhance → report pipeline.
//!
//! Tesseract, pdfium and the completion API are replaced by in-memory fakes
//! behind the library's `OcrEngine`, `PageRasterizer` and `CompletionClient`
//! traits, so these run without any external binary, library or network.
//!
//! Run with:
//!   cargo test --test pipeline

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use ocr_enhance::{
    write_reports, CompletionClient, CompletionRequest, Credential, EnhancementError,
    EnhancementLevel, ExtractionError, Extractor, FileReport, Language, LlmError, OcrConfig,
    OcrEngine, OcrProgressCallback, PageRasterizer, PdfSupport, Pipeline, UploadedFile,
    PAGE_BREAK,
};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Fakes ────────────────────────────────────────────────────────────────────

/// Returns a fixed text per call and counts calls.
struct ScriptedOcr {
    text: String,
    calls: AtomicUsize,
}

impl ScriptedOcr {
    fn new(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OcrEngine for ScriptedOcr {
    fn recognize(&self, _image: &DynamicImage, _language: Language) -> Result<String, ExtractionError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("{} #{n}", self.text))
    }
}

/// Always returns the same text, so repeated extraction is comparable.
struct ConstantOcr(&'static str);

impl OcrEngine for ConstantOcr {
    fn recognize(&self, _image: &DynamicImage, _language: Language) -> Result<String, ExtractionError> {
        Ok(self.0.to_string())
    }
}

/// Produces `pages` blank page images for any input.
struct BlankPages {
    pages: usize,
}

impl PageRasterizer for BlankPages {
    fn rasterize(&self, _pdf: &[u8]) -> Result<Vec<DynamicImage>, ExtractionError> {
        Ok((0..self.pages)
            .map(|_| DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([255, 255, 255]))))
            .collect())
    }
}

/// Records every request and answers with a fixed reply or error.
struct FakeLlm {
    reply: Result<String, u16>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeLlm {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(status),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionClient for FakeLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(LlmError::Api {
                status: *status,
                message: "The server had an error while processing your request".into(),
            }),
        }
    }
}

#[derive(Default)]
struct CountingProgress {
    pages: AtomicUsize,
    enhances: AtomicUsize,
    files: AtomicUsize,
}

impl OcrProgressCallback for CountingProgress {
    fn on_page_complete(&self, _page_num: usize, _total_pages: usize, _text_len: usize) {
        self.pages.fetch_add(1, Ordering::SeqCst);
    }

    fn on_enhance_start(&self, _file_name: &str, _model: &str) {
        self.enhances.fetch_add(1, Ordering::SeqCst);
    }

    fn on_file_complete(&self, _file_name: &str, _success: bool) {
        self.files.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn encode(format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 16, Rgb([250, 250, 250])));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

fn png(name: &str) -> UploadedFile {
    UploadedFile::new(name, encode(ImageFormat::Png)).unwrap()
}

fn jpg(name: &str) -> UploadedFile {
    UploadedFile::new(name, encode(ImageFormat::Jpeg)).unwrap()
}

fn pdf(name: &str) -> UploadedFile {
    UploadedFile::new(name, b"%PDF-1.7 fake".to_vec()).unwrap()
}

fn config(enhance: bool, credential: Credential, llm: Option<Arc<FakeLlm>>) -> OcrConfig {
    let mut builder = OcrConfig::builder()
        .language(Language::VietnameseEnglish)
        .enhance(enhance)
        .credential(credential);
    if let Some(llm) = llm {
        builder = builder.client(llm as Arc<dyn CompletionClient>);
    }
    builder.build().unwrap()
}

fn pipeline(config: OcrConfig, ocr: Arc<dyn OcrEngine>, pdf: PdfSupport) -> Pipeline {
    let extractor = Extractor::new(ocr, pdf, 16 * 1024 * 1024);
    Pipeline::with_extractor(config, extractor)
}

fn no_pdf() -> PdfSupport {
    PdfSupport::Unavailable {
        reason: "pdfium library not found on the system path".into(),
    }
}

fn artifact_names(report: &FileReport) -> Vec<String> {
    report.artifacts().into_iter().map(|a| a.file_name).collect()
}

// ── Extraction ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_extraction_is_memoised() {
    let ocr = ScriptedOcr::new("Xin chào");
    let mut p = pipeline(config(false, Credential::none(), None), ocr.clone(), no_pdf());
    let file = png("scan.png");

    let first = p.process_file(&file).await;
    let second = p.process_file(&file).await;

    assert_eq!(first.raw_text.as_deref(), Some("Xin chào #1"));
    assert_eq!(second.raw_text, first.raw_text);
    assert_eq!(ocr.calls(), 1, "second extraction must come from the cache");
    assert_eq!(p.extractor().cache().stats(), (1, 1));
}

#[tokio::test]
async fn test_same_bytes_different_extension_is_a_new_extraction() {
    let ocr = ScriptedOcr::new("text");
    let mut p = pipeline(config(false, Credential::none(), None), ocr.clone(), no_pdf());
    let bytes = encode(ImageFormat::Png);

    p.process_file(&UploadedFile::new("a.png", bytes.clone()).unwrap()).await;
    p.process_file(&UploadedFile::new("b.png", bytes.clone()).unwrap()).await;
    assert_eq!(ocr.calls(), 1, "file name is not part of the key");

    // PNG bytes declared as .jpg still decode (content sniffing) but key differently.
    p.process_file(&UploadedFile::new("c.jpg", bytes).unwrap()).await;
    assert_eq!(ocr.calls(), 2);
}

#[tokio::test]
async fn test_n_page_pdf_has_n_minus_one_separators() {
    for pages in [1usize, 2, 5] {
        let mut p = pipeline(
            config(false, Credential::none(), None),
            Arc::new(ConstantOcr("Trang văn bản")),
            PdfSupport::Available(Box::new(BlankPages { pages })),
        );
        let report = p.process_file(&pdf("doc.pdf")).await;
        let text = report.raw_text.expect("pdf extraction should succeed");

        assert_eq!(
            text.matches("--- Hết trang ---").count(),
            pages - 1,
            "{pages} pages"
        );
        assert_eq!(text.split(PAGE_BREAK).count(), pages);
    }
}

#[tokio::test]
async fn test_pdf_without_rasterizer_reports_capability_and_images_still_work() {
    let ocr = ScriptedOcr::new("ảnh");
    let mut p = pipeline(config(false, Credential::none(), None), ocr.clone(), no_pdf());

    let reports = p.process_files(&[pdf("doc.pdf"), png("scan.png")]).await;

    let doc = &reports[0];
    assert!(!doc.is_success());
    let err = doc.extraction_error.as_ref().unwrap();
    assert!(matches!(err, ExtractionError::RasterizerUnavailable { .. }));
    let msg = err.to_string();
    assert!(msg.contains("PDF support is not available"), "{msg}");
    assert!(msg.contains("PDFIUM_LIB_PATH"), "{msg}");
    assert!(msg.contains("PNG/JPG/JPEG"), "{msg}");
    assert!(doc.artifacts().is_empty());

    assert!(reports[1].is_success());
    assert_eq!(ocr.calls(), 1);
}

#[tokio::test]
async fn test_corrupt_image_is_reported_and_not_cached() {
    let ocr = ScriptedOcr::new("never");
    let mut p = pipeline(config(false, Credential::none(), None), ocr.clone(), no_pdf());
    let broken = UploadedFile::new("broken.png", b"\x89PNG truncated".to_vec()).unwrap();

    let report = p.process_file(&broken).await;
    assert!(matches!(
        report.extraction_error,
        Some(ExtractionError::DecodeFailed { .. })
    ));
    assert_eq!(ocr.calls(), 0);
    assert!(p.extractor().cache().is_empty());
}

// ── Enhancement ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_scan_png_fenced_reply_is_stripped() {
    let llm = FakeLlm::replying("```\nCộng hòa xã hội chủ nghĩa Việt Nam\nĐộc lập - Tự do - Hạnh phúc\n```");
    let mut p = pipeline(
        config(true, Credential::explicit("sk-test"), Some(llm.clone())),
        Arc::new(ConstantOcr("Cong hoa xa hoi chu nghia Viet Nam\nDoc lap - Tu do - Hanh phuc")),
        no_pdf(),
    );

    let report = p.process_file(&png("scan.png")).await;

    assert_eq!(
        report.enhanced_text.as_deref(),
        Some("Cộng hòa xã hội chủ nghĩa Việt Nam\nĐộc lập - Tự do - Hạnh phúc")
    );
    assert!(report.enhancement_error.is_none());
    assert_eq!(llm.calls(), 1);

    let sent = llm.requests.lock().unwrap()[0].clone();
    assert_eq!(sent.api_key, "sk-test");
    assert_eq!(sent.model, "gpt-4o-mini");
    assert_eq!(sent.temperature, EnhancementLevel::Medium.temperature());
    assert_eq!(sent.max_tokens, 4000);
    assert!(sent.user.contains("song ngữ"));
    assert!(sent
        .user
        .contains("```\nCong hoa xa hoi chu nghia Viet Nam\nDoc lap - Tu do - Hanh phuc\n```"));

    assert_eq!(
        artifact_names(&report),
        ["ket_qua_goc_scan.png.txt", "ket_qua_cai_thien_scan.png.txt"]
    );
    let cmp = report.comparison().unwrap();
    assert_eq!(cmp.enhanced_chars, report.enhanced().unwrap().chars().count());
}

#[tokio::test]
async fn test_note_jpg_without_credential_keeps_raw_text_and_makes_no_call() {
    let llm = FakeLlm::replying("unused");
    let mut p = pipeline(
        config(true, Credential::none(), Some(llm.clone())),
        Arc::new(ConstantOcr("Ghi chu hop ngay 12/03")),
        no_pdf(),
    );

    let report = p.process_file(&jpg("note.jpg")).await;

    assert_eq!(report.raw_text.as_deref(), Some("Ghi chu hop ngay 12/03"));
    assert!(report.enhanced_text.is_none());
    assert_eq!(
        report.enhancement_error,
        Some(EnhancementError::MissingCredential)
    );
    assert!(report.warning().unwrap().contains("OPENAI_API_KEY"));
    assert_eq!(llm.calls(), 0);
    assert_eq!(artifact_names(&report), ["ket_qua_note.jpg.txt"]);
}

#[tokio::test]
async fn test_whitespace_text_is_not_sent() {
    let llm = FakeLlm::replying("unused");
    let mut p = pipeline(
        config(true, Credential::explicit("sk-test"), Some(llm.clone())),
        Arc::new(ConstantOcr("  \n \t")),
        no_pdf(),
    );

    let report = p.process_file(&png("blank.png")).await;

    assert_eq!(report.raw_text.as_deref(), Some("  \n \t"));
    assert_eq!(report.enhanced_text.as_deref(), Some("  \n \t"));
    assert!(report.enhancement_error.is_none());
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_api_failure_is_a_warning_and_not_retried() {
    let llm = FakeLlm::failing(500);
    let mut p = pipeline(
        config(true, Credential::explicit("sk-test"), Some(llm.clone())),
        Arc::new(ConstantOcr("Hoa don so 0012")),
        no_pdf(),
    );

    let report = p.process_file(&png("invoice.png")).await;

    assert!(report.is_success());
    assert_eq!(report.raw_text.as_deref(), Some("Hoa don so 0012"));
    let warning = report.warning().unwrap();
    assert!(warning.starts_with("OpenAI call failed:"), "{warning}");
    assert!(warning.contains("500"), "{warning}");
    assert_eq!(llm.calls(), 1);
    assert_eq!(artifact_names(&report), ["ket_qua_invoice.png.txt"]);
}

#[tokio::test]
async fn test_credential_set_and_cleared_within_a_session() {
    let llm = FakeLlm::replying("Đã sửa");
    let mut p = pipeline(
        config(true, Credential::none(), Some(llm.clone())),
        Arc::new(ConstantOcr("Da sua")),
        no_pdf(),
    );
    let file = png("a.png");

    let before = p.process_file(&file).await;
    assert_eq!(before.enhancement_error, Some(EnhancementError::MissingCredential));

    p.credential_mut().set("sk-later");
    let after = p.process_file(&file).await;
    assert_eq!(after.enhanced_text.as_deref(), Some("Đã sửa"));
    assert_eq!(llm.requests.lock().unwrap()[0].api_key, "sk-later");

    p.credential_mut().clear();
    let cleared = p.process_file(&file).await;
    assert_eq!(cleared.enhancement_error, Some(EnhancementError::MissingCredential));
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn test_level_sets_temperature() {
    for (level, expected) in [
        (EnhancementLevel::Light, 0.1f32),
        (EnhancementLevel::Medium, 0.2),
        (EnhancementLevel::Strong, 0.3),
    ] {
        let llm = FakeLlm::replying("ok");
        let config = OcrConfig::builder()
            .enhance(true)
            .level(level)
            .credential(Credential::explicit("sk-test"))
            .client(llm.clone() as Arc<dyn CompletionClient>)
            .build()
            .unwrap();
        let mut p = pipeline(config, Arc::new(ConstantOcr("text")), no_pdf());
        p.process_file(&png("x.png")).await;
        assert_eq!(llm.requests.lock().unwrap()[0].temperature, expected);
    }
}

// ── Session plumbing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_progress_events_follow_pages_and_files() {
    let progress = Arc::new(CountingProgress::default());
    let llm = FakeLlm::replying("ok");
    let config = OcrConfig::builder()
        .enhance(true)
        .credential(Credential::explicit("sk-test"))
        .client(llm as Arc<dyn CompletionClient>)
        .progress_callback(progress.clone())
        .build()
        .unwrap();
    let extractor = Extractor::new(
        Arc::new(ConstantOcr("page")),
        PdfSupport::Available(Box::new(BlankPages { pages: 3 })),
        1 << 20,
    )
    .with_progress(progress.clone());
    let mut p = Pipeline::with_extractor(config, extractor);

    let reports = p.process_files(&[pdf("doc.pdf"), png("scan.png")]).await;

    assert_eq!(reports.len(), 2);
    assert_eq!(progress.pages.load(Ordering::SeqCst), 3);
    assert_eq!(progress.enhances.load(Ordering::SeqCst), 2);
    assert_eq!(progress.files.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_reports_keep_input_order_and_write_artifacts() {
    let mut p = pipeline(
        config(false, Credential::none(), None),
        Arc::new(ConstantOcr("nội dung")),
        no_pdf(),
    );
    let files = [png("b.png"), pdf("a.pdf"), jpg("c.jpg")];

    let reports = p.process_files(&files).await;
    let names: Vec<_> = reports.iter().map(|r| r.file_name.as_str()).collect();
    assert_eq!(names, ["b.png", "a.pdf", "c.jpg"]);

    let dir = tempfile::tempdir().unwrap();
    let written = write_reports(dir.path(), &reports).await.unwrap();
    assert_eq!(written.len(), 2, "the failed PDF has no artifact");
    assert_eq!(
        std::fs::read_to_string(dir.path().join("ket_qua_c.jpg.txt")).unwrap(),
        "nội dung"
    );

    let json = serde_json::to_string(&reports).unwrap();
    assert!(json.contains("RasterizerUnavailable"));
}

//! Per-file processing: extract → (optionally) enhance → report.
//!
//! A [`Pipeline`] lives for one session. It owns the extraction cache, so
//! a file seen twice is only recognised once, and the session credential,
//! which may be changed between files with [`Pipeline::credential_mut`].
//!
//! Nothing in here returns early on a per-file problem. Extraction and
//! enhancement failures are recorded in the [`FileReport`]; only writing
//! artifacts to disk can fail the call.

use crate::config::OcrConfig;
use crate::credential::Credential;
use crate::error::{EnhancementError, OcrError};
use crate::output::FileReport;
use crate::pipeline::enhance::{client_for, prepare, send, EnhancementRequest};
use crate::pipeline::extract::Extractor;
use crate::pipeline::input::UploadedFile;
use crate::pipeline::llm::CompletionClient;
use crate::pipeline::ocr::TesseractEngine;
use crate::pipeline::render::PdfSupport;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, info, warn};

/// Session state: configuration, extractor (with its cache) and the
/// completion client, built on first use.
pub struct Pipeline {
    config: OcrConfig,
    extractor: Extractor,
    client: Option<Arc<dyn CompletionClient>>,
}

impl Pipeline {
    /// Tesseract + pdfium as configured.
    pub fn new(config: OcrConfig) -> Self {
        let extractor = Extractor::from_config(&config);
        Self::with_extractor(config, extractor)
    }

    /// Use a pre-built extractor, e.g. one with a different OCR engine.
    pub fn with_extractor(config: OcrConfig, extractor: Extractor) -> Self {
        let client = config.client.clone();
        Self {
            config,
            extractor,
            client,
        }
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Set or clear the API key for the rest of the session.
    pub fn credential_mut(&mut self) -> &mut Credential {
        &mut self.config.credential
    }

    /// Process one file. Never fails; problems are recorded in the report.
    pub async fn process_file(&mut self, file: &UploadedFile) -> FileReport {
        let start = Instant::now();
        let language = self.config.language;
        info!("Processing '{}' ({}, {})", file.name(), file.kind(), language);

        let extractor = &mut self.extractor;
        let extraction =
            run_blocking(|| extractor.extract(file.bytes(), file.kind(), language));

        let mut report = FileReport {
            file_name: file.name().to_string(),
            kind: file.kind(),
            language,
            raw_text: None,
            extraction_error: None,
            enhancement_requested: self.config.enhance,
            enhanced_text: None,
            enhancement_error: None,
            duration_ms: 0,
        };

        match extraction {
            Ok(text) => {
                if self.config.enhance {
                    match self.enhance_text(file.name(), &text).await {
                        Ok(enhanced) => report.enhanced_text = Some(enhanced),
                        Err(e) => {
                            warn!("'{}': showing raw text only: {}", file.name(), e);
                            report.enhancement_error = Some(e);
                        }
                    }
                }
                report.raw_text = Some(text);
            }
            Err(e) => {
                warn!("'{}': extraction failed: {}", file.name(), e);
                report.extraction_error = Some(e);
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_file_complete(file.name(), report.is_success());
        }
        report
    }

    /// Process files one at a time, in order.
    pub async fn process_files(&mut self, files: &[UploadedFile]) -> Vec<FileReport> {
        let total = files.len();
        let mut reports = Vec::with_capacity(total);
        for (idx, file) in files.iter().enumerate() {
            if let Some(ref cb) = self.config.progress_callback {
                cb.on_file_start(file.name(), idx + 1, total);
            }
            reports.push(self.process_file(file).await);
        }
        let ok = reports.iter().filter(|r| r.is_success()).count();
        info!("Processed {} files: {} ok, {} failed", total, ok, total - ok);
        reports
    }

    async fn enhance_text(&mut self, file_name: &str, text: &str) -> Result<String, EnhancementError> {
        let request = EnhancementRequest::new(text, &self.config);
        let Some(completion) = prepare(&request, &self.config.credential)? else {
            return Ok(text.to_string());
        };

        let client = self.client()?;
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_enhance_start(file_name, self.config.model.id());
        }
        let result = send(&completion, client.as_ref()).await;
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_enhance_complete(file_name, result.is_ok());
        }
        result
    }

    fn client(&mut self) -> Result<Arc<dyn CompletionClient>, EnhancementError> {
        if let Some(client) = &self.client {
            return Ok(Arc::clone(client));
        }
        let client = client_for(&self.config)?;
        debug!("Completion client ready for {}", self.config.api_base_url);
        self.client = Some(Arc::clone(&client));
        Ok(client)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("extractor", &self.extractor)
            .finish()
    }
}

/// Run CPU-bound or process-spawning work without stalling other tasks on a
/// multi-threaded runtime. Elsewhere it runs inline.
fn run_blocking<R>(f: impl FnOnce() -> R) -> R {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

/// Write every report's artifacts into `dir`.
///
/// Each file is written to a temporary sibling and renamed into place, so a
/// crash never leaves a half-written result. Inputs that share a file name
/// (`a/scan.png`, `b/scan.png`) get a numeric suffix instead of overwriting
/// each other: `ket_qua_scan.png.txt`, `ket_qua_scan.png_2.txt`. Returns the
/// written paths, in report order.
pub async fn write_reports(dir: &Path, reports: &[FileReport]) -> Result<Vec<PathBuf>, OcrError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| OcrError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let mut written = Vec::new();
    let mut taken = HashSet::new();
    for artifact in reports.iter().flat_map(FileReport::artifacts) {
        let file_name = unique_name(&artifact.file_name, &mut taken);
        if file_name != artifact.file_name {
            warn!(
                "'{}' is already used in this run; writing '{}'",
                artifact.file_name, file_name
            );
        }
        let path = dir.join(&file_name);
        let tmp_path = dir.join(format!(".{}.tmp", file_name));

        tokio::fs::write(&tmp_path, artifact.contents.as_bytes())
            .await
            .map_err(|e| OcrError::OutputWriteFailed {
                path: tmp_path.clone(),
                source: e,
            })?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| OcrError::OutputWriteFailed {
                path: path.clone(),
                source: e,
            })?;

        debug!("Wrote {} ({} bytes)", path.display(), artifact.contents.len());
        written.push(path);
    }
    Ok(written)
}

fn unique_name(name: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem, format!(".{ext}")),
        None => (name, String::new()),
    };
    let mut n = 2;
    loop {
        let candidate = format!("{stem}_{n}{ext}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Environment report: what works and what is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Path of the running executable.
    pub executable: Option<PathBuf>,
    pub ocr_command: String,
    pub ocr_version: Option<String>,
    pub ocr_languages: Vec<String>,
    /// Why the OCR engine could not be queried, if it could not.
    pub ocr_error: Option<String>,
    pub pdf_available: bool,
    pub pdf_reason: Option<String>,
    pub credential_configured: bool,
    pub api_base_url: String,
}

impl Diagnostics {
    /// Configured language packs that the engine does not report.
    pub fn missing_languages(&self, wanted: &str) -> Vec<String> {
        if self.ocr_error.is_some() {
            return Vec::new();
        }
        wanted
            .split('+')
            .filter(|lang| !self.ocr_languages.iter().any(|have| have == lang))
            .map(str::to_string)
            .collect()
    }
}

/// Probe the OCR engine, PDF support and credential for `config`.
pub fn diagnose(config: &OcrConfig) -> Diagnostics {
    let engine = TesseractEngine::resolve(config.tesseract_cmd.as_deref());
    let (ocr_version, ocr_languages, ocr_error) = match engine.version() {
        Ok(version) => match engine.languages() {
            Ok(langs) => (Some(version), langs, None),
            Err(e) => (Some(version), Vec::new(), Some(e.to_string())),
        },
        Err(e) => (None, Vec::new(), Some(e.to_string())),
    };
    let pdf = PdfSupport::detect(config);

    Diagnostics {
        executable: std::env::current_exe().ok(),
        ocr_command: engine.command().display().to_string(),
        ocr_version,
        ocr_languages,
        ocr_error,
        pdf_available: pdf.is_available(),
        pdf_reason: pdf.reason().map(str::to_string),
        credential_configured: config.credential.is_configured(),
        api_base_url: config.api_base_url.clone(),
    }
}

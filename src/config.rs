//! Configuration types for OCR extraction and LLM enhancement.
//!
//! Every knob lives in [`OcrConfig`], built via its [`OcrConfigBuilder`].
//! The session credential is part of the config so it is passed explicitly
//! to each enhancement call rather than read from ambient state.

use crate::credential::Credential;
use crate::error::OcrError;
use crate::pipeline::llm::CompletionClient;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Default OpenAI endpoint used when no client is injected.
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";

/// Upper bound on the completion length, applied to every enhancement call.
pub const MAX_COMPLETION_TOKENS: usize = 4000;

/// Configuration for an OCR run.
///
/// # Example
/// ```rust
/// use ocr_enhance::{EnhancementLevel, Language, OcrConfig};
///
/// let config = OcrConfig::builder()
///     .language(Language::Vietnamese)
///     .enhance(true)
///     .level(EnhancementLevel::Light)
///     .build()
///     .unwrap();
/// assert_eq!(config.level.temperature(), 0.1);
/// ```
#[derive(Clone)]
pub struct OcrConfig {
    /// Recognition language passed to Tesseract. Default: `vie+eng`.
    pub language: Language,

    /// Run the LLM clean-up step after OCR. Default: false.
    pub enhance: bool,

    /// Model used for the clean-up step. Default: `gpt-4o-mini`.
    pub model: Model,

    /// How aggressively the model may rewrite the OCR text. Default: medium.
    pub level: EnhancementLevel,

    /// API key for the completion endpoint.
    pub credential: Credential,

    /// Pre-constructed completion client. Takes precedence over the built-in
    /// OpenAI client; the credential is still checked first.
    pub client: Option<Arc<dyn CompletionClient>>,

    /// Base URL of the OpenAI-compatible API. Default: [`DEFAULT_API_BASE_URL`],
    /// or `OPENAI_BASE_URL` when set.
    pub api_base_url: String,

    /// Per-call timeout for the completion request in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Tesseract binary. `None` means `TESSERACT_CMD`, then `TESSERACT_PATH`,
    /// then `tesseract` on the `PATH`.
    pub tesseract_cmd: Option<PathBuf>,

    /// Path to a pdfium shared library. `None` means `PDFIUM_LIB_PATH`, then
    /// the system library search path.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Rendering DPI for PDF pages. Range: 72–600. Default: 200.
    pub dpi: u32,

    /// Cap on either edge of a rendered PDF page, in pixels. Default: 4000.
    pub max_rendered_pixels: u32,

    /// Byte budget of the extraction cache. Default: 256 MiB.
    pub cache_capacity_bytes: usize,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional progress callback for page and enhancement events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            enhance: false,
            model: Model::default(),
            level: EnhancementLevel::default(),
            credential: Credential::from_env(),
            client: None,
            api_base_url: std::env::var("OPENAI_BASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            api_timeout_secs: 120,
            tesseract_cmd: None,
            pdfium_lib_path: None,
            dpi: 200,
            max_rendered_pixels: 4000,
            cache_capacity_bytes: 256 * 1024 * 1024,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrConfig")
            .field("language", &self.language)
            .field("enhance", &self.enhance)
            .field("model", &self.model)
            .field("level", &self.level)
            .field("credential", &self.credential)
            .field("client", &self.client.as_ref().map(|_| "<dyn CompletionClient>"))
            .field("api_base_url", &self.api_base_url)
            .field("tesseract_cmd", &self.tesseract_cmd)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("cache_capacity_bytes", &self.cache_capacity_bytes)
            .finish()
    }
}

impl OcrConfig {
    /// Create a new builder for `OcrConfig`.
    pub fn builder() -> OcrConfigBuilder {
        OcrConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`OcrConfig`].
#[derive(Debug)]
pub struct OcrConfigBuilder {
    config: OcrConfig,
}

impl OcrConfigBuilder {
    pub fn language(mut self, language: Language) -> Self {
        self.config.language = language;
        self
    }

    pub fn enhance(mut self, v: bool) -> Self {
        self.config.enhance = v;
        self
    }

    pub fn model(mut self, model: Model) -> Self {
        self.config.model = model;
        self
    }

    pub fn level(mut self, level: EnhancementLevel) -> Self {
        self.config.level = level;
        self
    }

    pub fn credential(mut self, credential: Credential) -> Self {
        self.config.credential = credential;
        self
    }

    pub fn client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.config.client = Some(client);
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn tesseract_cmd(mut self, cmd: impl Into<PathBuf>) -> Self {
        self.config.tesseract_cmd = Some(cmd.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    /// Checked against 72–600 by [`build`](Self::build).
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn cache_capacity_bytes(mut self, bytes: usize) -> Self {
        self.config.cache_capacity_bytes = bytes;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<OcrConfig, OcrError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(OcrError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.api_timeout_secs == 0 {
            return Err(OcrError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if !c.api_base_url.starts_with("http://") && !c.api_base_url.starts_with("https://") {
            return Err(OcrError::InvalidConfig(format!(
                "API base URL must be http(s), got '{}'",
                c.api_base_url
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Recognition language handed to Tesseract (`-l`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    /// Vietnamese and English together. (default)
    #[default]
    #[serde(rename = "vie+eng")]
    VietnameseEnglish,
    #[serde(rename = "vie")]
    Vietnamese,
    #[serde(rename = "eng")]
    English,
}

impl Language {
    /// Tesseract language code.
    pub fn code(self) -> &'static str {
        match self {
            Language::VietnameseEnglish => "vie+eng",
            Language::Vietnamese => "vie",
            Language::English => "eng",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = OcrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vie+eng" | "eng+vie" => Ok(Language::VietnameseEnglish),
            "vie" => Ok(Language::Vietnamese),
            "eng" => Ok(Language::English),
            other => Err(OcrError::InvalidConfig(format!(
                "unknown language '{other}' (expected vie+eng, vie or eng)"
            ))),
        }
    }
}

/// How aggressively the LLM may rewrite OCR output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhancementLevel {
    /// Only the most obvious errors.
    Light,
    /// OCR and common spelling errors, light formatting. (default)
    #[default]
    Medium,
    /// OCR, spelling, grammar and formatting.
    Strong,
}

impl EnhancementLevel {
    /// Sampling temperature for the completion call.
    ///
    /// Increases with the level: stronger correction needs more room.
    pub fn temperature(self) -> f32 {
        match self {
            EnhancementLevel::Light => 0.1,
            EnhancementLevel::Medium => 0.2,
            EnhancementLevel::Strong => 0.3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EnhancementLevel::Light => "light",
            EnhancementLevel::Medium => "medium",
            EnhancementLevel::Strong => "strong",
        }
    }
}

impl fmt::Display for EnhancementLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnhancementLevel {
    type Err = OcrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(EnhancementLevel::Light),
            "medium" => Ok(EnhancementLevel::Medium),
            "strong" => Ok(EnhancementLevel::Strong),
            other => Err(OcrError::InvalidConfig(format!(
                "unknown enhancement level '{other}' (expected light, medium or strong)"
            ))),
        }
    }
}

/// Completion models the clean-up step accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Model {
    /// Fast and cheap. (default)
    #[default]
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
    /// More accurate, more expensive.
    #[serde(rename = "gpt-4o")]
    Gpt4o,
}

impl Model {
    pub fn id(self) -> &'static str {
        match self {
            Model::Gpt4oMini => "gpt-4o-mini",
            Model::Gpt4o => "gpt-4o",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Model {
    type Err = OcrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "gpt-4o-mini" => Ok(Model::Gpt4oMini),
            "gpt-4o" => Ok(Model::Gpt4o),
            other => Err(OcrError::InvalidConfig(format!(
                "unknown model '{other}' (expected gpt-4o-mini or gpt-4o)"
            ))),
        }
    }
}

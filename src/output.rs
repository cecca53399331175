//! Output types: per-file reports, text statistics and downloadable artifacts.

use crate::config::Language;
use crate::error::{EnhancementError, ExtractionError};
use crate::pipeline::input::FileKind;
use serde::{Deserialize, Serialize};

/// Characters shown per side in the before/after comparison.
pub const PREVIEW_CHARS: usize = 500;

/// Everything known about one processed file.
///
/// Exactly one of `raw_text` / `extraction_error` is set. When enhancement
/// was requested and extraction succeeded, exactly one of `enhanced_text` /
/// `enhancement_error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub file_name: String,
    pub kind: FileKind,
    pub language: Language,
    pub raw_text: Option<String>,
    pub extraction_error: Option<ExtractionError>,
    pub enhancement_requested: bool,
    pub enhanced_text: Option<String>,
    pub enhancement_error: Option<EnhancementError>,
    pub duration_ms: u64,
}

impl FileReport {
    pub fn is_success(&self) -> bool {
        self.raw_text.is_some()
    }

    /// Enhanced text, if enhancement ran and produced something.
    pub fn enhanced(&self) -> Option<&str> {
        self.enhanced_text.as_deref().filter(|t| !t.is_empty())
    }

    /// A message for the user when the raw text is shown without enhancement
    /// because enhancement failed or was not possible.
    pub fn warning(&self) -> Option<String> {
        self.enhancement_error.as_ref().map(ToString::to_string)
    }

    pub fn raw_stats(&self) -> Option<TextStats> {
        self.raw_text.as_deref().map(TextStats::of)
    }

    pub fn enhanced_stats(&self) -> Option<TextStats> {
        self.enhanced().map(TextStats::of)
    }

    /// Raw vs enhanced lengths, when both exist.
    pub fn comparison(&self) -> Option<Comparison> {
        Some(Comparison::between(self.raw_text.as_deref()?, self.enhanced()?))
    }

    /// Text files offered for download.
    ///
    /// Raw only: `ket_qua_<name>.txt`. With enhanced text: the raw text as
    /// `ket_qua_goc_<name>.txt` and the enhanced text as
    /// `ket_qua_cai_thien_<name>.txt`. A failed extraction has no artifacts.
    pub fn artifacts(&self) -> Vec<Artifact> {
        let Some(raw) = self.raw_text.as_deref() else {
            return Vec::new();
        };
        match self.enhanced() {
            Some(enhanced) => vec![
                Artifact {
                    file_name: format!("ket_qua_goc_{}.txt", self.file_name),
                    contents: raw.to_string(),
                },
                Artifact {
                    file_name: format!("ket_qua_cai_thien_{}.txt", self.file_name),
                    contents: enhanced.to_string(),
                },
            ],
            None => vec![Artifact {
                file_name: format!("ket_qua_{}.txt", self.file_name),
                contents: raw.to_string(),
            }],
        }
    }
}

/// A named text file ready to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub file_name: String,
    pub contents: String,
}

/// Character and word counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStats {
    pub chars: usize,
    pub words: usize,
}

impl TextStats {
    pub fn of(text: &str) -> Self {
        Self {
            chars: text.chars().count(),
            words: text.split_whitespace().count(),
        }
    }
}

/// Length change from raw to enhanced text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub raw_chars: usize,
    pub enhanced_chars: usize,
    pub char_delta: i64,
    /// Change relative to the raw length; 0 when the raw text is empty.
    pub percent_change: f64,
}

impl Comparison {
    pub fn between(raw: &str, enhanced: &str) -> Self {
        let raw_chars = raw.chars().count();
        let enhanced_chars = enhanced.chars().count();
        let char_delta = enhanced_chars as i64 - raw_chars as i64;
        let percent_change = if raw_chars == 0 {
            0.0
        } else {
            char_delta as f64 / raw_chars as f64 * 100.0
        };
        Self {
            raw_chars,
            enhanced_chars,
            char_delta,
            percent_change,
        }
    }
}

/// First `max_chars` characters of `text`, with `...` appended if cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

//! OCR engine boundary: image + language → text.
//!
//! The engine is a black box behind [`OcrEngine`]. The production engine runs
//! the `tesseract` binary with a fixed recognition configuration
//! (`--oem 1 --psm 6`: LSTM engine, single uniform block of text).

use crate::config::Language;
use crate::error::ExtractionError;
use crate::pipeline::postprocess::normalise_ocr_text;
use image::{DynamicImage, ImageFormat};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Fixed Tesseract arguments: engine mode 1, page-segmentation mode 6.
pub const RECOGNITION_ARGS: [&str; 4] = ["--oem", "1", "--psm", "6"];

/// Environment variables that override the Tesseract binary, in priority order.
pub const TESSERACT_ENV_VARS: [&str; 2] = ["TESSERACT_CMD", "TESSERACT_PATH"];

/// Recognise the text in one image.
///
/// Implementations must be deterministic for identical input: extraction
/// results are memoised on that assumption.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &DynamicImage, language: Language) -> Result<String, ExtractionError>;
}

/// Runs the `tesseract` command-line binary.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    command: PathBuf,
}

impl TesseractEngine {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Use `explicit` if given, else `TESSERACT_CMD`, then `TESSERACT_PATH`,
    /// then `tesseract` from the `PATH`.
    pub fn resolve(explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return Self::new(path);
        }
        let from_env = TESSERACT_ENV_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|v| !v.trim().is_empty());
        Self::new(from_env.unwrap_or_else(|| "tesseract".to_string()))
    }

    pub fn command(&self) -> &Path {
        &self.command
    }

    /// First line of `tesseract --version`, e.g. `tesseract 5.3.4`.
    pub fn version(&self) -> Result<String, ExtractionError> {
        let output = Command::new(&self.command)
            .arg("--version")
            .output()
            .map_err(|e| self.missing(e))?;
        // Older releases print the banner on stderr.
        let banner = [output.stdout.as_slice(), output.stderr.as_slice()]
            .iter()
            .map(|b| String::from_utf8_lossy(b).to_string())
            .find_map(|s| {
                s.lines()
                    .next()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
            });
        banner.ok_or_else(|| ExtractionError::RecognitionFailed {
            page: None,
            detail: "tesseract --version printed nothing".into(),
        })
    }

    /// Installed language packs, from `tesseract --list-langs`.
    pub fn languages(&self) -> Result<Vec<String>, ExtractionError> {
        let output = Command::new(&self.command)
            .arg("--list-langs")
            .output()
            .map_err(|e| self.missing(e))?;
        let mut listing = String::from_utf8_lossy(&output.stdout).to_string();
        if listing.trim().is_empty() {
            listing = String::from_utf8_lossy(&output.stderr).to_string();
        }
        Ok(parse_language_list(&listing))
    }

    fn missing(&self, e: std::io::Error) -> ExtractionError {
        ExtractionError::OcrEngineMissing {
            command: self.command.display().to_string(),
            detail: e.to_string(),
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &DynamicImage, language: Language) -> Result<String, ExtractionError> {
        let mut tmp = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .map_err(|e| ExtractionError::RecognitionFailed {
                page: None,
                detail: format!("failed to create temp file for OCR: {e}"),
            })?;
        image
            .write_to(&mut tmp, ImageFormat::Png)
            .map_err(|e| ExtractionError::RecognitionFailed {
                page: None,
                detail: format!("failed to write temp image for OCR: {e}"),
            })?;
        tmp.flush().ok();

        let output = Command::new(&self.command)
            .arg(tmp.path())
            .arg("stdout")
            .arg("-l")
            .arg(language.code())
            .args(RECOGNITION_ARGS)
            .output()
            .map_err(|e| self.missing(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::RecognitionFailed {
                page: None,
                detail: format!("tesseract failed: {}", stderr.trim()),
            });
        }

        let text = normalise_ocr_text(&String::from_utf8_lossy(&output.stdout));
        debug!(
            "tesseract -l {}: {}x{} px → {} chars",
            language.code(),
            image.width(),
            image.height(),
            text.chars().count()
        );
        Ok(text)
    }
}

// Skips the "List of available languages ..." header line.
fn parse_language_list(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("List of"))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn recognition_args_are_fixed() {
        assert_eq!(RECOGNITION_ARGS.join(" "), "--oem 1 --psm 6");
    }

    /// A stand-in `tesseract` that prints its own arguments.
    #[cfg(unix)]
    fn echo_engine(dir: &Path) -> TesseractEngine {
        use std::os::unix::fs::PermissionsExt;
        let script = dir.join("tesseract");
        std::fs::write(&script, "#!/bin/sh\necho \"$@\"\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        TesseractEngine::new(script)
    }

    #[cfg(unix)]
    #[test]
    fn recognize_runs_fixed_command_line() {
        let dir = tempfile::tempdir().unwrap();
        let engine = echo_engine(dir.path());
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([255, 255, 255])));

        for language in [Language::VietnameseEnglish, Language::Vietnamese, Language::English] {
            let line = engine.recognize(&img, language).unwrap();
            let args: Vec<&str> = line.split_whitespace().collect();
            assert_eq!(args.len(), 8, "got: {line}");
            assert!(args[0].ends_with(".png"), "image path first, got: {line}");
            assert_eq!(
                args[1..],
                ["stdout", "-l", language.code(), "--oem", "1", "--psm", "6"],
                "got: {line}"
            );
        }
    }

    #[test]
    fn language_listing_skips_header() {
        let listing = "List of available languages in \"/usr/share/tessdata/\" (3):\neng\nosd\nvie\n";
        assert_eq!(parse_language_list(listing), ["eng", "osd", "vie"]);
    }

    #[test]
    fn explicit_command_wins() {
        let engine = TesseractEngine::resolve(Some(Path::new("/opt/tess/bin/tesseract")));
        assert_eq!(engine.command(), Path::new("/opt/tess/bin/tesseract"));
    }

    #[test]
    fn missing_binary_is_reported_not_panicked() {
        let engine = TesseractEngine::new("/definitely/not/a/tesseract-binary");
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([255, 255, 255])));

        let err = engine.recognize(&img, Language::English).unwrap_err();
        assert!(
            matches!(err, ExtractionError::OcrEngineMissing { .. }),
            "got: {err:?}"
        );
        assert!(err.to_string().contains("TESSERACT_CMD"));

        assert!(matches!(
            engine.version(),
            Err(ExtractionError::OcrEngineMissing { .. })
        ));
    }
}

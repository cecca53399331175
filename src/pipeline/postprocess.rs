//! Post-processing: deterministic cleanup of OCR output and model replies.
//!
//! Two independent entry points:
//!
//! - [`normalise_ocr_text`] runs on whatever Tesseract prints. It only fixes
//!   transport artefacts (line endings, the form feed Tesseract appends to
//!   each page, trailing blanks) and never touches the recognised characters.
//! - [`strip_code_fence`] runs on the model's reply. Models sometimes echo the
//!   fenced block the prompt used, so an outer fence is removed.

use once_cell::sync::Lazy;
use regex::Regex;

const FENCE: &str = "```";

/// Remove an outer code fence from a model reply.
///
/// The reply is trimmed first. If it then starts with a fence marker, the
/// first line is dropped, and if the last line is also a fence marker it is
/// dropped too. A reply without a leading fence is returned trimmed but
/// otherwise untouched.
pub fn strip_code_fence(reply: &str) -> String {
    let trimmed = reply.trim();
    if !trimmed.starts_with(FENCE) {
        return trimmed.to_string();
    }

    let lines: Vec<&str> = trimmed.split('\n').collect();
    let closes = lines.len() > 1 && lines[lines.len() - 1].starts_with(FENCE);
    let body = if closes {
        &lines[1..lines.len() - 1]
    } else {
        &lines[1..]
    };
    body.join("\n")
}

/// Clean up raw Tesseract output without changing any recognised text.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Drop form feeds (Tesseract ends every page with `\x0c`)
/// 3. Trim trailing whitespace per line
/// 4. Collapse runs of 3+ blank lines down to 2
/// 5. Trim leading and trailing blank lines
pub fn normalise_ocr_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = s.replace('\x0c', "");
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    s.trim_matches('\n').to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

//! CLI binary for ocr-enhance.
//!
//! A thin shim over the library crate that maps CLI flags to `OcrConfig`,
//! runs every input through one `Pipeline` session and prints the results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ocr_enhance::{
    diagnose, preview, resolve_input, write_reports, Credential, Diagnostics, EnhancementLevel,
    FileReport, Language, Model, OcrConfig, OcrProgressCallback, Pipeline, ProgressCallback,
    PREVIEW_CHARS,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// A page bar while a PDF is recognised and a spinner while the model works.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(Self::spinner_style());
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS)
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS)
    }
}

impl OcrProgressCallback for CliProgressCallback {
    fn on_file_start(&self, file_name: &str, index: usize, total_files: usize) {
        self.bar.set_style(Self::spinner_style());
        self.bar.set_prefix(format!("[{index}/{total_files}]"));
        self.bar.set_message(format!("Reading {file_name}…"));
    }

    fn on_pages_start(&self, total_pages: usize) {
        self.bar.set_style(Self::bar_style());
        self.bar.set_length(total_pages as u64);
        self.bar.set_position(0);
        self.bar.reset_eta();
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total_pages,
            dim(&format!("{text_len:>5} chars")),
        ));
        self.bar.inc(1);
    }

    fn on_enhance_start(&self, file_name: &str, model: &str) {
        self.bar.set_style(Self::spinner_style());
        self.bar.set_message(format!("Enhancing {file_name} with {model}…"));
    }

    fn on_enhance_complete(&self, _file_name: &str, success: bool) {
        if !success {
            self.bar.println(format!("  {} enhancement failed", yellow("⚠")));
        }
    }

    fn on_file_complete(&self, file_name: &str, success: bool) {
        let mark = if success { green("✔") } else { red("✘") };
        self.bar.println(format!("{mark} {file_name}"));
        self.bar.set_message(String::new());
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Vietnamese + English OCR of a scan (stdout)
  ocr-enhance scan.png

  # Several files, results written as ket_qua_*.txt
  ocr-enhance invoice.pdf note.jpg -o results/

  # Clean up the OCR text with an LLM
  OPENAI_API_KEY=sk-... ocr-enhance --enhance --level strong contract.pdf

  # English only, more accurate model, show before/after previews
  ocr-enhance --lang eng --enhance --model gpt-4o --compare letter.png

  # Check that tesseract, pdfium and the API key are set up
  ocr-enhance --diagnose

OUTPUT FILES (with -o DIR):
  ket_qua_<file>.txt              raw OCR text
  ket_qua_goc_<file>.txt          raw OCR text, when enhancement succeeded
  ket_qua_cai_thien_<file>.txt    enhanced text

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          API key for --enhance
  OPENAI_BASE_URL         OpenAI-compatible endpoint (default https://api.openai.com/v1)
  TESSERACT_CMD           Path to the tesseract binary (alias: TESSERACT_PATH)
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory) for PDF input
  RUST_LOG                Log filter, overrides -v / -q

SETUP:
  1. Install tesseract with the 'vie' and 'eng' language packs.
  2. For PDF input, install pdfium or set PDFIUM_LIB_PATH.
  3. For --enhance, set OPENAI_API_KEY or pass --api-key.
"#;

/// Extract text from images and PDFs with Tesseract, then polish it with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "ocr-enhance",
    version,
    about = "Extract text from images and PDFs with Tesseract, then polish it with an LLM",
    long_about = "Extract text from PNG/JPG/JPEG images and PDF documents (local files or URLs) \
with Tesseract, tuned for Vietnamese and English. Optionally send the text through an OpenAI \
model to restore diacritics, fix confusable characters and spelling, and repair paragraphs.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input files or HTTP/HTTPS URLs (pdf, png, jpg, jpeg).
    #[arg(required_unless_present = "diagnose")]
    inputs: Vec<String>,

    /// Recognition language: vie+eng, vie or eng.
    #[arg(short, long, env = "OCR_ENHANCE_LANG", default_value = "vie+eng")]
    lang: String,

    /// Clean up the OCR text with an LLM.
    #[arg(short, long, env = "OCR_ENHANCE_ENHANCE")]
    enhance: bool,

    /// Model for the clean-up step: gpt-4o-mini or gpt-4o.
    #[arg(
        long,
        env = "OCR_ENHANCE_MODEL",
        default_value = "gpt-4o-mini",
        long_help = "Model for the clean-up step.\n\
          gpt-4o-mini: fast and cheap (default). gpt-4o: more accurate, more expensive."
    )]
    model: String,

    /// How much the model may change: light, medium, strong.
    #[arg(long, env = "OCR_ENHANCE_LEVEL", value_enum, default_value = "medium")]
    level: LevelArg,

    /// OpenAI API key for this run.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Write ket_qua_*.txt result files into this directory.
    #[arg(short, long, env = "OCR_ENHANCE_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Print reports as JSON instead of text.
    #[arg(long, env = "OCR_ENHANCE_JSON")]
    json: bool,

    /// Print the first 500 characters of the raw and enhanced text for comparison.
    #[arg(long)]
    compare: bool,

    /// Disable progress bar.
    #[arg(long, env = "OCR_ENHANCE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "OCR_ENHANCE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, env = "OCR_ENHANCE_QUIET")]
    quiet: bool,

    /// Path to the tesseract binary.
    #[arg(long, env = "OCR_ENHANCE_TESSERACT_CMD")]
    tesseract_cmd: Option<PathBuf>,

    /// Path to the pdfium shared library (file or directory).
    #[arg(long, env = "OCR_ENHANCE_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// PDF rendering DPI (72–600).
    #[arg(long, env = "OCR_ENHANCE_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Memory budget of the extraction cache in MiB.
    #[arg(long, env = "OCR_ENHANCE_CACHE_MB", default_value_t = 256)]
    cache_mb: usize,

    /// Timeout for the LLM call in seconds.
    #[arg(long, env = "OCR_ENHANCE_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout for URL inputs in seconds.
    #[arg(long, env = "OCR_ENHANCE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Report whether tesseract, pdfium and the API key are usable, then exit.
    #[arg(long)]
    diagnose: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum LevelArg {
    Light,
    Medium,
    Strong,
}

impl From<LevelArg> for EnhancementLevel {
    fn from(v: LevelArg) -> Self {
        match v {
            LevelArg::Light => EnhancementLevel::Light,
            LevelArg::Medium => EnhancementLevel::Medium,
            LevelArg::Strong => EnhancementLevel::Strong,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level logs; -v always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.diagnose;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let cli_cb = show_progress.then(CliProgressCallback::new);
    let progress_cb: Option<ProgressCallback> = cli_cb
        .clone()
        .map(|cb| cb as Arc<dyn OcrProgressCallback>);

    let config = build_config(&cli, progress_cb)?;

    // ── Diagnose mode ────────────────────────────────────────────────────
    if cli.diagnose {
        let diag = tokio::task::block_in_place(|| diagnose(&config));
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&diag).context("Failed to serialise diagnostics")?
            );
        } else {
            print_diagnostics(&diag, config.language);
        }
        return Ok(());
    }

    // ── Resolve inputs ───────────────────────────────────────────────────
    let mut files = Vec::with_capacity(cli.inputs.len());
    for input in &cli.inputs {
        let file = resolve_input(input, cli.download_timeout)
            .await
            .with_context(|| format!("Cannot use input '{input}'"))?;
        files.push(file);
    }

    // ── Run pipeline ─────────────────────────────────────────────────────
    let mut pipeline = Pipeline::new(config);
    let reports = pipeline.process_files(&files).await;
    if let Some(ref cb) = cli_cb {
        cb.bar.finish_and_clear();
    }

    if let Some(ref dir) = cli.output_dir {
        let written = write_reports(dir, &reports)
            .await
            .context("Failed to write result files")?;
        if !cli.quiet {
            for path in &written {
                eprintln!("{} {}", dim("→"), path.display());
            }
        }
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&reports).context("Failed to serialise reports")?;
        println!("{json}");
    } else {
        print_reports(&reports, cli.compare, cli.quiet).context("Failed to write to stdout")?;
    }

    let failed = reports.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        if !cli.quiet {
            eprintln!(
                "{} {}/{} files failed",
                red("✘"),
                bold(&failed.to_string()),
                reports.len()
            );
        }
        std::process::exit(1);
    }
    Ok(())
}

/// Map CLI args to `OcrConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<OcrConfig> {
    let language: Language = cli.lang.parse().context("Invalid --lang")?;
    let model: Model = cli.model.parse().context("Invalid --model")?;

    let mut credential = Credential::from_env();
    if let Some(ref key) = cli.api_key {
        credential.set(key.clone());
    }

    let mut builder = OcrConfig::builder()
        .language(language)
        .enhance(cli.enhance)
        .model(model)
        .level(cli.level.clone().into())
        .credential(credential)
        .dpi(cli.dpi)
        .cache_capacity_bytes(cli.cache_mb.saturating_mul(1024 * 1024))
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref cmd) = cli.tesseract_cmd {
        builder = builder.tesseract_cmd(cmd);
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(lib);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_reports(reports: &[FileReport], compare: bool, quiet: bool) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for report in reports {
        if reports.len() > 1 {
            writeln!(out, "{}", bold(&format!("=== {} ===", report.file_name)))?;
        }

        if let Some(ref err) = report.extraction_error {
            eprintln!("{} {}: {}", red("✘"), report.file_name, err);
            continue;
        }
        if let Some(warning) = report.warning() {
            eprintln!("{} {}", yellow("⚠"), warning);
        }

        let raw = report.raw_text.as_deref().unwrap_or_default();
        let text = report.enhanced().unwrap_or(raw);
        out.write_all(text.as_bytes())?;
        if !text.ends_with('\n') {
            out.write_all(b"\n")?;
        }

        if quiet {
            continue;
        }
        if let Some(stats) = report.raw_stats() {
            eprintln!(
                "{}",
                dim(&format!("raw: {} words | {} chars", stats.words, stats.chars))
            );
        }
        if let (Some(stats), Some(cmp)) = (report.enhanced_stats(), report.comparison()) {
            eprintln!(
                "{}",
                dim(&format!(
                    "enhanced: {} words | {} chars  ({:+} chars, {:+.1}%)",
                    stats.words, stats.chars, cmp.char_delta, cmp.percent_change
                ))
            );
            if compare {
                eprintln!("{}", bold("Raw:"));
                eprintln!("{}", preview(raw, PREVIEW_CHARS));
                eprintln!("{}", bold("Enhanced:"));
                eprintln!("{}", preview(text, PREVIEW_CHARS));
            }
        }
    }
    Ok(())
}

fn print_diagnostics(diag: &Diagnostics, language: Language) {
    let yes_no = |ok: bool| if ok { green("yes") } else { red("no") };

    if let Some(ref exe) = diag.executable {
        println!("Executable:        {}", exe.display());
    }
    println!("Tesseract command: {}", diag.ocr_command);
    match (&diag.ocr_version, &diag.ocr_error) {
        (Some(version), _) => println!("Tesseract version: {}", version),
        (None, Some(err)) => println!("Tesseract:         {}", red(err)),
        (None, None) => println!("Tesseract:         {}", red("unknown")),
    }
    if !diag.ocr_languages.is_empty() {
        println!("Language packs:    {}", diag.ocr_languages.join(", "));
    }
    let missing = diag.missing_languages(language.code());
    if !missing.is_empty() {
        println!(
            "                   {}",
            yellow(&format!("missing for {}: {}", language, missing.join(", ")))
        );
    }
    println!("PDF support:       {}", yes_no(diag.pdf_available));
    if let Some(ref reason) = diag.pdf_reason {
        println!("                   {}", dim(reason));
    }
    println!("API key set:       {}", yes_no(diag.credential_configured));
    if !diag.credential_configured {
        println!(
            "                   {}",
            dim("Pass --api-key or set OPENAI_API_KEY to enable --enhance.")
        );
    }
    println!("API endpoint:      {}", diag.api_base_url);
}

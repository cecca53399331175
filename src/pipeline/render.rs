//! PDF rasterisation: render every page of a PDF to a `DynamicImage`.
//!
//! PDF support is optional. The crate may be built without the `pdf` feature,
//! or the pdfium shared library may be missing at runtime. Both cases are
//! detected once, up front, and recorded as [`PdfSupport::Unavailable`] so
//! that image inputs keep working and PDF inputs get a clear error.
//!
//! Pages are sized from the configured DPI (PDF user space is 72 points per
//! inch) and the longest edge is capped at `max_rendered_pixels`, which keeps
//! memory bounded for oversized pages such as posters or plans.

use crate::config::OcrConfig;
use crate::error::ExtractionError;
use image::DynamicImage;
use tracing::warn;

/// Environment variable naming the pdfium shared library (file or directory).
pub const PDFIUM_LIB_ENV: &str = "PDFIUM_LIB_PATH";

/// Turn a PDF document into one image per page, in page order.
pub trait PageRasterizer: Send + Sync {
    fn rasterize(&self, pdf: &[u8]) -> Result<Vec<DynamicImage>, ExtractionError>;
}

/// Whether PDFs can be processed in this build and environment.
pub enum PdfSupport {
    Available(Box<dyn PageRasterizer>),
    Unavailable { reason: String },
}

impl PdfSupport {
    /// Probe for a usable rasteriser according to `config`.
    pub fn detect(config: &OcrConfig) -> Self {
        #[cfg(feature = "pdf")]
        {
            match PdfiumRasterizer::bind(
                config.pdfium_lib_path.as_deref(),
                config.dpi,
                config.max_rendered_pixels,
            ) {
                Ok(rasterizer) => PdfSupport::Available(Box::new(rasterizer)),
                Err(reason) => {
                    warn!("PDF support disabled: {}", reason);
                    PdfSupport::Unavailable { reason }
                }
            }
        }
        #[cfg(not(feature = "pdf"))]
        {
            let _ = config;
            let reason = "this build was compiled without the `pdf` feature".to_string();
            warn!("PDF support disabled: {}", reason);
            PdfSupport::Unavailable { reason }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, PdfSupport::Available(_))
    }

    /// Why PDFs cannot be processed, if they cannot.
    pub fn reason(&self) -> Option<&str> {
        match self {
            PdfSupport::Available(_) => None,
            PdfSupport::Unavailable { reason } => Some(reason),
        }
    }

    pub(crate) fn rasterize(&self, pdf: &[u8]) -> Result<Vec<DynamicImage>, ExtractionError> {
        match self {
            PdfSupport::Available(r) => r.rasterize(pdf),
            PdfSupport::Unavailable { reason } => Err(ExtractionError::RasterizerUnavailable {
                reason: reason.clone(),
            }),
        }
    }
}

impl std::fmt::Debug for PdfSupport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PdfSupport::Available(_) => f.write_str("PdfSupport::Available"),
            PdfSupport::Unavailable { reason } => f
                .debug_struct("PdfSupport::Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}

/// Pixel size of a page at `dpi`, with the longest edge capped at `max_pixels`.
pub fn target_size(width_pt: f32, height_pt: f32, dpi: u32, max_pixels: u32) -> (u32, u32) {
    let scale = dpi as f32 / 72.0;
    let mut w = (width_pt * scale).round().max(1.0);
    let mut h = (height_pt * scale).round().max(1.0);
    let longest = w.max(h);
    if longest > max_pixels as f32 {
        let shrink = max_pixels as f32 / longest;
        w = (w * shrink).round().max(1.0);
        h = (h * shrink).round().max(1.0);
    }
    (w as u32, h as u32)
}

#[cfg(feature = "pdf")]
pub use pdfium_backend::PdfiumRasterizer;

#[cfg(feature = "pdf")]
mod pdfium_backend {
    use super::{target_size, PageRasterizer, PDFIUM_LIB_ENV};
    use crate::error::ExtractionError;
    use image::DynamicImage;
    use pdfium_render::prelude::*;
    use std::path::{Path, PathBuf};
    use tracing::{debug, info};

    /// Rasteriser backed by a dynamically bound pdfium library.
    pub struct PdfiumRasterizer {
        pdfium: Pdfium,
        dpi: u32,
        max_pixels: u32,
    }

    impl PdfiumRasterizer {
        /// Bind pdfium from `library_path`, else `PDFIUM_LIB_PATH`, else the
        /// system library search path. A directory is searched for the
        /// platform's library file name.
        pub fn bind(library_path: Option<&Path>, dpi: u32, max_pixels: u32) -> Result<Self, String> {
            let explicit = library_path.map(Path::to_path_buf).or_else(|| {
                std::env::var(PDFIUM_LIB_ENV)
                    .ok()
                    .filter(|v| !v.trim().is_empty())
                    .map(PathBuf::from)
            });

            let bindings = match explicit {
                Some(path) => {
                    let file = if path.is_dir() {
                        PathBuf::from(Pdfium::pdfium_platform_library_name_at_path(&path))
                    } else {
                        path
                    };
                    debug!("Binding pdfium from {}", file.display());
                    Pdfium::bind_to_library(&file)
                        .map_err(|e| format!("could not load '{}': {}", file.display(), e))?
                }
                None => Pdfium::bind_to_system_library()
                    .map_err(|e| format!("pdfium library not found on the system path: {}", e))?,
            };

            info!("pdfium bound (render at {} DPI, max edge {} px)", dpi, max_pixels);
            Ok(Self {
                pdfium: Pdfium::new(bindings),
                dpi,
                max_pixels,
            })
        }
    }

    impl PageRasterizer for PdfiumRasterizer {
        fn rasterize(&self, pdf: &[u8]) -> Result<Vec<DynamicImage>, ExtractionError> {
            let document = self
                .pdfium
                .load_pdf_from_byte_slice(pdf, None)
                .map_err(|e| ExtractionError::RenderFailed {
                    detail: format!("could not open PDF: {:?}", e),
                })?;

            let pages = document.pages();
            let total = pages.len() as usize;
            debug!("PDF loaded: {} pages", total);

            let mut images = Vec::with_capacity(total);
            for (idx, page) in pages.iter().enumerate() {
                let (width, height) = target_size(
                    page.width().value,
                    page.height().value,
                    self.dpi,
                    self.max_pixels,
                );
                let config = PdfRenderConfig::new()
                    .set_target_width(width as i32)
                    .set_maximum_height(height as i32);

                let bitmap = page.render_with_config(&config).map_err(|e| {
                    ExtractionError::RenderFailed {
                        detail: format!("page {}: {:?}", idx + 1, e),
                    }
                })?;
                let image = bitmap.as_image();
                debug!(
                    "Rendered page {} → {}x{} px",
                    idx + 1,
                    image.width(),
                    image.height()
                );
                images.push(image);
            }
            Ok(images)
        }
    }
}

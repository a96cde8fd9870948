//! First-page rasterisation via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto the blocking pool so the
//! Tokio worker threads do not stall while a page renders.
//!
//! ## Why cap pixels, not DPI?
//!
//! Statement scans arrive at arbitrary physical sizes. `max_rendered_pixels`
//! caps the longest edge regardless of page size, keeping memory bounded while
//! staying in the resolution range where Tesseract reads body text well.

use crate::error::RasterError;
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Renders the first page of a persisted document to a PNG file.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Render page 1 of the PDF at `pdf_path` and write it to `image_path`.
    async fn rasterize_first_page(&self, pdf_path: &Path, image_path: &Path)
        -> Result<(), RasterError>;
}

/// pdfium-backed implementation of [`Rasterizer`] and
/// [`crate::pipeline::extract::TextExtractor`].
#[derive(Debug, Clone, Default)]
pub struct PdfiumBackend {
    /// Directory containing the pdfium shared library; `None` searches the
    /// system library path.
    library_dir: Option<PathBuf>,
    max_rendered_pixels: u32,
}

impl PdfiumBackend {
    pub fn new(library_dir: Option<PathBuf>, max_rendered_pixels: u32) -> Self {
        Self {
            library_dir,
            max_rendered_pixels: max_rendered_pixels.max(100),
        }
    }

    pub fn from_config(config: &crate::config::AnalyzerConfig) -> Self {
        Self::new(
            config.pdfium_library_path.clone(),
            config.max_rendered_pixels,
        )
    }

    pub(crate) fn library_dir(&self) -> Option<&Path> {
        self.library_dir.as_deref()
    }

    /// Bind to pdfium once to confirm the library can be loaded.
    ///
    /// Called at server startup so a missing library is reported before the
    /// first upload rather than as a per-request 500.
    pub fn check_binding(&self) -> Result<(), String> {
        bind_pdfium(self.library_dir()).map(|_| ())
    }
}

/// Bind to the pdfium library, from `library_dir` if given.
pub(crate) fn bind_pdfium(library_dir: Option<&Path>) -> Result<Pdfium, String> {
    let bindings = match library_dir {
        Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| format!("{e:?}"))?;
    Ok(Pdfium::new(bindings))
}

#[async_trait]
impl Rasterizer for PdfiumBackend {
    async fn rasterize_first_page(
        &self,
        pdf_path: &Path,
        image_path: &Path,
    ) -> Result<(), RasterError> {
        let library_dir = self.library_dir.clone();
        let max_pixels = self.max_rendered_pixels;
        let pdf_path = pdf_path.to_path_buf();
        let image_path = image_path.to_path_buf();

        tokio::task::spawn_blocking(move || {
            render_first_page_blocking(library_dir.as_deref(), &pdf_path, &image_path, max_pixels)
        })
        .await
        .map_err(|e| RasterError::RenderFailed {
            page: 1,
            detail: format!("render task panicked: {e}"),
        })?
    }
}

/// Blocking implementation of first-page rendering.
fn render_first_page_blocking(
    library_dir: Option<&Path>,
    pdf_path: &Path,
    image_path: &Path,
    max_pixels: u32,
) -> Result<(), RasterError> {
    let pdfium = bind_pdfium(library_dir).map_err(RasterError::Binding)?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| RasterError::Load(format!("{e:?}")))?;

    let pages = document.pages();
    if pages.len() == 0 {
        return Err(RasterError::NoPages);
    }

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let page = pages.first().map_err(|e| RasterError::RenderFailed {
        page: 1,
        detail: format!("{e:?}"),
    })?;

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| RasterError::RenderFailed {
            page: 1,
            detail: format!("{e:?}"),
        })?;

    let image = bitmap.as_image();
    debug!("Rendered page 1 → {}x{} px", image.width(), image.height());

    image
        .save_with_format(image_path, image::ImageFormat::Png)
        .map_err(|e| RasterError::WriteFailed(e.to_string()))?;

    info!("Page 1 rasterised to {}", image_path.display());
    Ok(())
}

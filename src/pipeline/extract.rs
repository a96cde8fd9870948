//! Direct text extraction from the document's embedded text layer.
//!
//! Digitally generated statements carry a text layer and never need OCR.
//! Scanned statements parse fine but yield an empty (or whitespace-only)
//! string here, which sends the pipeline down the rasterise → OCR path.

use crate::error::AnalyzerError;
use crate::pipeline::render::{bind_pdfium, PdfiumBackend};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, warn};

/// Reads the embedded text of an uploaded document.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Return the concatenated text of every page.
    ///
    /// An empty string means "parsed, but no text layer". An `Err` means the
    /// document could not be parsed at all.
    async fn extract_text(&self, document: &[u8]) -> Result<String, AnalyzerError>;
}

#[async_trait]
impl TextExtractor for PdfiumBackend {
    async fn extract_text(&self, document: &[u8]) -> Result<String, AnalyzerError> {
        let library_dir = self.library_dir().map(Path::to_path_buf);
        let bytes = document.to_vec();

        tokio::task::spawn_blocking(move || extract_text_blocking(library_dir.as_deref(), &bytes))
            .await
            .map_err(|e| AnalyzerError::Internal(format!("Extraction task panicked: {e}")))?
    }
}

/// Blocking implementation of text-layer extraction.
fn extract_text_blocking(library_dir: Option<&Path>, bytes: &[u8]) -> Result<String, AnalyzerError> {
    let pdfium = bind_pdfium(library_dir).map_err(AnalyzerError::PdfiumBindingFailed)?;

    let document = pdfium.load_pdf_from_byte_slice(bytes, None).map_err(|e| {
        let err_str = format!("{e:?}");
        if err_str.contains("Password") || err_str.contains("password") {
            AnalyzerError::CorruptPdf {
                detail: "document is password-protected".to_string(),
            }
        } else {
            AnalyzerError::CorruptPdf { detail: err_str }
        }
    })?;

    let mut text = String::new();
    for (idx, page) in document.pages().iter().enumerate() {
        match page.text() {
            Ok(page_text) => {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&page_text.all());
            }
            Err(e) => warn!("Page {}: text layer unreadable: {:?}", idx + 1, e),
        }
    }

    debug!("Text layer: {} chars from {} bytes", text.len(), bytes.len());
    Ok(text)
}

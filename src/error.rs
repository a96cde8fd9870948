//! Error types for the merchant-analyzer library.
//!
//! Two kinds of failure reach the caller of an upload:
//!
//! * [`AnalyzerError::NoReadableText`] — the document parsed, but neither its
//!   text layer nor OCR produced anything. The user has to supply a clearer or
//!   text-based document (HTTP 400).
//! * Every other [`AnalyzerError`] — an unexpected failure whose message is
//!   passed through to the client (HTTP 500).
//!
//! [`RasterError`] is not part of [`AnalyzerError`]: a page
//! that cannot be rasterised is logged and the pipeline continues to the
//! empty-text check, which produces the user-facing error.

use thiserror::Error;

/// Message returned to clients when no text could be recovered.
pub const NO_READABLE_TEXT_MESSAGE: &str =
    "No readable text found in the PDF. Ensure it is text-based or a clearer scanned image.";

/// All fatal errors returned by the analysis pipeline.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    // ── Client errors ─────────────────────────────────────────────────────
    /// Neither the text layer nor OCR yielded any text.
    #[error("{}", NO_READABLE_TEXT_MESSAGE)]
    NoReadableText,

    // ── Upload errors ─────────────────────────────────────────────────────
    /// The multipart request carried no file under the expected field.
    #[error("No file uploaded in form field '{field}'")]
    MissingUpload { field: String },

    /// The multipart stream could not be read.
    #[error("Failed to read upload: {0}")]
    UploadRead(String),

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The document could not be parsed at all.
    #[error("Invalid PDF structure: {detail}")]
    CorruptPdf { detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH to the directory containing libpdfium."
    )]
    PdfiumBindingFailed(String),

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR engine ran (rasterisation succeeded) but failed.
    #[error(transparent)]
    Ocr(#[from] OcrError),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Writing the temporary copy of the upload failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalyzerError {
    /// HTTP status for this error: 400 for unreadable documents, 500 otherwise.
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::NoReadableText => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// `true` when the caller supplied a document we cannot read.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NoReadableText)
    }
}

/// A non-fatal rasterisation failure.
///
/// Swallowed by the fallback chain: OCR is skipped and the empty-text check
/// decides the response.
#[derive(Debug, Clone, Error)]
pub enum RasterError {
    /// pdfium could not open the persisted document.
    #[error("could not load document for rendering: {0}")]
    Load(String),

    /// The document has no pages to render.
    #[error("document has no pages")]
    NoPages,

    /// pdfium failed while rendering the page.
    #[error("page {page}: rendering failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The rendered bitmap could not be written as PNG.
    #[error("could not write page image: {0}")]
    WriteFailed(String),

    /// pdfium was unavailable for rendering.
    #[error("pdfium unavailable: {0}")]
    Binding(String),
}

/// OCR engine failures.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine '{engine}' is not available: {detail}")]
    EngineUnavailable { engine: String, detail: String },

    #[error("OCR processing failed: {0}")]
    ProcessingFailed(String),

    #[error("Failed to read page image '{path}': {detail}")]
    ImageRead { path: String, detail: String },
}

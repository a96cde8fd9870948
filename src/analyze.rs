//! Statement analysis: the text-extraction fallback chain plus the LLM call.
//!
//! [`Analyzer`] owns one instance of each collaborator behind a trait object
//! and is shared immutably between request handlers. A request never mutates
//! it, so no locking is involved.
//!
//! ```text
//! bytes ─▶ text layer ─▶ normalise ─┬─ non-empty ─────────────────────┐
//!                                   └─ empty ─▶ temp dir ─▶ page 1 PNG │
//!                                              ─▶ OCR ─▶ normalise ────┤
//!                                                                      ▼
//!                                         empty? ─▶ NoReadableText   LLM ─▶ trim
//! ```

use crate::config::{AnalyzerConfig, OcrBackend};
use crate::error::AnalyzerError;
use crate::output::{AnalysisOutput, AnalysisStats, ExtractedText, TextSource};
use crate::pipeline::extract::TextExtractor;
use crate::pipeline::llm::{CompletionProvider, CompletionRequest, LlmCompletion};
use crate::pipeline::normalize::normalize_text;
use crate::pipeline::ocr::{OcrEngine, TesseractOcr, VisionOcr};
use crate::pipeline::render::{PdfiumBackend, Rasterizer};
use crate::prompts::statement_message;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// File name of the persisted upload inside the per-request temp dir.
const TEMP_PDF_NAME: &str = "statement.pdf";
/// File name of the rendered first page inside the per-request temp dir.
const TEMP_IMAGE_NAME: &str = "page-1.png";
/// Prefix for per-request temporary directories.
const TEMP_DIR_PREFIX: &str = "merchant-analyzer-";

/// Runs the extraction fallback chain and the analysis request.
pub struct Analyzer {
    config: AnalyzerConfig,
    extractor: Arc<dyn TextExtractor>,
    rasterizer: Arc<dyn Rasterizer>,
    ocr: Arc<dyn OcrEngine>,
    completion: Arc<dyn CompletionProvider>,
}

impl Analyzer {
    /// Assemble an analyzer from explicit collaborators.
    pub fn new(
        config: AnalyzerConfig,
        extractor: Arc<dyn TextExtractor>,
        rasterizer: Arc<dyn Rasterizer>,
        ocr: Arc<dyn OcrEngine>,
        completion: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            config,
            extractor,
            rasterizer,
            ocr,
            completion,
        }
    }

    /// Build the production analyzer: pdfium for text and rendering, the
    /// configured OCR engine, and the resolved edgequake-llm provider.
    pub fn from_config(config: AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let pdfium = Arc::new(PdfiumBackend::from_config(&config));
        let llm = LlmCompletion::from_config(&config)?;

        let ocr: Arc<dyn OcrEngine> = match config.ocr_backend {
            OcrBackend::Tesseract => Arc::new(TesseractOcr::new(config.tesseract_binary.clone())),
            OcrBackend::Vision => Arc::new(VisionOcr::new(Arc::clone(llm.provider()))),
        };

        info!(
            "Analyzer ready: model={}, ocr={}",
            config.model.as_deref().unwrap_or("<provider default>"),
            ocr.name()
        );

        Ok(Self::new(
            config,
            pdfium.clone(),
            pdfium,
            ocr,
            Arc::new(llm),
        ))
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyse an uploaded statement end to end.
    ///
    /// # Errors
    /// - [`AnalyzerError::NoReadableText`] when neither the text layer nor
    ///   OCR yields text
    /// - any other variant for unexpected failures (unparseable document,
    ///   OCR engine failure, LLM API error)
    pub async fn analyze(&self, document: &[u8]) -> Result<AnalysisOutput, AnalyzerError> {
        let extraction_start = Instant::now();
        let extracted = self.extract_text(document).await?;
        let extraction_duration_ms = extraction_start.elapsed().as_millis() as u64;

        let llm_start = Instant::now();
        let request = self.build_request(&extracted.text);
        let completion = self.completion.complete(&request).await?;
        let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

        let analysis = completion.content.trim().to_string();

        let stats = AnalysisStats {
            text_chars: extracted.text.chars().count(),
            extraction_duration_ms,
            llm_duration_ms,
            input_tokens: completion.prompt_tokens,
            output_tokens: completion.completion_tokens,
        };

        info!(
            source = ?extracted.source,
            text_chars = stats.text_chars,
            extraction_ms = stats.extraction_duration_ms,
            llm_ms = stats.llm_duration_ms,
            "Analysis complete"
        );

        Ok(AnalysisOutput {
            analysis,
            text_source: extracted.source,
            stats,
        })
    }

    /// Recover non-empty text from the document, falling back to OCR.
    pub async fn extract_text(&self, document: &[u8]) -> Result<ExtractedText, AnalyzerError> {
        let embedded = normalize_text(&self.extractor.extract_text(document).await?);
        info!("Text layer: {} chars", embedded.len());
        debug!("Extracted text: {}", embedded);

        if !embedded.is_empty() {
            return Ok(ExtractedText {
                text: embedded,
                source: TextSource::Embedded,
            });
        }

        info!("No text layer found, rasterising page 1 for OCR");
        let ocr_text = self.ocr_first_page(document).await?;
        let ocr_text = normalize_text(&ocr_text);
        info!("OCR text: {} chars", ocr_text.len());
        debug!("OCR extracted text: {}", ocr_text);

        if ocr_text.is_empty() {
            return Err(AnalyzerError::NoReadableText);
        }

        Ok(ExtractedText {
            text: ocr_text,
            source: TextSource::Ocr,
        })
    }

    /// Persist the upload to a fresh temp dir, rasterise page 1 and OCR it.
    ///
    /// Returns an empty string when rasterisation fails. The temp dir is
    /// removed before returning on every path.
    async fn ocr_first_page(&self, document: &[u8]) -> Result<String, AnalyzerError> {
        let temp_dir = tempfile::Builder::new()
            .prefix(TEMP_DIR_PREFIX)
            .tempdir()?;

        let result = self.ocr_in_dir(temp_dir.path(), document).await;
        remove_temp_dir(temp_dir);
        result
    }

    async fn ocr_in_dir(&self, dir: &Path, document: &[u8]) -> Result<String, AnalyzerError> {
        let pdf_path = dir.join(TEMP_PDF_NAME);
        let image_path = dir.join(TEMP_IMAGE_NAME);

        tokio::fs::write(&pdf_path, document).await?;

        if let Err(e) = self
            .rasterizer
            .rasterize_first_page(&pdf_path, &image_path)
            .await
        {
            warn!("Error during PDF-to-image conversion: {}", e);
            return Ok(String::new());
        }

        info!("Page 1 rendered, running {} OCR", self.ocr.name());
        let text = self
            .ocr
            .recognize(&image_path, &self.config.ocr_language)
            .await?;
        Ok(text)
    }

    fn build_request(&self, text: &str) -> CompletionRequest {
        CompletionRequest {
            system_prompt: self.config.effective_system_prompt().to_string(),
            user_message: statement_message(text),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }
}

/// Delete a request's temp dir, logging rather than surfacing failures.
fn remove_temp_dir(temp_dir: TempDir) {
    let path = temp_dir.path().to_path_buf();
    if let Err(e) = temp_dir.close() {
        warn!("Failed to remove temporary files in {}: {}", path.display(), e);
    }
}

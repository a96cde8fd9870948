//! Request-scoped values produced by the pipeline.
//!
//! Nothing here outlives a single upload: the extracted text feeds the
//! analysis request and the [`AnalysisOutput`] is handed back to the caller.

use serde::{Deserialize, Serialize};

/// Where the extracted text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSource {
    /// The document's embedded text layer.
    Embedded,
    /// OCR of the rasterised first page.
    Ocr,
}

/// Non-empty text recovered from an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    pub source: TextSource,
}

/// Timing and token statistics for one analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Characters of text sent to the LLM.
    pub text_chars: usize,
    /// Wall-clock time spent recovering text (including OCR), in ms.
    pub extraction_duration_ms: u64,
    /// Wall-clock time of the completion request, in ms.
    pub llm_duration_ms: u64,
    /// Prompt tokens reported by the provider.
    pub input_tokens: usize,
    /// Completion tokens reported by the provider.
    pub output_tokens: usize,
}

/// The result of analysing one statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    /// The LLM's Markdown summary, trimmed of surrounding whitespace.
    pub analysis: String,
    /// How the statement text was obtained.
    pub text_source: TextSource,
    pub stats: AnalysisStats,
}

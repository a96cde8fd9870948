//! # merchant-analyzer
//!
//! Summarise merchant processing statements with an LLM.
//!
//! An uploaded statement is reduced to text — from its embedded text layer
//! when it has one, otherwise by rasterising the first page and running OCR —
//! and that text is sent to a chat-completion model with a fixed
//! financial-analysis prompt. The model's Markdown table is returned verbatim.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload
//!  │
//!  ├─ 1. Extract   pdfium text layer (spawn_blocking)
//!  ├─ 2. Fallback  empty? → per-request temp dir → render page 1 → OCR
//!  ├─ 3. Check     still empty? → 400 "no readable text"
//!  ├─ 4. Analyse   one chat completion (temperature 0.3, 750 tokens)
//!  └─ 5. Respond   {success: true, analysis}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use merchant_analyzer::{Analyzer, AnalyzerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / EDGEQUAKE_LLM_PROVIDER
//!     let analyzer = Analyzer::from_config(AnalyzerConfig::default())?;
//!     let bytes = std::fs::read("statement.pdf")?;
//!     let output = analyzer.analyze(&bytes).await?;
//!     println!("{}", output.analysis);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `merchant-analyzer` binary (clap + anyhow + tracing-subscriber + dotenvy) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::Analyzer;
pub use config::{AnalyzerConfig, AnalyzerConfigBuilder, OcrBackend};
pub use error::{AnalyzerError, OcrError, RasterError, NO_READABLE_TEXT_MESSAGE};
pub use output::{AnalysisOutput, AnalysisStats, ExtractedText, TextSource};
pub use pipeline::extract::TextExtractor;
pub use pipeline::llm::{Completion, CompletionProvider, CompletionRequest, LlmCompletion};
pub use pipeline::ocr::{OcrEngine, TesseractOcr, VisionOcr};
pub use pipeline::render::{PdfiumBackend, Rasterizer};
pub use server::{router, serve, AppState, ServerOptions};

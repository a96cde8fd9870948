//! OCR engines for pages without a text layer.
//!
//! Two engines implement [`OcrEngine`]:
//!
//! * [`TesseractOcr`] — shells out to the `tesseract` CLI and reads the
//!   recognised text from stdout. No temporary output files are created.
//! * [`VisionOcr`] — sends the page PNG to a vision-capable LLM through
//!   edgequake-llm and asks for a verbatim transcription.
//!
//! Engines receive the path of the rendered page image; they never see the
//! uploaded document itself.

use crate::error::OcrError;
use crate::pipeline::encode;
use crate::prompts::vision_ocr_prompt;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tracing::debug;

/// Recognises text in a rendered page image.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &'static str;

    /// Recognise the text in the image at `image_path`.
    async fn recognize(&self, image_path: &Path, language: &str) -> Result<String, OcrError>;
}

// ── Tesseract ────────────────────────────────────────────────────────────────

/// The `tesseract` command-line OCR engine.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: PathBuf,
}

impl TesseractOcr {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    async fn recognize(&self, image_path: &Path, language: &str) -> Result<String, OcrError> {
        if !image_path.exists() {
            return Err(OcrError::ImageRead {
                path: image_path.display().to_string(),
                detail: "file does not exist".to_string(),
            });
        }

        // `stdout` as the output base makes tesseract print instead of writing a file.
        let output = tokio::process::Command::new(&self.binary)
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(language)
            .arg("--psm")
            .arg("3")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| OcrError::EngineUnavailable {
                engine: self.binary.display().to_string(),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ProcessingFailed(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("tesseract recognised {} chars", text.len());
        Ok(text)
    }
}

// ── Vision LLM ───────────────────────────────────────────────────────────────

/// OCR through a vision-capable LLM.
#[derive(Clone)]
pub struct VisionOcr {
    provider: Arc<dyn LLMProvider>,
    max_tokens: usize,
}

impl VisionOcr {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            max_tokens: 4096,
        }
    }
}

#[async_trait]
impl OcrEngine for VisionOcr {
    fn name(&self) -> &'static str {
        "vision"
    }

    async fn recognize(&self, image_path: &Path, language: &str) -> Result<String, OcrError> {
        let png = tokio::fs::read(image_path)
            .await
            .map_err(|e| OcrError::ImageRead {
                path: image_path.display().to_string(),
                detail: e.to_string(),
            })?;

        let image_data = encode::encode_png(&png).map_err(|e| OcrError::ImageRead {
            path: image_path.display().to_string(),
            detail: e.to_string(),
        })?;

        let messages = vec![ChatMessage::user_with_images(
            &vision_ocr_prompt(language),
            vec![image_data],
        )];

        // Transcription wants no creativity at all.
        let options = CompletionOptions {
            temperature: Some(0.0),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| OcrError::ProcessingFailed(format!("vision model: {e}")))?;

        debug!(
            "vision OCR: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

//! Configuration types for statement analysis.
//!
//! All pipeline behaviour is controlled through [`AnalyzerConfig`], built via
//! its [`AnalyzerConfigBuilder`]. Every knob lives in one struct so a config
//! can be shared across request handlers and logged as a whole at startup.

use crate::error::AnalyzerError;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Default LLM model when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Configuration for the analysis pipeline.
///
/// # Example
/// ```rust
/// use merchant_analyzer::{AnalyzerConfig, OcrBackend};
///
/// let config = AnalyzerConfig::builder()
///     .model("gpt-4o")
///     .ocr_backend(OcrBackend::Tesseract)
///     .ocr_language("eng")
///     .build()
///     .unwrap();
/// assert_eq!(config.max_tokens, 750);
/// ```
#[derive(Clone)]
pub struct AnalyzerConfig {
    /// LLM model identifier, e.g. "gpt-4o".
    /// If None, the provider default (or [`DEFAULT_MODEL`]) is used.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the analysis completion. Default: 0.3.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate for the summary table. Default: 750.
    pub max_tokens: usize,

    /// Custom system prompt. If None, uses [`crate::prompts::DEFAULT_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Which OCR engine reads rasterised pages. Default: [`OcrBackend::Tesseract`].
    pub ocr_backend: OcrBackend,

    /// OCR language code (Tesseract syntax, e.g. "eng", "eng+fra"). Default: "eng".
    pub ocr_language: String,

    /// Name or path of the Tesseract executable. Default: "tesseract".
    pub tesseract_binary: PathBuf,

    /// Maximum rendered image dimension in pixels for the OCR page. Default: 2000.
    ///
    /// Caps the longest edge regardless of the page's physical size so a
    /// poster-sized scan cannot exhaust memory.
    pub max_rendered_pixels: u32,

    /// Directory containing the pdfium shared library.
    /// If None, the system library search path is used.
    pub pdfium_library_path: Option<PathBuf>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.3,
            max_tokens: 750,
            system_prompt: None,
            ocr_backend: OcrBackend::default(),
            ocr_language: "eng".to_string(),
            tesseract_binary: PathBuf::from("tesseract"),
            max_rendered_pixels: 2000,
            pdfium_library_path: None,
        }
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field("ocr_backend", &self.ocr_backend)
            .field("ocr_language", &self.ocr_language)
            .field("tesseract_binary", &self.tesseract_binary)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("pdfium_library_path", &self.pdfium_library_path)
            .finish()
    }
}

impl AnalyzerConfig {
    /// Create a new builder for `AnalyzerConfig`.
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder {
            config: Self::default(),
        }
    }

    /// The system prompt in effect: the override if set, else the built-in default.
    pub fn effective_system_prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .unwrap_or(crate::prompts::DEFAULT_SYSTEM_PROMPT)
    }
}

/// Builder for [`AnalyzerConfig`].
#[derive(Debug)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn ocr_backend(mut self, backend: OcrBackend) -> Self {
        self.config.ocr_backend = backend;
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn tesseract_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tesseract_binary = path.into();
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn pdfium_library_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(dir.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalyzerConfig, AnalyzerError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(AnalyzerError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.ocr_language.trim().is_empty() {
            return Err(AnalyzerError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        if matches!(c.system_prompt.as_deref(), Some(p) if p.trim().is_empty()) {
            return Err(AnalyzerError::InvalidConfig(
                "System prompt override must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// OCR engine used for pages without an embedded text layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackend {
    /// The `tesseract` command-line engine. (default)
    #[default]
    Tesseract,
    /// The configured vision-capable LLM transcribes the page image.
    Vision,
}

impl FromStr for OcrBackend {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tesseract" => Ok(Self::Tesseract),
            "vision" | "llm" => Ok(Self::Vision),
            other => Err(AnalyzerError::InvalidConfig(format!(
                "Unknown OCR backend '{other}' (expected 'tesseract' or 'vision')"
            ))),
        }
    }
}

impl fmt::Display for OcrBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tesseract => f.write_str("tesseract"),
            Self::Vision => f.write_str("vision"),
        }
    }
}

//! Pipeline stages for statement analysis.
//!
//! Each submodule implements exactly one step. The three external
//! collaborators (pdfium, the OCR engine, the LLM) each sit behind a trait so
//! [`crate::analyze::Analyzer`] can be driven with fakes in tests.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ normalize ──(empty)──▶ render ──▶ ocr ──▶ normalize ──▶ llm
//! (text layer)              (page 1 → PNG)  (tesseract/vision)    (summary)
//! ```
//!
//! 1. [`extract`]   — read the embedded text layer via pdfium
//! 2. [`normalize`] — deterministic cleanup so invisible-only text counts as empty
//! 3. [`render`]    — rasterise the first page; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 4. [`ocr`]       — recognise text in the rendered page image
//! 5. [`encode`]    — base64-wrap the page PNG for the vision OCR engine
//! 6. [`llm`]       — the single completion request; the only stage whose
//!    output reaches the client

pub mod encode;
pub mod extract;
pub mod llm;
pub mod normalize;
pub mod ocr;
pub mod render;

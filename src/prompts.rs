//! Prompts sent to the LLM.
//!
//! The analysis prompt is the only domain knowledge in the service, so it
//! lives here as a single constant that deployments can replace through
//! [`crate::config::AnalyzerConfig::system_prompt`].

/// Default system prompt for summarising a merchant processing statement.
///
/// Used when `AnalyzerConfig::system_prompt` is `None`.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert in financial analysis. \
Extract key insights from the following invoice and present the results as a **Markdown table**. \
The table must include: Card Type (Visa, MasterCard, Amex, Other), Transactions, Transaction Volume, \
IC+ Fees, Markup Fees, Chargebacks, IC+ %, and Markup %. \
Use \"Other\" instead of Interac, add a Totals row, format amounts as $XXX,XXX.XX, \
percentages as X.XX%, and return only **pure Markdown**, no explanations.";

/// Prefix of the user message that carries the extracted statement text.
pub const STATEMENT_TEXT_PREFIX: &str = "Here is the invoice text:\n";

/// Instruction given to a vision model when it is used as the OCR engine.
pub const VISION_OCR_PROMPT: &str = "Extract all text from this image exactly as written. \
Preserve line breaks and the order of table columns. \
Return only the extracted text, nothing else.";

/// Build the user message for the analysis request.
pub fn statement_message(text: &str) -> String {
    format!("{STATEMENT_TEXT_PREFIX}{text}")
}

/// Build the vision OCR instruction, with an optional language hint.
pub fn vision_ocr_prompt(language: &str) -> String {
    if language.is_empty() {
        VISION_OCR_PROMPT.to_string()
    } else {
        format!("{VISION_OCR_PROMPT} The text language code is '{language}'.")
    }
}

//! HTTP contract tests for the upload API.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`; every
//! collaborator of the analyzer is a fake, so these run without pdfium,
//! Tesseract or an API key.

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use merchant_analyzer::server::{AnalysisResponse, ErrorResponse, LIVENESS_MESSAGE, UPLOAD_FIELD};
use merchant_analyzer::{
    router, Analyzer, AnalyzerConfig, AnalyzerError, AppState, Completion, CompletionProvider,
    CompletionRequest, OcrEngine, OcrError, RasterError, Rasterizer, ServerOptions, TextExtractor,
    NO_READABLE_TEXT_MESSAGE,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const BOUNDARY: &str = "merchant-test-boundary";

// ── Fakes ────────────────────────────────────────────────────────────────────

struct FixedText(&'static str);

#[async_trait]
impl TextExtractor for FixedText {
    async fn extract_text(&self, _document: &[u8]) -> Result<String, AnalyzerError> {
        Ok(self.0.to_string())
    }
}

struct UnparseableDocument;

#[async_trait]
impl TextExtractor for UnparseableDocument {
    async fn extract_text(&self, _document: &[u8]) -> Result<String, AnalyzerError> {
        Err(AnalyzerError::CorruptPdf {
            detail: "header not found".to_string(),
        })
    }
}

struct BlankPage;

#[async_trait]
impl Rasterizer for BlankPage {
    async fn rasterize_first_page(
        &self,
        _pdf_path: &Path,
        image_path: &Path,
    ) -> Result<(), RasterError> {
        std::fs::write(image_path, b"png").map_err(|e| RasterError::WriteFailed(e.to_string()))
    }
}

struct FixedOcr(&'static str);

#[async_trait]
impl OcrEngine for FixedOcr {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn recognize(&self, _image_path: &Path, _language: &str) -> Result<String, OcrError> {
        Ok(self.0.to_string())
    }
}

/// Records the requests it receives and answers with a canned reply.
struct ScriptedCompletion {
    reply: Result<&'static str, &'static str>,
    requests: Mutex<Vec<CompletionRequest>>,
    calls: AtomicUsize,
}

impl ScriptedCompletion {
    fn replying(reply: &'static str) -> Self {
        Self {
            reply: Ok(reply),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(message: &'static str) -> Self {
        Self {
            reply: Err(message),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AnalyzerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        match self.reply {
            Ok(content) => Ok(Completion {
                content: content.to_string(),
                prompt_tokens: 120,
                completion_tokens: 40,
            }),
            Err(message) => Err(AnalyzerError::LlmApiError {
                message: message.to_string(),
            }),
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("merchant_analyzer=debug")
        .try_init();
}

fn app(
    extractor: Arc<dyn TextExtractor>,
    ocr: Arc<dyn OcrEngine>,
    completion: Arc<ScriptedCompletion>,
) -> Router {
    init_tracing();
    let analyzer = Analyzer::new(
        AnalyzerConfig::default(),
        extractor,
        Arc::new(BlankPage),
        ocr,
        completion,
    );
    router(AppState::new(Arc::new(analyzer)), &ServerOptions::default())
}

fn multipart_body(field: &str, filename: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(field: &str, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(field, "statement.pdf", data)))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

// ── Liveness ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn root_reports_liveness() {
    let app = app(
        Arc::new(FixedText("")),
        Arc::new(FixedOcr("")),
        Arc::new(ScriptedCompletion::replying("")),
    );

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await;
    assert_eq!(String::from_utf8(body).unwrap(), LIVENESS_MESSAGE);
}

// ── Upload ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn text_statement_returns_trimmed_analysis() {
    let completion = Arc::new(ScriptedCompletion::replying(
        "\n| Card Type | Transactions |\n|---|---|\n| Visa | 12 |\n\n",
    ));
    let app = app(
        Arc::new(FixedText("Visa 12 $1,200.00\nTotal fees $31.50")),
        Arc::new(FixedOcr("unused")),
        completion.clone(),
    );

    let response = app
        .oneshot(upload_request(UPLOAD_FIELD, b"%PDF-1.7"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: AnalysisResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(body.success);
    assert_eq!(
        body.analysis,
        "| Card Type | Transactions |\n|---|---|\n| Visa | 12 |"
    );

    let requests = completion.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].user_message,
        "Here is the invoice text:\nVisa 12 $1,200.00\nTotal fees $31.50"
    );
    assert_eq!(requests[0].temperature, 0.3);
    assert_eq!(requests[0].max_tokens, 750);
}

#[tokio::test]
async fn scanned_statement_is_analysed_from_ocr_text() {
    let completion = Arc::new(ScriptedCompletion::replying("| Amex | 3 |"));
    let app = app(
        Arc::new(FixedText("")),
        Arc::new(FixedOcr("Amex 3 $90.00\n")),
        completion.clone(),
    );

    let response = app
        .oneshot(upload_request(UPLOAD_FIELD, b"%PDF-1.4 scanned"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let requests = completion.requests.lock().unwrap();
    assert_eq!(
        requests[0].user_message,
        "Here is the invoice text:\nAmex 3 $90.00"
    );
}

#[tokio::test]
async fn unreadable_statement_is_rejected_without_llm_call() {
    let completion = Arc::new(ScriptedCompletion::replying("unused"));
    let app = app(
        Arc::new(FixedText("  \n ")),
        Arc::new(FixedOcr("\u{200B}\n")),
        completion.clone(),
    );

    let response = app
        .oneshot(upload_request(UPLOAD_FIELD, b"%PDF-1.4"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(!body.success);
    assert_eq!(body.error, NO_READABLE_TEXT_MESSAGE);
    assert_eq!(completion.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn llm_failure_is_internal_error_with_message() {
    let app = app(
        Arc::new(FixedText("Visa 1 $1.00")),
        Arc::new(FixedOcr("unused")),
        Arc::new(ScriptedCompletion::failing("rate limit exceeded")),
    );

    let response = app
        .oneshot(upload_request(UPLOAD_FIELD, b"%PDF-1.7"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(!body.success);
    assert!(
        body.error.contains("rate limit exceeded"),
        "error should carry the provider message, got {:?}",
        body.error
    );
}

#[tokio::test]
async fn corrupt_document_is_internal_error() {
    let completion = Arc::new(ScriptedCompletion::replying("unused"));
    let app = app(
        Arc::new(UnparseableDocument),
        Arc::new(FixedOcr("unused")),
        completion.clone(),
    );

    let response = app
        .oneshot(upload_request(UPLOAD_FIELD, b"not a pdf"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(!body.success);
    assert!(!body.error.is_empty());
    assert_eq!(completion.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_upload_field_is_internal_error() {
    let completion = Arc::new(ScriptedCompletion::replying("unused"));
    let app = app(
        Arc::new(FixedText("Visa 1 $1.00")),
        Arc::new(FixedOcr("unused")),
        completion.clone(),
    );

    let response = app
        .oneshot(upload_request("somethingElse", b"%PDF-1.7"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(!body.success);
    assert!(body.error.contains(UPLOAD_FIELD));
    assert_eq!(completion.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn upload_over_size_limit_is_rejected() {
    init_tracing();
    let analyzer = Analyzer::new(
        AnalyzerConfig::default(),
        Arc::new(FixedText("Visa 1 $1.00")),
        Arc::new(BlankPage),
        Arc::new(FixedOcr("unused")),
        Arc::new(ScriptedCompletion::replying("unused")),
    );
    let app = router(
        AppState::new(Arc::new(analyzer)),
        &ServerOptions {
            max_upload_bytes: 64,
        },
    );

    let response = app
        .oneshot(upload_request(UPLOAD_FIELD, &[b'x'; 4096]))
        .await
        .unwrap();

    assert_ne!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn concurrent_uploads_are_independent() {
    let completion = Arc::new(ScriptedCompletion::replying("| Visa | 1 |"));
    let app = app(
        Arc::new(FixedText("")),
        Arc::new(FixedOcr("Visa 1 $1.00")),
        completion.clone(),
    );

    let (left, right) = tokio::join!(
        app.clone().oneshot(upload_request(UPLOAD_FIELD, b"%PDF-a")),
        app.clone().oneshot(upload_request(UPLOAD_FIELD, b"%PDF-b")),
    );
    let left = tokio_test::assert_ok!(left);
    let right = tokio_test::assert_ok!(right);

    assert_eq!(left.status(), StatusCode::OK);
    assert_eq!(right.status(), StatusCode::OK);
    assert_eq!(completion.calls.load(Ordering::SeqCst), 2);
}

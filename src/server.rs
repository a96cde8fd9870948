//! HTTP surface: a liveness route and the upload-and-analyze endpoint.
//!
//! Endpoints:
//! - `GET /`       — plain-text liveness message
//! - `POST /upload` — multipart field `merchantStatement`; responds with
//!   `{success, analysis}` or `{success: false, error}`

use crate::analyze::Analyzer;
use crate::error::AnalyzerError;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, warn, Instrument};

/// Multipart field carrying the uploaded statement.
pub const UPLOAD_FIELD: &str = "merchantStatement";

/// Body of `GET /`.
pub const LIVENESS_MESSAGE: &str = "Merchant Analysis API is running!";

/// Default upload size limit (25 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

// ============================================================================
// State
// ============================================================================

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    analyzer: Arc<Analyzer>,
}

impl AppState {
    pub fn new(analyzer: Arc<Analyzer>) -> Self {
        Self { analyzer }
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Successful `POST /upload` body.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub analysis: String,
}

/// Failed `POST /upload` body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl IntoResponse for AnalyzerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Error processing upload: {}", self);
        } else {
            warn!("Rejected upload: {}", self);
        }

        let body = Json(ErrorResponse {
            success: false,
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Router options that are not part of the analysis itself.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub max_upload_bytes: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState, options: &ServerOptions) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(liveness))
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(options.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /
async fn liveness() -> &'static str {
    LIVENESS_MESSAGE
}

/// POST /upload
///
/// Reads the statement from the multipart body and runs the full analysis.
async fn upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AnalyzerError> {
    let request_id = uuid::Uuid::new_v4();
    let span = info_span!("upload", %request_id);

    async move {
        let document = read_upload(multipart).await?;
        info!(bytes = document.len(), "Statement received");

        let output = state.analyzer().analyze(&document).await?;

        Ok(Json(AnalysisResponse {
            success: true,
            analysis: output.analysis,
        }))
    }
    .instrument(span)
    .await
}

/// Pull the bytes of the [`UPLOAD_FIELD`] part out of the multipart body.
async fn read_upload(mut multipart: Multipart) -> Result<Vec<u8>, AnalyzerError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AnalyzerError::UploadRead(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            tracing::debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }

        tracing::debug!(
            "Upload field: filename={:?}, content_type={:?}",
            field.file_name(),
            field.content_type()
        );

        let data = field
            .bytes()
            .await
            .map_err(|e| AnalyzerError::UploadRead(e.to_string()))?;
        return Ok(data.to_vec());
    }

    Err(AnalyzerError::MissingUpload {
        field: UPLOAD_FIELD.to_string(),
    })
}

// ============================================================================
// Serve loop
// ============================================================================

/// Bind `addr` and serve until Ctrl-C / SIGTERM.
pub async fn serve(addr: SocketAddr, app: Router) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Server is listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

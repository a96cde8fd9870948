//! CLI binary for merchant-analyzer.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalyzerConfig` and either serves the HTTP API or analyses one file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use merchant_analyzer::{
    router, serve, Analyzer, AnalyzerConfig, AppState, OcrBackend, PdfiumBackend, ServerOptions,
};
use std::io::{self, Write};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve the HTTP API on port 3000
  merchant-analyzer

  # Serve on another port with the vision OCR engine
  merchant-analyzer --port 8080 --ocr-backend vision serve

  # Analyse a statement once and print the Markdown table
  merchant-analyzer analyze statement.pdf

  # Full output (text source, timings, tokens) as JSON
  merchant-analyzer analyze --json statement.pdf

HTTP API:
  GET  /         liveness message
  POST /upload   multipart field "merchantStatement"
                 → {"success": true, "analysis": "<markdown>"}
                 → 400 {"success": false, "error": "No readable text found ..."}
                 → 500 {"success": false, "error": "<message>"}

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Directory containing libpdfium
  RUST_LOG                Log filter (overrides --verbose / --quiet)

  A .env file in the working directory is loaded on startup.
"#;

/// Summarise merchant processing statements with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "merchant-analyzer",
    version,
    about = "Summarise merchant processing statements with an LLM",
    long_about = "Extracts the text of an uploaded merchant statement (falling back to OCR for \
scanned documents) and asks an LLM for a per-card-type fee summary table. Runs as an HTTP \
service by default.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Address to bind the HTTP server to.
    #[arg(long, env = "HOST", default_value = "0.0.0.0", global = true)]
    host: IpAddr,

    /// Port for the HTTP server.
    #[arg(short, long, env = "PORT", default_value_t = 3000, global = true)]
    port: u16,

    /// Maximum upload size in MiB.
    #[arg(long, env = "MERCHANT_MAX_UPLOAD_MB", default_value_t = 25, global = true)]
    max_upload_mb: usize,

    /// LLM model ID (e.g. gpt-4o, gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL", global = true)]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER", global = true)]
    provider: Option<String>,

    /// Sampling temperature for the analysis (0.0–2.0).
    #[arg(long, env = "MERCHANT_TEMPERATURE", default_value_t = 0.3, global = true)]
    temperature: f32,

    /// Max tokens for the analysis completion.
    #[arg(long, env = "MERCHANT_MAX_TOKENS", default_value_t = 750, global = true)]
    max_tokens: usize,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "MERCHANT_SYSTEM_PROMPT", global = true)]
    system_prompt: Option<PathBuf>,

    /// OCR engine for scanned statements: tesseract or vision.
    #[arg(long, env = "MERCHANT_OCR_BACKEND", default_value = "tesseract", global = true)]
    ocr_backend: OcrBackend,

    /// OCR language (Tesseract code, e.g. eng, eng+fra).
    #[arg(long, env = "MERCHANT_OCR_LANGUAGE", default_value = "eng", global = true)]
    ocr_language: String,

    /// Tesseract executable.
    #[arg(long, env = "TESSERACT_BIN", default_value = "tesseract", global = true)]
    tesseract: PathBuf,

    /// Directory containing the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH", global = true)]
    pdfium_lib_path: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs (includes extracted text).
    #[arg(short, long, env = "MERCHANT_VERBOSE", global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MERCHANT_QUIET", global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default).
    Serve,

    /// Analyse one statement file and print the result.
    Analyze {
        /// Path to the statement PDF.
        file: PathBuf,

        /// Print the full analysis output as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal; variables may come from the environment.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli).await?;

    // ── PDF engine check ─────────────────────────────────────────────────
    PdfiumBackend::from_config(&config)
        .check_binding()
        .map_err(anyhow::Error::msg)
        .context("Failed to load the pdfium library (set PDFIUM_LIB_PATH)")?;

    let analyzer = Analyzer::from_config(config).context("Failed to initialise analyzer")?;

    match cli.command {
        None | Some(Command::Serve) => {
            let options = ServerOptions {
                max_upload_bytes: cli.max_upload_mb.max(1) * 1024 * 1024,
            };
            let app = router(AppState::new(Arc::new(analyzer)), &options);
            let addr = SocketAddr::new(cli.host, cli.port);
            info!("Starting merchant-analyzer v{}", env!("CARGO_PKG_VERSION"));
            serve(addr, app).await.context("HTTP server failed")?;
        }
        Some(Command::Analyze { ref file, json }) => {
            let bytes = tokio::fs::read(file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let output = analyzer
                .analyze(&bytes)
                .await
                .with_context(|| format!("Analysis of {} failed", file.display()))?;

            let stdout = io::stdout();
            let mut handle = stdout.lock();
            if json {
                let json =
                    serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
                writeln!(handle, "{json}").context("Failed to write to stdout")?;
            } else {
                writeln!(handle, "{}", output.analysis).context("Failed to write to stdout")?;
            }

            if !cli.quiet && !json {
                eprintln!(
                    "Analysed {} ({:?} text, {} chars) in {}ms + {}ms LLM",
                    file.display(),
                    output.text_source,
                    output.stats.text_chars,
                    output.stats.extraction_duration_ms,
                    output.stats.llm_duration_ms,
                );
            }
        }
    }

    Ok(())
}

/// Map CLI args to `AnalyzerConfig`.
async fn build_config(cli: &Cli) -> Result<AnalyzerConfig> {
    let mut builder = AnalyzerConfig::builder()
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .ocr_backend(cli.ocr_backend)
        .ocr_language(cli.ocr_language.clone())
        .tesseract_binary(cli.tesseract.clone());

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref dir) = cli.pdfium_lib_path {
        builder = builder.pdfium_library_path(dir.clone());
    }

    builder.build().context("Invalid configuration")
}

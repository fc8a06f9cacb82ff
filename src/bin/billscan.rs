//! HTTP server binary for billscan.
//!
//! A thin shim over the library crate: one POST route that maps the request
//! body to [`billscan::extract_bill_to_envelope`] and serialises the
//! envelope. Failures travel inside the envelope at HTTP 200 — the
//! transport status only reflects whether the conversation itself worked.

use anyhow::{Context, Result};
use axum::{
    extract::{Json, State},
    routing::{get, post},
    Router,
};
use billscan::{extract_bill_to_envelope, DocumentRequest, ExtractionConfig, ResponseEnvelope};
use clap::Parser;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Extract and reconcile line items from bill/invoice images.
#[derive(Parser, Debug)]
#[command(name = "billscan", version, about)]
struct Cli {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Gemini API key. Falls back to the GEMINI_API_KEY environment variable.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Vision model identifier.
    #[arg(long, default_value = "gemini-2.5-pro")]
    model: String,

    /// Document download timeout in seconds.
    #[arg(long, default_value_t = 10)]
    fetch_timeout: u64,

    /// Vision model call timeout in seconds.
    #[arg(long, default_value_t = 60)]
    api_timeout: u64,
}

/// Liveness probe.
async fn home() -> Json<Value> {
    Json(json!({ "message": "billscan is live", "status": "Running" }))
}

/// Main endpoint: process a bill URL and return the reconciled envelope.
async fn extract_bill_data(
    State(config): State<Arc<ExtractionConfig>>,
    Json(req): Json<DocumentRequest>,
) -> Json<ResponseEnvelope> {
    Json(extract_bill_to_envelope(&req.document, &config).await)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut builder = ExtractionConfig::builder()
        .model(cli.model.clone())
        .fetch_timeout_secs(cli.fetch_timeout)
        .api_timeout_secs(cli.api_timeout);
    if let Some(key) = &cli.api_key {
        builder = builder.api_key(key.clone());
    }
    let config = Arc::new(builder.build().context("invalid configuration")?);
    info!("Starting server with config: {:?}", config);

    let app = Router::new()
        .route("/", get(home))
        .route("/extract-bill-data", post(extract_bill_data))
        .with_state(config);

    let addr = format!("{}:{}", cli.host, cli.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET  /                  - liveness");
    info!("  POST /extract-bill-data - bill extraction");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

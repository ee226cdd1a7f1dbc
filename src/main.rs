#![forbid(unsafe_code)]

//! `khqr-mcp` — KHQR payment MCP server binary.
//!
//! Bootstraps configuration, then serves the MCP surface over both the
//! HTTP/SSE transport (default `http://localhost:8080/sse`) and stdio.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use khqr_mcp::bakong::BakongClient;
use khqr_mcp::config::GlobalConfig;
use khqr_mcp::mcp::handler::AppState;
use khqr_mcp::mcp::{sse, transport};
use khqr_mcp::models::transaction::StatusFilter;
use khqr_mcp::store::TransactionStore;
use khqr_mcp::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "khqr-mcp", about = "KHQR payment MCP server", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. When omitted, built-in
    /// defaults apply and the server binds 127.0.0.1:8080.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("khqr-mcp server bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = match args.config {
        Some(path) => GlobalConfig::load_from_path(path)?,
        None => GlobalConfig::default(),
    };
    config.load_credentials().await?;
    let config = Arc::new(config);
    info!(
        http_port = config.http_port,
        cooldown_minutes = config.scan_cooldown_minutes,
        "configuration loaded"
    );

    // ── Build shared application state ──────────────────
    let bakong = if config.has_bakong_token() {
        Some(Arc::new(BakongClient::new(&config.bakong)?))
    } else {
        None
    };

    let state = Arc::new(AppState {
        config: Arc::clone(&config),
        store: Arc::new(TransactionStore::new()),
        bakong,
    });

    // ── Start transports ────────────────────────────────
    let ct = CancellationToken::new();

    let stdio_ct = ct.clone();
    let stdio_state = Arc::clone(&state);
    let stdio_handle = tokio::spawn(async move {
        if let Err(err) = transport::serve_stdio(stdio_state, stdio_ct).await {
            error!(%err, "stdio transport failed");
        }
    });

    let sse_ct = ct.clone();
    let sse_state = Arc::clone(&state);
    let sse_handle = tokio::spawn(async move {
        if let Err(err) = sse::serve_sse(sse_state, sse_ct).await {
            error!(%err, "sse transport failed");
        }
    });

    info!("MCP server ready");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    // The store is in-memory by design; report what is being dropped.
    let pending = state.store.list(StatusFilter::Pending).await.len();
    let total = state.store.len().await;
    info!(total, pending, "discarding in-memory transactions");

    // ── Wait for background tasks ───────────────────────
    let _ = tokio::join!(stdio_handle, sse_handle);
    info!("khqr-mcp shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}

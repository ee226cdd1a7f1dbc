//! HTTP transport: MCP endpoint at `/sse`, health check, payment webhook.
//!
//! Mounts rmcp's streamable-HTTP service behind an axum router so MCP
//! clients can connect with a plain `http://localhost:8080/sse` URL:
//! messages are POSTed to that path and responses stream back over
//! Server-Sent Events. The same router carries `GET /health` and the
//! Bakong-style `POST /webhook` callback receiver.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::Json;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService,
};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::handler::{AppState, KhqrServer};
use crate::{AppError, Result};

/// Handler for `GET /health` — returns 200 OK with a plain-text body.
///
/// Useful for probing liveness without initiating an MCP session.
async fn health() -> &'static str {
    "ok"
}

/// Payment callback body posted by the acquiring side.
#[derive(Debug, Deserialize)]
struct WebhookPayload {
    md5: String,
    #[serde(default = "default_callback_status")]
    status: String,
}

fn default_callback_status() -> String {
    "success".into()
}

/// HTTP status for a failed callback transition.
fn callback_error_status(err: &AppError) -> StatusCode {
    match err {
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Cooldown(_) | AppError::AlreadyPaid(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Handle `POST /webhook`: authenticate via the `X-Webhook-Secret`
/// header and apply the payment callback transition.
async fn webhook(
    state: Arc<AppState>,
    headers: HeaderMap,
    payload: WebhookPayload,
) -> (StatusCode, Json<serde_json::Value>) {
    let secret = &state.config.bakong.webhook_secret;
    if secret.is_empty() {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "success": false, "error": "webhook is not configured" })),
        );
    }

    let presented = headers
        .get("x-webhook-secret")
        .and_then(|value| value.to_str().ok());
    if presented != Some(secret.as_str()) {
        warn!(md5 = %payload.md5, "webhook rejected: bad secret");
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "success": false, "error": "invalid webhook secret" })),
        );
    }

    let success = matches!(payload.status.as_str(), "success" | "0");
    match state
        .store
        .apply_callback(&payload.md5, success, Utc::now(), state.config.scan_cooldown())
        .await
    {
        Ok(tx) => {
            info!(md5 = %tx.md5, status = %tx.status, "webhook callback applied");
            (
                StatusCode::OK,
                Json(json!({ "success": true, "md5": tx.md5, "status": tx.status })),
            )
        }
        Err(err) => {
            warn!(md5 = %payload.md5, %err, "webhook callback rejected");
            (
                callback_error_status(&err),
                Json(json!({ "success": false, "error": err.to_string() })),
            )
        }
    }
}

/// Start the HTTP MCP transport on `config.http_port`.
///
/// The MCP endpoint is mounted at `/sse`; each inbound session creates a
/// fresh [`KhqrServer`] sharing the same [`AppState`], so every connected
/// client sees the same transaction store.
///
/// # Errors
///
/// Returns `AppError::Config` if the server fails to bind.
pub async fn serve_sse(state: Arc<AppState>, ct: CancellationToken) -> Result<()> {
    let port = state.config.http_port;
    let bind = SocketAddr::from(([127, 0, 0, 1], port));

    // Each inbound MCP session gets its own KhqrServer instance.
    let mcp_state = Arc::clone(&state);
    let mcp_service = StreamableHttpService::new(
        move || Ok(KhqrServer::new(Arc::clone(&mcp_state))),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );

    let webhook_state = Arc::clone(&state);
    let router = Router::new()
        .nest_service("/sse", mcp_service)
        .route("/health", get(health))
        .route(
            "/webhook",
            post(move |headers: HeaderMap, Json(payload): Json<WebhookPayload>| {
                webhook(Arc::clone(&webhook_state), headers, payload)
            }),
        );

    // Serve HTTP via axum.
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|err| AppError::Config(format!("failed to bind HTTP on {bind}: {err}")))?;

    info!(%bind, "starting HTTP MCP transport on /sse");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Config(format!("HTTP server error: {err}")))?;

    info!("HTTP MCP transport shut down");
    Ok(())
}

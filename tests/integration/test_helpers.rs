//! Shared test helpers for integration tests.
//!
//! Provides reusable construction of `AppState`, `GlobalConfig`, stored
//! transactions, and a running SSE server so individual test modules can
//! focus on behaviour rather than boilerplate.

use std::sync::Arc;

use chrono::Utc;
use khqr_mcp::config::GlobalConfig;
use khqr_mcp::khqr::{build_payload, payload_md5, QrRequest};
use khqr_mcp::mcp::handler::AppState;
use khqr_mcp::mcp::sse::serve_sse;
use khqr_mcp::models::transaction::{Currency, Transaction};
use khqr_mcp::store::TransactionStore;
use tokio_util::sync::CancellationToken;

/// Build a minimal `GlobalConfig` with a short cooldown for test isolation.
pub fn test_config() -> GlobalConfig {
    GlobalConfig::from_toml_str("scan_cooldown_minutes = 5\n").expect("valid test config")
}

/// Build a complete `AppState` with an empty store and no Bakong client.
pub fn test_app_state(config: GlobalConfig) -> Arc<AppState> {
    Arc::new(AppState {
        config: Arc::new(config),
        store: Arc::new(TransactionStore::new()),
        bakong: None,
    })
}

/// A QR request with sensible defaults for flow tests.
#[allow(dead_code)]
pub fn sample_request(amount: f64, currency: Currency) -> QrRequest {
    QrRequest {
        bank_account: "merchant@bank".into(),
        merchant_name: "Coffee Corner".into(),
        merchant_city: "Phnom Penh".into(),
        amount,
        currency,
        store_label: None,
        phone_number: None,
        bill_number: Some("INV-001".into()),
        terminal_label: None,
        is_static: false,
    }
}

/// Build a payload for `request`, store the resulting pending transaction,
/// and return its MD5 key.
#[allow(dead_code)]
pub async fn seed_transaction(store: &TransactionStore, request: &QrRequest) -> String {
    let payload = build_payload(request, Utc::now()).expect("payload builds");
    let md5 = payload_md5(&payload);
    store
        .insert(Transaction::new(
            md5.clone(),
            payload,
            request.amount,
            request.currency,
            request.merchant_name.clone(),
            request.bill_number.clone(),
            None,
        ))
        .await;
    md5
}

/// Spawn the SSE/health server on an ephemeral port, returning the base
/// URL, the shared state, and the cancellation token.
///
/// Caller must cancel the token to shut the server down.
#[allow(dead_code)]
pub async fn spawn_server(mut config: GlobalConfig) -> (String, Arc<AppState>, CancellationToken) {
    // Bind a temporary listener to discover a free port, then free it so
    // serve_sse can bind the same port.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);

    config.http_port = port;
    let state = test_app_state(config);

    let server_state = Arc::clone(&state);
    let ct = CancellationToken::new();
    let server_ct = ct.clone();
    tokio::spawn(async move {
        let _ = serve_sse(server_state, server_ct).await;
    });

    // Give the server a moment to bind.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    (format!("http://127.0.0.1:{port}"), state, ct)
}

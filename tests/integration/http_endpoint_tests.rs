//! Integration tests for the HTTP surface: `/health` and `/webhook`.
//!
//! Uses an ephemeral port to avoid conflicts with running instances.

use khqr_mcp::models::transaction::{Currency, TransactionStatus};

use super::test_helpers::{sample_request, seed_transaction, spawn_server, test_config};

#[tokio::test]
async fn health_returns_ok() {
    let (base_url, _state, ct) = spawn_server(test_config()).await;

    let resp = reqwest::get(format!("{base_url}/health"))
        .await
        .expect("HTTP GET /health");

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.expect("body"), "ok");

    ct.cancel();
}

#[tokio::test]
async fn mcp_endpoint_is_mounted_at_sse() {
    let (base_url, _state, ct) = spawn_server(test_config()).await;

    // A bare GET without MCP session headers is refused, but the route
    // must exist: anything other than 404 proves the transport is
    // mounted at /sse.
    let resp = reqwest::get(format!("{base_url}/sse"))
        .await
        .expect("HTTP GET /sse");
    assert_ne!(resp.status(), 404);

    ct.cancel();
}

#[tokio::test]
async fn webhook_without_configured_secret_is_forbidden() {
    let (base_url, _state, ct) = spawn_server(test_config()).await;

    let resp = reqwest::Client::new()
        .post(format!("{base_url}/webhook"))
        .header("x-webhook-secret", "anything")
        .json(&serde_json::json!({ "md5": "abc" }))
        .send()
        .await
        .expect("HTTP POST /webhook");

    assert_eq!(resp.status(), 403);

    ct.cancel();
}

fn config_with_secret() -> khqr_mcp::GlobalConfig {
    let mut config = test_config();
    config.bakong.webhook_secret = "s3cret".into();
    config
}

#[tokio::test]
async fn webhook_rejects_bad_secret() {
    let (base_url, state, ct) = spawn_server(config_with_secret()).await;
    let md5 = seed_transaction(&state.store, &sample_request(1.5, Currency::Usd)).await;

    let resp = reqwest::Client::new()
        .post(format!("{base_url}/webhook"))
        .header("x-webhook-secret", "wrong")
        .json(&serde_json::json!({ "md5": md5 }))
        .send()
        .await
        .expect("HTTP POST /webhook");

    assert_eq!(resp.status(), 403);
    let tx = state.store.get(&md5).await.expect("stored");
    assert_eq!(tx.status, TransactionStatus::Pending, "no state change");

    ct.cancel();
}

#[tokio::test]
async fn webhook_unknown_md5_is_404() {
    let (base_url, _state, ct) = spawn_server(config_with_secret()).await;

    let resp = reqwest::Client::new()
        .post(format!("{base_url}/webhook"))
        .header("x-webhook-secret", "s3cret")
        .json(&serde_json::json!({ "md5": "does-not-exist" }))
        .send()
        .await
        .expect("HTTP POST /webhook");

    assert_eq!(resp.status(), 404);

    ct.cancel();
}

#[tokio::test]
async fn webhook_settles_payment_then_rejects_duplicates() {
    let (base_url, state, ct) = spawn_server(config_with_secret()).await;
    let md5 = seed_transaction(&state.store, &sample_request(1.5, Currency::Usd)).await;

    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base_url}/webhook"))
        .header("x-webhook-secret", "s3cret")
        .json(&serde_json::json!({ "md5": md5, "status": "0" }))
        .send()
        .await
        .expect("HTTP POST /webhook");
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.expect("json body");
    assert_eq!(body["success"], serde_json::json!(true));
    assert_eq!(body["status"], serde_json::json!("paid"));

    let tx = state.store.get(&md5).await.expect("stored");
    assert_eq!(tx.status, TransactionStatus::Paid);

    // A second settlement attempt conflicts.
    let resp = client
        .post(format!("{base_url}/webhook"))
        .header("x-webhook-secret", "s3cret")
        .json(&serde_json::json!({ "md5": md5 }))
        .send()
        .await
        .expect("HTTP POST /webhook");
    assert_eq!(resp.status(), 409);

    ct.cancel();
}

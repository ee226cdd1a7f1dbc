//! `simulate_payment_callback` MCP tool handler.
//!
//! Applies the same transition as the HTTP webhook without requiring a
//! live Bakong callback: records a scan (cooldown enforced) and marks
//! the transaction paid on success.

use std::sync::Arc;

use chrono::Utc;
use rmcp::handler::server::tool::ToolCallContext;
use rmcp::model::CallToolResult;
use tracing::{info, info_span, Instrument};

use crate::mcp::handler::KhqrServer;
use crate::mcp::tools::util;
use crate::AppError;

/// Input parameters for `simulate_payment_callback`.
#[derive(Debug, serde::Deserialize)]
struct SimulateCallbackInput {
    md5: String,
    status: Option<String>,
}

/// Whether a callback status string signals a successful payment.
/// Bakong sends `"0"` as its success code; `"success"` is the original
/// simulator spelling.
fn is_success(status: &str) -> bool {
    matches!(status, "success" | "0")
}

/// Handle the `simulate_payment_callback` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` when the arguments do not match the input
/// schema. Domain failures are reported as tool error content.
pub async fn handle(
    context: ToolCallContext<'_, KhqrServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());
    let input: SimulateCallbackInput = util::parse_args(context.arguments)?;

    let span = info_span!("simulate_payment_callback", md5 = %input.md5);

    async move {
        let success = is_success(input.status.as_deref().unwrap_or("success"));
        let cooldown = state.config.scan_cooldown();

        match state
            .store
            .apply_callback(&input.md5, success, Utc::now(), cooldown)
            .await
        {
            Ok(tx) => {
                info!(md5 = %tx.md5, status = %tx.status, "payment callback simulated");
                Ok(util::success_text(format!(
                    "Payment callback simulated successfully. Status: {}",
                    tx.status
                )))
            }
            Err(AppError::NotFound(md5)) => Ok(util::error_text(format!(
                "Error: Transaction not found: {md5}"
            ))),
            Err(AppError::AlreadyPaid(_)) => {
                Ok(util::error_text("Payment already processed"))
            }
            Err(AppError::Cooldown(msg)) => {
                Ok(util::error_text(format!("QR code is in cooldown: {msg}")))
            }
            Err(err) => Err(rmcp::ErrorData::internal_error(
                format!("callback failed: {err}"),
                None,
            )),
        }
    }
    .instrument(span)
    .await
}

//! `check_payment_status` MCP tool handler.
//!
//! Polls the Bakong API for the payment state of a stored transaction
//! and records the transition to paid.

use std::sync::Arc;

use chrono::Utc;
use rmcp::handler::server::tool::ToolCallContext;
use rmcp::model::CallToolResult;
use tracing::{info, info_span, Instrument};

use crate::bakong::PaymentStatus;
use crate::mcp::handler::KhqrServer;
use crate::mcp::tools::util;
use crate::models::transaction::Transaction;

/// Input parameters for `check_payment_status`.
#[derive(Debug, serde::Deserialize)]
struct CheckPaymentInput {
    md5: String,
}

/// Handle the `check_payment_status` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` when the arguments do not match the input
/// schema. Domain failures are reported as tool error content.
pub async fn handle(
    context: ToolCallContext<'_, KhqrServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());
    let input: CheckPaymentInput = util::parse_args(context.arguments)?;

    let span = info_span!("check_payment_status", md5 = %input.md5);

    async move {
        if state.store.get(&input.md5).await.is_none() {
            return Ok(util::error_text(format!(
                "Error: Transaction not found: {}",
                input.md5
            )));
        }

        let Some(ref bakong) = state.bakong else {
            return Ok(util::error_text(
                "Error: payment status checks require a Bakong token (server is offline)",
            ));
        };

        let api_status = match bakong.check_payment(&input.md5).await {
            Ok(status) => status,
            Err(err) => {
                return Ok(util::error_text(format!(
                    "Error checking payment status: {err}"
                )))
            }
        };

        let transaction = if api_status == PaymentStatus::Paid {
            match state.store.mark_paid(&input.md5, Utc::now()).await {
                Ok(tx) => tx,
                Err(err) => {
                    return Err(rmcp::ErrorData::internal_error(
                        format!("failed to record payment: {err}"),
                        None,
                    ))
                }
            }
        } else {
            // Unpaid: re-read the snapshot for the report.
            match state.store.get(&input.md5).await {
                Some(tx) => tx,
                None => {
                    return Ok(util::error_text(format!(
                        "Error: Transaction not found: {}",
                        input.md5
                    )))
                }
            }
        };

        info!(md5 = %input.md5, %api_status, "payment status checked");

        Ok(util::success_text(status_report(&transaction, api_status)))
    }
    .instrument(span)
    .await
}

/// Render the status report text for a transaction snapshot.
fn status_report(transaction: &Transaction, api_status: PaymentStatus) -> String {
    format!(
        "Payment Status Check:\n\n\
         MD5: {}\n\
         Status: {}\n\
         Paid: {}\n\
         Scanned: {}\n\
         Amount: {}\n\
         Created: {}\n\
         Payment Time: {}\n\
         Scan Count: {}\n\
         API Payment Status: {api_status}",
        transaction.md5,
        transaction.status,
        transaction.is_paid(),
        transaction.scanned,
        util::format_amount(transaction.amount, transaction.currency),
        transaction.created_at.to_rfc3339(),
        transaction
            .payment_time
            .map_or_else(|| "N/A".to_owned(), |t| t.to_rfc3339()),
        transaction.scan_count,
    )
}

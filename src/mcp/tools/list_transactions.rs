//! `list_transactions` MCP tool handler.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolCallContext;
use rmcp::model::CallToolResult;
use tracing::{info_span, Instrument};

use crate::mcp::handler::KhqrServer;
use crate::mcp::tools::util;
use crate::models::transaction::StatusFilter;

/// Input parameters for `list_transactions`.
#[derive(Debug, serde::Deserialize)]
struct ListTransactionsInput {
    #[serde(default)]
    status: StatusFilter,
}

/// Handle the `list_transactions` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` when the arguments do not match the input
/// schema.
pub async fn handle(
    context: ToolCallContext<'_, KhqrServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());
    let input: ListTransactionsInput = util::parse_args(context.arguments)?;

    let span = info_span!("list_transactions", filter = %input.status);

    async move {
        let transactions = state.store.list(input.status).await;

        if transactions.is_empty() {
            return Ok(util::success_text(format!(
                "No transactions found with status: {}",
                input.status
            )));
        }

        let mut report = format!("Transactions (Status: {}):\n\n", input.status);
        for tx in &transactions {
            report.push_str(&format!(
                "- MD5: {}...\n  Amount: {}\n  Status: {}\n  Bill: {}\n  Created: {}\n\n",
                util::md5_preview(&tx.md5),
                util::format_amount(tx.amount, tx.currency),
                tx.status,
                tx.bill_number.as_deref().unwrap_or("N/A"),
                tx.created_at.to_rfc3339(),
            ));
        }

        Ok(util::success_text(report))
    }
    .instrument(span)
    .await
}

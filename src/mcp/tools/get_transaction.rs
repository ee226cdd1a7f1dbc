//! `get_transaction` MCP tool handler.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolCallContext;
use rmcp::model::CallToolResult;
use tracing::{info_span, Instrument};

use crate::mcp::handler::KhqrServer;
use crate::mcp::tools::util;

/// Input parameters for `get_transaction`.
#[derive(Debug, serde::Deserialize)]
struct GetTransactionInput {
    md5: String,
}

/// Handle the `get_transaction` tool call: returns the stored
/// transaction as pretty-printed JSON.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` when the arguments do not match the input
/// schema or the snapshot cannot be serialized.
pub async fn handle(
    context: ToolCallContext<'_, KhqrServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());
    let input: GetTransactionInput = util::parse_args(context.arguments)?;

    let span = info_span!("get_transaction", md5 = %input.md5);

    async move {
        let Some(transaction) = state.store.get(&input.md5).await else {
            return Ok(util::error_text(format!(
                "Error: Transaction not found: {}",
                input.md5
            )));
        };

        let body = serde_json::to_string_pretty(&transaction).map_err(|err| {
            rmcp::ErrorData::internal_error(format!("failed to serialize transaction: {err}"), None)
        })?;

        Ok(util::success_text(body))
    }
    .instrument(span)
    .await
}

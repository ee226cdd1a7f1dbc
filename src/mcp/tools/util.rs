//! Shared utilities for MCP tool handlers.

use rmcp::model::{CallToolResult, Content};
use serde::de::DeserializeOwned;

use crate::models::transaction::Currency;

/// Deserialize tool arguments into a typed input struct.
///
/// # Errors
///
/// Returns `rmcp::ErrorData::invalid_params` when the arguments do not
/// match the tool's input schema.
pub fn parse_args<T: DeserializeOwned>(
    args: Option<serde_json::Map<String, serde_json::Value>>,
) -> Result<T, rmcp::ErrorData> {
    serde_json::from_value(serde_json::Value::Object(args.unwrap_or_default()))
        .map_err(|err| rmcp::ErrorData::invalid_params(format!("invalid parameters: {err}"), None))
}

/// Build a tool error result carrying a plain-text message.
///
/// Domain failures (unknown transaction, cooldown, offline mode) are
/// reported as error content so the client model can read and react to
/// them, mirroring how validation failures surface from the tools.
#[must_use]
pub fn error_text(message: impl Into<String>) -> CallToolResult {
    CallToolResult::error(vec![Content::text(message.into())])
}

/// Build a successful tool result carrying a plain-text message.
#[must_use]
pub fn success_text(message: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(message.into())])
}

/// First sixteen characters of an MD5 key, shown in listing reports.
#[must_use]
pub fn md5_preview(md5: &str) -> &str {
    md5.get(..16).unwrap_or(md5)
}

/// Format an amount with its currency for report text.
#[must_use]
pub fn format_amount(amount: f64, currency: Currency) -> String {
    match currency {
        Currency::Usd => format!("{amount:.2} USD"),
        Currency::Khr => format!("{amount:.0} KHR"),
    }
}

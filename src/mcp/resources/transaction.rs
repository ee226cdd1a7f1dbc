//! `khqr://transaction/{md5}` MCP resource handler.
//!
//! Every stored transaction is exposed as a readable resource so MCP
//! clients can inspect payment state without calling a tool.

use std::sync::Arc;

use rmcp::model::{
    Annotated, ListResourceTemplatesResult, ListResourcesResult, RawResource,
    ReadResourceRequestParam, ReadResourceResult, ResourceContents, ResourceTemplate,
};

use crate::mcp::handler::AppState;
use crate::models::transaction::Transaction;
use crate::{AppError, Result};

/// URI scheme prefix for transaction resources.
pub const URI_PREFIX: &str = "khqr://transaction/";

/// Description attached to the resource template.
pub const TEMPLATE_DESCRIPTION: &str =
    "A KHQR payment transaction: QR payload, amount, and payment state.";

/// Parse a `khqr://transaction/{md5}` URI and return the MD5 key.
///
/// Returns `None` if the URI does not match the expected pattern.
///
/// # Examples
///
/// ```
/// use khqr_mcp::mcp::resources::transaction::parse_transaction_uri;
///
/// assert_eq!(
///     parse_transaction_uri("khqr://transaction/0dbe08d3a57a2b5a3a024151c0714cc1"),
///     Some("0dbe08d3a57a2b5a3a024151c0714cc1")
/// );
/// assert_eq!(parse_transaction_uri("http://example.com"), None);
/// ```
#[must_use]
pub fn parse_transaction_uri(uri: &str) -> Option<&str> {
    let md5 = uri.strip_prefix(URI_PREFIX)?;
    if md5.is_empty() || md5.contains('/') {
        return None;
    }
    Some(md5)
}

/// Build the resource URI for a transaction MD5.
#[must_use]
pub fn transaction_uri(md5: &str) -> String {
    format!("{URI_PREFIX}{md5}")
}

/// Build the `ListResourceTemplatesResult` for the transaction resource.
#[must_use]
pub fn resource_templates() -> ListResourceTemplatesResult {
    // Built from the wire shape so optional metadata fields stay unset
    // across protocol revisions. The unit tests pin the result.
    let templates: Vec<ResourceTemplate> = serde_json::from_value(serde_json::json!([{
        "uriTemplate": "khqr://transaction/{md5}",
        "name": "KHQR Transaction",
        "description": TEMPLATE_DESCRIPTION,
        "mimeType": "application/json",
    }]))
    .unwrap_or_default();

    ListResourceTemplatesResult::with_all_items(templates)
}

/// Build the `ListResourcesResult` exposing each stored transaction.
#[must_use]
pub fn list_resources(transactions: &[Transaction]) -> ListResourcesResult {
    let resources = transactions
        .iter()
        .map(|tx| {
            let label = tx
                .bill_number
                .as_deref()
                .filter(|bill| !bill.is_empty())
                .map_or_else(|| short_key(&tx.md5).to_owned(), str::to_owned);
            let mut resource =
                RawResource::new(transaction_uri(&tx.md5), format!("Transaction {label}"));
            resource.description = Some(
                format!(
                    "Payment of {} {} - Status: {}",
                    tx.amount, tx.currency, tx.status
                )
                .into(),
            );
            resource.mime_type = Some("application/json".into());
            Annotated::new(resource, None)
        })
        .collect();

    ListResourcesResult::with_all_items(resources)
}

/// Handle `resources/read` for a transaction resource.
///
/// # Errors
///
/// Returns `AppError::Config` for a malformed URI and `AppError::NotFound`
/// when no transaction exists for the MD5.
pub async fn read_resource(
    request: &ReadResourceRequestParam,
    state: &Arc<AppState>,
) -> Result<ReadResourceResult> {
    let md5 = parse_transaction_uri(&request.uri).ok_or_else(|| {
        AppError::Config(format!(
            "invalid resource URI: expected khqr://transaction/{{md5}}, got '{}'",
            request.uri
        ))
    })?;

    let transaction = state
        .store
        .get(md5)
        .await
        .ok_or_else(|| AppError::NotFound(md5.to_owned()))?;

    let body = serde_json::to_string_pretty(&transaction)
        .map_err(|err| AppError::Mcp(format!("failed to serialize transaction: {err}")))?;

    Ok(ReadResourceResult {
        contents: vec![ResourceContents::text(body, request.uri.clone())],
    })
}

/// First eight characters of an MD5 key, used as a display label.
#[must_use]
pub fn short_key(md5: &str) -> &str {
    md5.get(..8).unwrap_or(md5)
}

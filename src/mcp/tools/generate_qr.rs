//! `generate_qr_code` MCP tool handler.
//!
//! Builds a KHQR payload, keys it by MD5, optionally generates a Bakong
//! deeplink, and stores the resulting pending transaction.

use std::sync::Arc;

use chrono::Utc;
use rmcp::handler::server::tool::ToolCallContext;
use rmcp::model::CallToolResult;
use tracing::{info, info_span, Instrument};

use crate::khqr::{build_payload, payload_md5, QrRequest};
use crate::mcp::handler::KhqrServer;
use crate::mcp::resources::transaction::transaction_uri;
use crate::mcp::tools::util;
use crate::models::transaction::{Currency, Transaction};

/// Input parameters for `generate_qr_code`.
#[derive(Debug, serde::Deserialize)]
struct GenerateQrInput {
    bank_account: String,
    merchant_name: String,
    amount: f64,
    currency: Currency,
    merchant_city: Option<String>,
    store_label: Option<String>,
    phone_number: Option<String>,
    bill_number: Option<String>,
    terminal_label: Option<String>,
    #[serde(default, rename = "static")]
    is_static: bool,
    callback_url: Option<String>,
    app_icon_url: Option<String>,
    app_name: Option<String>,
}

/// Handle the `generate_qr_code` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` when the arguments do not match the input
/// schema. Domain failures are reported as tool error content.
pub async fn handle(
    context: ToolCallContext<'_, KhqrServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());
    let input: GenerateQrInput = util::parse_args(context.arguments)?;

    let span = info_span!(
        "generate_qr_code",
        currency = %input.currency,
        is_static = input.is_static,
    );

    async move {
        let request = QrRequest {
            bank_account: input.bank_account,
            merchant_name: input.merchant_name.clone(),
            merchant_city: input
                .merchant_city
                .unwrap_or_else(|| state.config.merchant.merchant_city.clone()),
            amount: input.amount,
            currency: input.currency,
            store_label: input.store_label,
            phone_number: input.phone_number,
            bill_number: input.bill_number.clone(),
            terminal_label: input.terminal_label,
            is_static: input.is_static,
        };

        let payload = match build_payload(&request, Utc::now()) {
            Ok(payload) => payload,
            Err(err) => return Ok(util::error_text(format!("Error generating QR code: {err}"))),
        };
        let md5 = payload_md5(&payload);

        // A deeplink is only generated when the caller supplies a
        // callback URL, and requires the Bakong API.
        let deeplink = match input.callback_url {
            None => None,
            Some(ref callback) => {
                let Some(ref bakong) = state.bakong else {
                    return Ok(util::error_text(
                        "Error: deeplink generation requires a Bakong token (server is offline)",
                    ));
                };
                let app_name = input
                    .app_name
                    .unwrap_or_else(|| state.config.merchant.app_name.clone());
                let icon = input.app_icon_url.unwrap_or_default();
                match bakong
                    .generate_deeplink(&payload, callback, &icon, &app_name)
                    .await
                {
                    Ok(link) => Some(link),
                    Err(err) => {
                        return Ok(util::error_text(format!(
                            "Error generating deeplink: {err}"
                        )))
                    }
                }
            }
        };

        let transaction = Transaction::new(
            md5.clone(),
            payload.clone(),
            input.amount,
            input.currency,
            input.merchant_name,
            input.bill_number,
            deeplink.clone(),
        );
        state.store.insert(transaction).await;

        info!(%md5, "qr code generated");

        let mut report = format!(
            "QR Code Generated Successfully!\n\n\
             MD5: {md5}\n\
             Amount: {}\n\
             Status: pending\n\
             Resource URI: {}\n\n\
             QR Code Data: {payload}",
            util::format_amount(input.amount, input.currency),
            transaction_uri(&md5),
        );
        if let Some(link) = deeplink {
            report.push_str(&format!("\n\nDeeplink: {link}"));
        }

        Ok(util::success_text(report))
    }
    .instrument(span)
    .await
}

//! HTTP client for the Bakong open API.
//!
//! Two endpoints are used: `check_transaction_by_md5` to poll payment
//! state for a generated QR, and `generate_deeplink_by_qr` to turn a
//! payload into a short link that opens a banking app.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::BakongConfig;
use crate::{AppError, Result};

/// Payment state reported by the Bakong API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    /// The transaction has settled.
    Paid,
    /// No settlement recorded yet.
    Unpaid,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paid => write!(f, "PAID"),
            Self::Unpaid => write!(f, "UNPAID"),
        }
    }
}

/// Response envelope shared by Bakong open-API endpoints.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(rename = "responseCode")]
    response_code: i64,
    #[serde(rename = "responseMessage")]
    response_message: Option<String>,
    data: Option<serde_json::Value>,
}

/// Authenticated client for the Bakong open API.
#[derive(Debug, Clone)]
pub struct BakongClient {
    http: reqwest::Client,
    api_base_url: String,
    token: String,
}

impl BakongClient {
    /// Build a client from configuration. The token must already be
    /// loaded into `config`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Bakong` if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(config: &BakongConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            api_base_url: config.api_base_url.clone(),
            token: config.token.clone(),
        })
    }

    /// Poll the payment state of a transaction by payload MD5.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Bakong` on transport failure or an unexpected
    /// response code.
    pub async fn check_payment(&self, md5: &str) -> Result<PaymentStatus> {
        let url = format!("{}/v1/check_transaction_by_md5", self.api_base_url);
        let response: ApiResponse = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "md5": md5 }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(md5, code = response.response_code, "bakong payment check");

        match response.response_code {
            0 => Ok(PaymentStatus::Paid),
            1 => Ok(PaymentStatus::Unpaid),
            code => Err(AppError::Bakong(format!(
                "unexpected response code {code}: {}",
                response.response_message.unwrap_or_default()
            ))),
        }
    }

    /// Generate a deeplink short URL for a QR payload.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Bakong` on transport failure or when the
    /// response carries no short link.
    pub async fn generate_deeplink(
        &self,
        qr: &str,
        callback: &str,
        app_icon_url: &str,
        app_name: &str,
    ) -> Result<String> {
        let url = format!("{}/v1/generate_deeplink_by_qr", self.api_base_url);
        let response: ApiResponse = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({
                "qr": qr,
                "sourceInfo": {
                    "appIconUrl": app_icon_url,
                    "appName": app_name,
                    "appDeepLinkCallback": callback,
                },
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.response_code != 0 {
            return Err(AppError::Bakong(format!(
                "deeplink generation failed: {}",
                response.response_message.unwrap_or_default()
            )));
        }

        response
            .data
            .as_ref()
            .and_then(|data| data.get("shortLink"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| AppError::Bakong("deeplink response missing shortLink".into()))
    }
}

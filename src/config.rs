//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::{AppError, Result};

/// Nested Bakong open-API configuration.
///
/// The API token and webhook secret are loaded at runtime via OS keychain
/// or environment variables, not from the TOML config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BakongConfig {
    /// Base URL of the Bakong open API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Per-request timeout for Bakong API calls.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
    /// API bearer token (populated at runtime; empty means offline mode).
    #[serde(skip)]
    pub token: String,
    /// Shared secret for the payment webhook (populated at runtime).
    #[serde(skip)]
    pub webhook_secret: String,
}

impl Default for BakongConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_seconds: default_request_timeout_seconds(),
            token: String::new(),
            webhook_secret: String::new(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api-bakong.nbc.gov.kh".into()
}

fn default_request_timeout_seconds() -> u64 {
    30
}

/// Merchant defaults applied when a tool call omits the optional fields.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct MerchantConfig {
    /// Default merchant city embedded in generated QR payloads.
    #[serde(default = "default_merchant_city")]
    pub merchant_city: String,
    /// Default app name used when generating deeplinks.
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

impl Default for MerchantConfig {
    fn default() -> Self {
        Self {
            merchant_city: default_merchant_city(),
            app_name: default_app_name(),
        }
    }
}

fn default_merchant_city() -> String {
    "Phnom Penh".into()
}

fn default_app_name() -> String {
    "Payment".into()
}

fn default_http_port() -> u16 {
    8080
}

fn default_scan_cooldown_minutes() -> u64 {
    5
}

/// Global configuration parsed from `config.toml`.
///
/// Every field has a default so the demo server runs with no config file
/// at all, binding `127.0.0.1:8080`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// HTTP port for the SSE transport and webhook.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Minutes a QR code stays locked after a scan before it may be
    /// scanned again.
    #[serde(default = "default_scan_cooldown_minutes")]
    pub scan_cooldown_minutes: u64,
    /// Bakong open-API settings.
    #[serde(default)]
    pub bakong: BakongConfig,
    /// Merchant defaults.
    #[serde(default)]
    pub merchant: MerchantConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            scan_cooldown_minutes: default_scan_cooldown_minutes(),
            bakong: BakongConfig::default(),
            merchant: MerchantConfig::default(),
        }
    }
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and normalize it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load runtime credentials from OS keychain with env-var fallback.
    ///
    /// The Bakong token is optional: when neither the keychain nor
    /// `BAKONG_TOKEN` provides one, the server runs in offline mode and
    /// tools that need the Bakong API report an error instead. The webhook
    /// secret comes from `WEBHOOK_SECRET` only. `SCAN_COOLDOWN_MINUTES`
    /// overrides the configured cooldown when set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a keychain lookup task panics or if
    /// `SCAN_COOLDOWN_MINUTES` is set but not a number.
    pub async fn load_credentials(&mut self) -> Result<()> {
        if let Some(token) = load_credential("bakong_token", "BAKONG_TOKEN").await? {
            self.bakong.token = token;
        } else {
            warn!("no bakong token found; running in offline mode");
        }

        if let Ok(secret) = env::var("WEBHOOK_SECRET") {
            if !secret.is_empty() {
                self.bakong.webhook_secret = secret;
            }
        }

        if let Ok(raw) = env::var("SCAN_COOLDOWN_MINUTES") {
            self.scan_cooldown_minutes = raw.parse().map_err(|_| {
                AppError::Config(format!("SCAN_COOLDOWN_MINUTES is not a number: {raw}"))
            })?;
        }

        Ok(())
    }

    /// Whether a Bakong API token is available.
    #[must_use]
    pub fn has_bakong_token(&self) -> bool {
        !self.bakong.token.is_empty()
    }

    /// Scan cooldown as a [`Duration`].
    #[must_use]
    pub fn scan_cooldown(&self) -> Duration {
        Duration::from_secs(self.scan_cooldown_minutes * 60)
    }

    fn validate(&mut self) -> Result<()> {
        if self.bakong.api_base_url.is_empty() {
            return Err(AppError::Config("bakong.api_base_url must not be empty".into()));
        }

        // Normalize so client code can always append `/v1/...`.
        while self.bakong.api_base_url.ends_with('/') {
            self.bakong.api_base_url.pop();
        }

        if self.bakong.request_timeout_seconds == 0 {
            return Err(AppError::Config(
                "bakong.request_timeout_seconds must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

/// Load a single optional credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<Option<String>> {
    let key = keyring_key.to_owned();

    // Try OS keychain first via spawn_blocking (keyring is synchronous I/O).
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new("khqr-mcp", &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(Some(value)),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    Ok(env::var(env_key).ok().filter(|v| !v.is_empty()))
}

//! Payment transaction model and lifecycle transitions.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AppError, Result};

/// Settlement currency supported by KHQR.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US dollars, two decimal places.
    Usd,
    /// Cambodian riel, whole amounts only.
    Khr,
}

impl Currency {
    /// ISO-4217 numeric code embedded in the QR payload (tag 53).
    #[must_use]
    pub fn numeric_code(self) -> &'static str {
        match self {
            Self::Usd => "840",
            Self::Khr => "116",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usd => write!(f, "USD"),
            Self::Khr => write!(f, "KHR"),
        }
    }
}

/// Lifecycle status for a payment transaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Awaiting payment.
    Pending,
    /// Payment confirmed; terminal state.
    Paid,
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Paid => write!(f, "paid"),
        }
    }
}

/// Status filter for listing transactions.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    /// Match every transaction.
    #[default]
    All,
    /// Only pending transactions.
    Pending,
    /// Only paid transactions.
    Paid,
}

impl StatusFilter {
    /// Whether a transaction status passes this filter.
    #[must_use]
    pub fn matches(self, status: TransactionStatus) -> bool {
        match self {
            Self::All => true,
            Self::Pending => status == TransactionStatus::Pending,
            Self::Paid => status == TransactionStatus::Paid,
        }
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Pending => write!(f, "pending"),
            Self::Paid => write!(f, "paid"),
        }
    }
}

/// A generated payment QR and its observed payment state.
///
/// Keyed by the MD5 hex digest of the QR payload, which is also the
/// lookup handle the Bakong API uses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    /// MD5 hex digest of the QR payload.
    pub md5: String,
    /// Full KHQR payload string.
    pub qr_code: String,
    /// Payment amount.
    pub amount: f64,
    /// Settlement currency.
    pub currency: Currency,
    /// Merchant display name.
    pub merchant_name: String,
    /// Bill or invoice number, when provided.
    pub bill_number: Option<String>,
    /// Current lifecycle status.
    pub status: TransactionStatus,
    /// Whether the QR has been scanned at least once.
    pub scanned: bool,
    /// Number of recorded scans.
    pub scan_count: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Most recent scan timestamp.
    pub last_scan_time: Option<DateTime<Utc>>,
    /// Timestamp of payment confirmation.
    pub payment_time: Option<DateTime<Utc>>,
    /// Bakong deeplink short URL, when one was generated.
    pub deeplink: Option<String>,
}

impl Transaction {
    /// Construct a new pending transaction.
    #[must_use]
    pub fn new(
        md5: String,
        qr_code: String,
        amount: f64,
        currency: Currency,
        merchant_name: String,
        bill_number: Option<String>,
        deeplink: Option<String>,
    ) -> Self {
        Self {
            md5,
            qr_code,
            amount,
            currency,
            merchant_name,
            bill_number,
            status: TransactionStatus::Pending,
            scanned: false,
            scan_count: 0,
            created_at: Utc::now(),
            last_scan_time: None,
            payment_time: None,
            deeplink,
        }
    }

    /// Whether the payment has been confirmed.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.status == TransactionStatus::Paid
    }

    /// Transition to paid. Idempotent: the payment time is recorded only
    /// on the first transition.
    pub fn mark_paid(&mut self, now: DateTime<Utc>) {
        self.status = TransactionStatus::Paid;
        if self.payment_time.is_none() {
            self.payment_time = Some(now);
        }
    }

    /// Record a scan, enforcing the cooldown window.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AlreadyPaid` when the transaction is already
    /// paid, or `AppError::Cooldown` when `cooldown` has not elapsed since
    /// the last scan.
    pub fn record_scan(&mut self, now: DateTime<Utc>, cooldown: Duration) -> Result<()> {
        if self.is_paid() {
            return Err(AppError::AlreadyPaid(self.md5.clone()));
        }
        if let Some(remaining) = self.cooldown_remaining(now, cooldown) {
            return Err(AppError::Cooldown(format!(
                "wait {} seconds before the next scan",
                remaining.as_secs()
            )));
        }
        self.scanned = true;
        self.last_scan_time = Some(now);
        self.scan_count += 1;
        Ok(())
    }

    /// Time left until the QR may be scanned again, if any.
    #[must_use]
    pub fn cooldown_remaining(&self, now: DateTime<Utc>, cooldown: Duration) -> Option<Duration> {
        let last = self.last_scan_time?;
        let cooldown = chrono::Duration::from_std(cooldown).ok()?;
        let end = last.checked_add_signed(cooldown)?;
        (now < end).then(|| (end - now).to_std().unwrap_or(Duration::ZERO))
    }
}

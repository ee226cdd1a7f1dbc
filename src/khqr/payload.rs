//! EMV-MPM TLV payload builder for KHQR payment QR codes.
//!
//! A KHQR payload is a flat string of TLV fields (two-digit tag,
//! two-digit length, value) terminated by a CRC-16/CCITT-FALSE checksum
//! over the whole payload including the `6304` prefix. The MD5 hex digest
//! of the payload string is the transaction key used by the Bakong API.

use chrono::{DateTime, Utc};
use md5::{Digest, Md5};

use crate::models::transaction::Currency;
use crate::{AppError, Result};

/// Maximum length of the merchant name field (EMV tag 59).
const MAX_MERCHANT_NAME: usize = 25;

/// Maximum length of the merchant city field (EMV tag 60).
const MAX_MERCHANT_CITY: usize = 15;

/// Merchant category code embedded in every payload (tag 52).
const MCC_GENERAL: &str = "5999";

/// Maximum length of the Bakong account identifier (tag 29-00).
const MAX_BANK_ACCOUNT: usize = 32;

/// Maximum length of each additional data field (tag 62 sub-tags).
const MAX_ADDITIONAL_FIELD: usize = 25;

/// Maximum TLV value length encodable in a two-digit length field.
const MAX_TLV_VALUE: usize = 99;

/// Input for building one KHQR payload.
#[derive(Debug, Clone, PartialEq)]
pub struct QrRequest {
    /// Bakong account identifier, e.g. `merchant@bank`.
    pub bank_account: String,
    /// Merchant display name (truncated to 25 chars).
    pub merchant_name: String,
    /// Merchant city (truncated to 15 chars).
    pub merchant_city: String,
    /// Payment amount; embedded only in dynamic payloads but always
    /// validated as positive and finite.
    pub amount: f64,
    /// Settlement currency.
    pub currency: Currency,
    /// Optional store label (tag 62-03).
    pub store_label: Option<String>,
    /// Optional mobile number (tag 62-02).
    pub phone_number: Option<String>,
    /// Optional bill or invoice number (tag 62-01).
    pub bill_number: Option<String>,
    /// Optional terminal label (tag 62-07).
    pub terminal_label: Option<String>,
    /// Static QR codes omit the amount and can be reused.
    pub is_static: bool,
}

/// Build the complete KHQR payload string for `req`.
///
/// `issued_at` is embedded in the KHQR timestamp template (tag 99) and is
/// a parameter so callers and tests control the payload deterministically.
///
/// # Errors
///
/// Returns `AppError::Khqr` when a required field is empty, the amount
/// is not a positive finite number, or a field exceeds its KHQR length
/// limit.
pub fn build_payload(req: &QrRequest, issued_at: DateTime<Utc>) -> Result<String> {
    validate(req)?;

    let mut payload = String::new();
    payload.push_str(&tlv("00", "01"));
    payload.push_str(&tlv("01", if req.is_static { "11" } else { "12" }));
    payload.push_str(&tlv("29", &tlv("00", &req.bank_account)));
    payload.push_str(&tlv("52", MCC_GENERAL));
    payload.push_str(&tlv("53", req.currency.numeric_code()));
    if !req.is_static {
        payload.push_str(&tlv("54", &format_amount(req.amount, req.currency)?));
    }
    payload.push_str(&tlv("58", "KH"));
    payload.push_str(&tlv("59", &clip(&req.merchant_name, MAX_MERCHANT_NAME)));
    payload.push_str(&tlv("60", &clip(&req.merchant_city, MAX_MERCHANT_CITY)));

    let mut additional = String::new();
    if let Some(ref bill) = req.bill_number {
        additional.push_str(&tlv("01", bill));
    }
    if let Some(ref phone) = req.phone_number {
        additional.push_str(&tlv("02", phone));
    }
    if let Some(ref store) = req.store_label {
        additional.push_str(&tlv("03", store));
    }
    if let Some(ref terminal) = req.terminal_label {
        additional.push_str(&tlv("07", terminal));
    }
    // The assembled sub-fields must still fit one two-digit TLV length.
    if additional.len() > MAX_TLV_VALUE {
        return Err(AppError::Khqr(
            "additional data fields exceed the template capacity".into(),
        ));
    }
    if !additional.is_empty() {
        payload.push_str(&tlv("62", &additional));
    }

    payload.push_str(&tlv("99", &tlv("00", &issued_at.timestamp_millis().to_string())));

    // CRC covers everything up to and including its own tag and length.
    payload.push_str("6304");
    let crc = crc16_ccitt(payload.as_bytes());
    payload.push_str(&format!("{crc:04X}"));

    Ok(payload)
}

/// MD5 hex digest of a payload string — the Bakong transaction key.
#[must_use]
pub fn payload_md5(payload: &str) -> String {
    format!("{:x}", Md5::digest(payload.as_bytes()))
}

/// Check that the trailing four hex digits match the payload's CRC.
#[must_use]
pub fn verify_crc(payload: &str) -> bool {
    if payload.len() < 8 || !payload.is_char_boundary(payload.len() - 4) {
        return false;
    }
    let (body, checksum) = payload.split_at(payload.len() - 4);
    if !body.ends_with("6304") {
        return false;
    }
    format!("{:04X}", crc16_ccitt(body.as_bytes())) == checksum
}

/// CRC-16/CCITT-FALSE (poly 0x1021, init 0xFFFF), as mandated by EMV QR.
#[must_use]
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            if crc & 0x8000 == 0 {
                crc <<= 1;
            } else {
                crc = (crc << 1) ^ 0x1021;
            }
        }
    }
    crc
}

fn validate(req: &QrRequest) -> Result<()> {
    if req.bank_account.trim().is_empty() {
        return Err(AppError::Khqr("bank_account must not be empty".into()));
    }
    if req.bank_account.len() > MAX_BANK_ACCOUNT {
        return Err(AppError::Khqr(format!(
            "bank_account exceeds {MAX_BANK_ACCOUNT} characters"
        )));
    }
    if req.merchant_name.trim().is_empty() {
        return Err(AppError::Khqr("merchant_name must not be empty".into()));
    }
    if !(req.amount.is_finite() && req.amount > 0.0) {
        return Err(AppError::Khqr("amount must be a positive number".into()));
    }
    for (field, value) in [
        ("bill_number", &req.bill_number),
        ("phone_number", &req.phone_number),
        ("store_label", &req.store_label),
        ("terminal_label", &req.terminal_label),
    ] {
        if value.as_deref().is_some_and(|v| v.len() > MAX_ADDITIONAL_FIELD) {
            return Err(AppError::Khqr(format!(
                "{field} exceeds {MAX_ADDITIONAL_FIELD} characters"
            )));
        }
    }
    Ok(())
}

/// Format an amount per KHQR rules: USD with cents, KHR in whole riel.
fn format_amount(amount: f64, currency: Currency) -> Result<String> {
    let formatted = match currency {
        Currency::Usd => format!("{amount:.2}"),
        Currency::Khr => format!("{amount:.0}"),
    };
    if formatted.len() > 13 {
        return Err(AppError::Khqr(format!("amount too large: {formatted}")));
    }
    Ok(formatted)
}

/// Encode one TLV field. Values longer than 99 bytes cannot be encoded
/// in a two-digit length; validation and clipping keep every value
/// below that before it reaches here.
fn tlv(tag: &str, value: &str) -> String {
    debug_assert!(value.len() <= MAX_TLV_VALUE, "TLV value too long for tag {tag}");
    format!("{tag}{:02}{value}", value.len())
}

/// Truncate to `max` characters at char boundaries, never exceeding the
/// encodable TLV byte length.
fn clip(value: &str, max: usize) -> String {
    let mut out = String::new();
    for c in value.chars().take(max) {
        if out.len() + c.len_utf8() > MAX_TLV_VALUE {
            break;
        }
        out.push(c);
    }
    out
}

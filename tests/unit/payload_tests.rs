//! Unit tests for KHQR payload construction.

use chrono::{DateTime, TimeZone, Utc};
use khqr_mcp::khqr::{build_payload, payload_md5, verify_crc, QrRequest};
use khqr_mcp::models::transaction::Currency;

fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn base_request() -> QrRequest {
    QrRequest {
        bank_account: "merchant@bank".into(),
        merchant_name: "Coffee Corner".into(),
        merchant_city: "Phnom Penh".into(),
        amount: 1.5,
        currency: Currency::Usd,
        store_label: None,
        phone_number: None,
        bill_number: None,
        terminal_label: None,
        is_static: false,
    }
}

#[test]
fn dynamic_usd_payload_structure() {
    let payload = build_payload(&base_request(), fixed_time()).expect("payload builds");

    // Payload format indicator and dynamic point of initiation.
    assert!(payload.starts_with("000201"), "payload: {payload}");
    assert!(payload.contains("010212"));
    // Merchant account template wraps the Bakong account ID.
    assert!(payload.contains("0013merchant@bank"));
    // MCC, currency, amount, country.
    assert!(payload.contains("52045999"));
    assert!(payload.contains("5303840"));
    assert!(payload.contains("54041.50"));
    assert!(payload.contains("5802KH"));
    // Merchant name and city with TLV lengths.
    assert!(payload.contains("5913Coffee Corner"));
    assert!(payload.contains("6010Phnom Penh"));
    // Timestamp template carries the issue time in millis.
    assert!(payload.contains("1704067200000"));
}

#[test]
fn static_payload_omits_amount() {
    let mut request = base_request();
    request.is_static = true;

    let payload = build_payload(&request, fixed_time()).expect("static payload builds");

    assert!(payload.contains("010211"));
    assert!(!payload.contains("5404"));
}

#[test]
fn static_qr_still_requires_positive_amount() {
    for amount in [0.0, -5.0, f64::NAN] {
        let mut request = base_request();
        request.is_static = true;
        request.amount = amount;
        let err = build_payload(&request, fixed_time()).expect_err("rejected");
        assert!(
            err.to_string().starts_with("khqr:"),
            "static amount {amount} must be rejected"
        );
    }
}

#[test]
fn khr_payload_uses_whole_riel() {
    let mut request = base_request();
    request.currency = Currency::Khr;
    request.amount = 5000.0;

    let payload = build_payload(&request, fixed_time()).expect("payload builds");

    assert!(payload.contains("5303116"));
    assert!(payload.contains("54045000"));
}

#[test]
fn additional_data_template_carries_bill_number() {
    let mut request = base_request();
    request.bill_number = Some("INV-001".into());
    request.terminal_label = Some("POS-1".into());

    let payload = build_payload(&request, fixed_time()).expect("payload builds");

    assert!(payload.contains("0107INV-001"));
    assert!(payload.contains("0705POS-1"));
}

#[test]
fn no_additional_data_template_when_all_optionals_absent() {
    let payload = build_payload(&base_request(), fixed_time()).expect("payload builds");
    assert!(!tag_62_present(&payload));
}

fn tag_62_present(payload: &str) -> bool {
    // Walk the top-level TLV stream looking for tag 62.
    let mut rest = payload;
    while rest.len() >= 4 {
        let tag = &rest[..2];
        let Ok(len) = rest[2..4].parse::<usize>() else {
            return false;
        };
        if tag == "62" {
            return true;
        }
        if rest.len() < 4 + len {
            return false;
        }
        rest = &rest[4 + len..];
    }
    false
}

#[test]
fn merchant_name_is_truncated_to_25_chars() {
    let mut request = base_request();
    request.merchant_name = "A Very Long Merchant Name Indeed Ltd".into();

    let payload = build_payload(&request, fixed_time()).expect("payload builds");

    assert!(payload.contains("5925A Very Long Merchant Name"));
}

#[test]
fn crc_verifies_and_detects_tampering() {
    let payload = build_payload(&base_request(), fixed_time()).expect("payload builds");
    assert!(verify_crc(&payload));

    let tampered = payload.replace("1.50", "9.50");
    assert!(!verify_crc(&tampered));
}

#[test]
fn md5_is_stable_and_lowercase_hex() {
    let payload = build_payload(&base_request(), fixed_time()).expect("payload builds");
    let digest = payload_md5(&payload);

    assert_eq!(digest.len(), 32);
    assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_eq!(digest, payload_md5(&payload));
}

#[test]
fn different_amounts_produce_different_keys() {
    let first = build_payload(&base_request(), fixed_time()).expect("payload builds");
    let mut request = base_request();
    request.amount = 2.5;
    let second = build_payload(&request, fixed_time()).expect("payload builds");

    assert_ne!(payload_md5(&first), payload_md5(&second));
}

// ── Validation ───────────────────────────────────────────────

#[test]
fn rejects_empty_bank_account() {
    let mut request = base_request();
    request.bank_account = "  ".into();
    let err = build_payload(&request, fixed_time()).expect_err("rejected");
    assert!(err.to_string().starts_with("khqr:"));
}

#[test]
fn rejects_empty_merchant_name() {
    let mut request = base_request();
    request.merchant_name = String::new();
    assert!(build_payload(&request, fixed_time()).is_err());
}

#[test]
fn rejects_non_positive_amounts() {
    for amount in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let mut request = base_request();
        request.amount = amount;
        assert!(
            build_payload(&request, fixed_time()).is_err(),
            "amount {amount} must be rejected"
        );
    }
}

#[test]
fn rejects_oversized_bill_number() {
    let mut request = base_request();
    request.bill_number = Some("X".repeat(120));

    let err = build_payload(&request, fixed_time()).expect_err("rejected");
    assert!(err.to_string().starts_with("khqr:"));
}

#[test]
fn rejects_oversized_bank_account() {
    let mut request = base_request();
    request.bank_account = "a".repeat(40);

    let err = build_payload(&request, fixed_time()).expect_err("rejected");
    assert!(err.to_string().starts_with("khqr:"));
}

#[test]
fn rejects_overfull_additional_data_template() {
    // Four fields at the per-field limit overflow the tag-62 envelope.
    let mut request = base_request();
    request.bill_number = Some("B".repeat(25));
    request.phone_number = Some("1".repeat(25));
    request.store_label = Some("S".repeat(25));
    request.terminal_label = Some("T".repeat(25));

    let err = build_payload(&request, fixed_time()).expect_err("rejected");
    assert!(err.to_string().starts_with("khqr:"));
}

#[test]
fn additional_fields_at_the_limit_still_encode() {
    let mut request = base_request();
    request.bill_number = Some("B".repeat(25));
    request.store_label = Some("S".repeat(25));

    let payload = build_payload(&request, fixed_time()).expect("payload builds");
    assert!(verify_crc(&payload));
}

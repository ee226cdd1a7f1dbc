//! Unit tests for transaction resource URIs and listings.

use khqr_mcp::mcp::resources::transaction::{
    list_resources, parse_transaction_uri, resource_templates, short_key, transaction_uri,
};
use khqr_mcp::models::transaction::{Currency, Transaction};

const MD5: &str = "0dbe08d3a57a2b5a3a024151c0714cc1";

#[test]
fn parse_valid_uri() {
    let uri = format!("khqr://transaction/{MD5}");
    assert_eq!(parse_transaction_uri(&uri), Some(MD5));
}

#[test]
fn parse_rejects_wrong_scheme() {
    assert_eq!(parse_transaction_uri("http://example.com"), None);
    assert_eq!(parse_transaction_uri("slack://channel/C1/recent"), None);
}

#[test]
fn parse_rejects_empty_key() {
    assert_eq!(parse_transaction_uri("khqr://transaction/"), None);
}

#[test]
fn parse_rejects_trailing_segments() {
    assert_eq!(
        parse_transaction_uri("khqr://transaction/abc/extra"),
        None
    );
}

#[test]
fn uri_round_trips() {
    let uri = transaction_uri(MD5);
    assert_eq!(parse_transaction_uri(&uri), Some(MD5));
}

#[test]
fn short_key_takes_first_eight_chars() {
    assert_eq!(short_key(MD5), "0dbe08d3");
    assert_eq!(short_key("abc"), "abc");
}

#[test]
fn template_advertises_uri_shape() {
    let templates = resource_templates();
    assert_eq!(templates.resource_templates.len(), 1);

    let template = &templates.resource_templates[0];
    assert_eq!(template.uri_template, "khqr://transaction/{md5}");
    assert_eq!(template.mime_type.as_deref(), Some("application/json"));
}

fn transaction_with_bill(bill: Option<&str>) -> Transaction {
    Transaction::new(
        MD5.into(),
        "000201...".into(),
        1.5,
        Currency::Usd,
        "Coffee Corner".into(),
        bill.map(str::to_owned),
        None,
    )
}

#[test]
fn listing_prefers_bill_number_as_label() {
    let listing = list_resources(&[transaction_with_bill(Some("INV-001"))]);
    assert_eq!(listing.resources.len(), 1);
    assert_eq!(listing.resources[0].name, "Transaction INV-001");
}

#[test]
fn listing_falls_back_to_md5_prefix() {
    let listing = list_resources(&[transaction_with_bill(None)]);
    assert_eq!(listing.resources[0].name, "Transaction 0dbe08d3");
}

#[test]
fn listing_describes_amount_and_status() {
    let listing = list_resources(&[transaction_with_bill(None)]);
    let description = listing.resources[0]
        .description
        .as_deref()
        .expect("description present");
    assert!(description.contains("1.5"));
    assert!(description.contains("USD"));
    assert!(description.contains("pending"));
}

#[test]
fn listing_uses_transaction_uri() {
    let listing = list_resources(&[transaction_with_bill(None)]);
    assert_eq!(listing.resources[0].uri, transaction_uri(MD5));
}

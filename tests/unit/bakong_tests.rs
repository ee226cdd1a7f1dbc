//! Unit tests for the Bakong client surface.

use khqr_mcp::bakong::{BakongClient, PaymentStatus};
use khqr_mcp::config::BakongConfig;

#[test]
fn payment_status_display_matches_api_vocabulary() {
    assert_eq!(PaymentStatus::Paid.to_string(), "PAID");
    assert_eq!(PaymentStatus::Unpaid.to_string(), "UNPAID");
}

#[test]
fn client_builds_from_default_config() {
    let config = BakongConfig::default();
    assert!(BakongClient::new(&config).is_ok());
}

//! Contract tests for the transaction resource surface.

use khqr_mcp::mcp::resources::transaction::{
    parse_transaction_uri, resource_templates, transaction_uri, TEMPLATE_DESCRIPTION, URI_PREFIX,
};

#[test]
fn uri_scheme_is_stable() {
    assert_eq!(URI_PREFIX, "khqr://transaction/");
    assert_eq!(
        transaction_uri("abc123"),
        "khqr://transaction/abc123"
    );
}

#[test]
fn template_is_json_typed() {
    let templates = resource_templates();
    let template = &templates.resource_templates[0];

    assert_eq!(template.uri_template, "khqr://transaction/{md5}");
    assert_eq!(template.mime_type.as_deref(), Some("application/json"));
    assert_eq!(template.description.as_deref(), Some(TEMPLATE_DESCRIPTION));
}

#[test]
fn parser_accepts_only_the_documented_shape() {
    assert!(parse_transaction_uri("khqr://transaction/abc").is_some());
    assert!(parse_transaction_uri("khqr://transactions/abc").is_none());
    assert!(parse_transaction_uri("khqr://transaction/abc/def").is_none());
    assert!(parse_transaction_uri("").is_none());
}

//! KHQR payload construction (EMV merchant-presented mode).

pub mod payload;

pub use payload::{build_payload, payload_md5, verify_crc, QrRequest};

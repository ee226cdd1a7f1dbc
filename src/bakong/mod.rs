//! Bakong open-API client.

pub mod client;

pub use client::{BakongClient, PaymentStatus};

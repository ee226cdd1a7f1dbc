//! MCP tool handlers.

pub mod check_payment;
pub mod generate_qr;
pub mod get_transaction;
pub mod list_transactions;
pub mod simulate_callback;
pub mod util;

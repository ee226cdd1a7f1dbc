//! MCP resource handlers.

pub mod transaction;

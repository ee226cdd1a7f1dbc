#![forbid(unsafe_code)]

pub mod bakong;
pub mod config;
pub mod errors;
pub mod khqr;
pub mod mcp;
pub mod models;
pub mod store;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};

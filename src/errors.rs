//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// KHQR payload construction or validation failure.
    Khqr(String),
    /// Bakong open-API request failure or unexpected response.
    Bakong(String),
    /// MCP protocol or tool dispatch failure.
    Mcp(String),
    /// Requested transaction does not exist.
    NotFound(String),
    /// Scan rejected because the cooldown window is still active.
    Cooldown(String),
    /// Payment callback for a transaction that is already paid.
    AlreadyPaid(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Khqr(msg) => write!(f, "khqr: {msg}"),
            Self::Bakong(msg) => write!(f, "bakong: {msg}"),
            Self::Mcp(msg) => write!(f, "mcp: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Cooldown(msg) => write!(f, "cooldown: {msg}"),
            Self::AlreadyPaid(msg) => write!(f, "already paid: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::Bakong(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

//! Error types for the cost allocator

use thiserror::Error;

/// Result type for cost allocator operations
pub type Result<T> = std::result::Result<T, AllocationError>;

/// Errors raised at the boundary of the engine.
///
/// Allocation itself never fails; these come from validating caller input
/// and from loading configuration or rosters.
#[derive(Error, Debug)]
pub enum AllocationError {
    #[error("Invalid pricing: {message}")]
    InvalidPricing { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Unknown card type: {0}")]
    UnknownCardType(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AllocationError {
    pub(crate) fn pricing(message: impl Into<String>) -> Self {
        AllocationError::InvalidPricing { message: message.into() }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        AllocationError::InvalidConfig { message: message.into() }
    }
}

//! Error types for the busylight crates.

use thiserror::Error;

/// Errors that can occur in busylight operations.
#[derive(Error, Debug)]
pub enum BusyLightError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown timezone: {0}")]
    Timezone(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for busylight operations.
pub type BusyLightResult<T> = Result<T, BusyLightError>;

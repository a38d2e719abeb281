//! Error types for the herald service

/// Errors that can occur in the herald service
#[derive(Debug, thiserror::Error)]
pub enum HeraldError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Server error: {0}")]
    Server(String),
}

/// Result type alias for herald operations
pub type Result<T> = std::result::Result<T, HeraldError>;

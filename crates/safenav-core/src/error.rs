//! Error types for SafeNav

/// Result type alias using SafeNav's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for SafeNav operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Key-value store errors
    #[error("store error: {0}")]
    Store(String),

    /// Rejected user input (empty domain, malformed schedule rule, ...)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a new invalid-input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

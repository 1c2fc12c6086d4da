//! Error types for the Gateway

use thiserror::Error;

/// Result type alias for the Gateway
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for the Gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or malformed credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authorization failures
    ///
    /// `details` carries internal diagnostics (attempted credential sources,
    /// required vs. matched permissions) and is never serialized into the
    /// HTTP response.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Public-facing message
        message: String,
        /// Internal diagnostic payload, not exposed to clients
        details: Option<serde_json::Value>,
    },

    /// Caller bugs (e.g. a workflow key that does not match this instance)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// External collaborator failures (Authentication, Authorization, Role,
    /// User or ApiKey services)
    #[error("External service error: {0}")]
    External(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal server errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

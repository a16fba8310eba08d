//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Payload exceeds the configured size ceiling.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Payload media type is not accepted.
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Required configuration is missing or invalid. Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A remote collaborator (object store, renderer) failed.
    #[error("External service error ({status}): {message}")]
    ExternalService {
        /// Status reported for the remote failure.
        status: u16,
        /// Remote message, passed through verbatim.
        message: String,
    },

    /// A remote call did not finish in time.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create an external service error.
    #[must_use]
    pub fn external(status: u16, message: impl Into<String>) -> Self {
        Self::ExternalService {
            status,
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::PayloadTooLarge(_) => 413,
            Self::UnsupportedMediaType(_) => 415,
            Self::ExternalService { status, .. } => *status,
            Self::Timeout(_) => 504,
            Self::Configuration(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the human-readable message without the category prefix.
    ///
    /// This is what clients display, so remote messages pass through untouched.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(msg)
            | Self::PayloadTooLarge(msg)
            | Self::UnsupportedMediaType(msg)
            | Self::NotFound(msg)
            | Self::Configuration(msg)
            | Self::Timeout(msg)
            | Self::Internal(msg) => msg,
            Self::ExternalService { message, .. } => message,
        }
    }
}

//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The remote store rejected or failed the operation.
    #[error("{message}")]
    Remote {
        /// HTTP-equivalent status of the failure, when known.
        status: Option<u16>,
        /// Message reported by the store.
        message: String,
    },

    /// The operation did not finish within the configured timeout.
    #[error("storage operation timed out after {secs}s")]
    Timeout {
        /// Timeout that elapsed.
        secs: u64,
    },

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    /// Create a remote error.
    #[must_use]
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Status reported by the store, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => *status,
            Self::Timeout { .. } | Self::Configuration(_) => None,
        }
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        let status = match err.kind() {
            opendal::ErrorKind::NotFound => Some(404),
            opendal::ErrorKind::PermissionDenied => Some(403),
            opendal::ErrorKind::RateLimited => Some(429),
            opendal::ErrorKind::Unsupported => Some(501),
            opendal::ErrorKind::ConfigInvalid => Some(500),
            _ => None,
        };
        Self::Remote {
            status,
            message: err.to_string(),
        }
    }
}

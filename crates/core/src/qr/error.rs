//! QR issuance error types.

use thiserror::Error;

use crate::storage::StorageError;

/// QR issuance errors.
#[derive(Debug, Error)]
pub enum QrError {
    /// Nothing to encode.
    #[error("QR target URL is empty")]
    EmptyTarget,

    /// The target could not be encoded as a QR symbol.
    #[error("failed to encode QR code: {0}")]
    Encode(String),

    /// The rendered symbol could not be written as PNG.
    #[error("failed to write QR image: {0}")]
    Image(String),

    /// Persisting the rendered image failed.
    #[error("failed to store QR image: {0}")]
    Storage(#[from] StorageError),

    /// Issuance did not finish within the configured timeout.
    #[error("QR issuance timed out after {secs}s")]
    Timeout {
        /// Timeout that elapsed.
        secs: u64,
    },
}

impl From<qrcode::types::QrError> for QrError {
    fn from(err: qrcode::types::QrError) -> Self {
        Self::Encode(err.to_string())
    }
}

impl From<image::ImageError> for QrError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err.to_string())
    }
}

//! Upload pipeline error types.

use qrshare_shared::AppError;
use thiserror::Error;

use super::types::UploadStage;
use crate::qr::QrError;
use crate::storage::{StorageError, StoredAsset};

/// Status used when the store failed without reporting an error status.
const BAD_GATEWAY: u16 = 502;

/// Upload pipeline errors.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The multipart body has no `file` field.
    #[error("No file provided")]
    MissingFile,

    /// The multipart body has more than one `file` field.
    #[error("Multiple file fields are not allowed; send exactly one field named 'file'")]
    MultipleFiles,

    /// The multipart body could not be read.
    #[error("Malformed upload: {0}")]
    Malformed(String),

    /// The request body exceeded the transport limit before it was read.
    #[error("Upload body too large: {0}")]
    BodyTooLarge(String),

    /// The file has no content.
    #[error("File is empty")]
    EmptyFile,

    /// The file exceeds the configured ceiling.
    #[error("File size {size} bytes exceeds maximum allowed {max} bytes")]
    FileTooLarge {
        /// Actual size.
        size: u64,
        /// Configured ceiling.
        max: u64,
    },

    /// The file type is not accepted.
    #[error("File type '{mime_type}' is not allowed")]
    UnsupportedType {
        /// Resolved media type.
        mime_type: String,
    },

    /// The store rejected or failed the upload.
    #[error(transparent)]
    Storage(StorageError),

    /// The file was stored but its QR code could not be issued.
    ///
    /// The stored asset is kept; it stays reachable at its public URL.
    #[error("QR code generation failed: {source}")]
    QrRender {
        /// The file that was stored before the failure.
        asset: Box<StoredAsset>,
        /// Why issuance failed.
        source: QrError,
    },
}

impl UploadError {
    /// Create a QR render error for an already stored asset.
    #[must_use]
    pub fn qr_render(asset: StoredAsset, source: QrError) -> Self {
        Self::QrRender {
            asset: Box::new(asset),
            source,
        }
    }

    /// Last stage the request completed before failing.
    #[must_use]
    pub const fn stage(&self) -> UploadStage {
        match self {
            Self::MissingFile
            | Self::MultipleFiles
            | Self::Malformed(_)
            | Self::BodyTooLarge(_)
            | Self::EmptyFile
            | Self::FileTooLarge { .. }
            | Self::UnsupportedType { .. } => UploadStage::Received,
            Self::Storage(_) => UploadStage::Validated,
            Self::QrRender { .. } => UploadStage::Stored,
        }
    }

    /// Whether the request was rejected before any remote call.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self.stage(), UploadStage::Received)
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        let message = err.to_string();
        match err {
            UploadError::MissingFile
            | UploadError::MultipleFiles
            | UploadError::Malformed(_)
            | UploadError::EmptyFile => Self::Validation(message),
            UploadError::BodyTooLarge(_) | UploadError::FileTooLarge { .. } => {
                Self::PayloadTooLarge(message)
            }
            UploadError::UnsupportedType { .. } => Self::UnsupportedMediaType(message),
            UploadError::Storage(StorageError::Timeout { .. })
            | UploadError::QrRender {
                source: QrError::Timeout { .. } | QrError::Storage(StorageError::Timeout { .. }),
                ..
            } => Self::Timeout(message),
            UploadError::Storage(StorageError::Configuration(_)) => Self::Internal(message),
            UploadError::Storage(storage) => {
                let status = storage
                    .status()
                    .filter(|s| (400..600).contains(s))
                    .unwrap_or(BAD_GATEWAY);
                Self::external(status, message)
            }
            UploadError::QrRender { .. } => Self::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset() -> StoredAsset {
        StoredAsset {
            key: "uploads/1/a.txt".into(),
            public_url: "https://files.test/uploads/1/a.txt".into(),
            download_url: None,
            content_type: "text/plain".into(),
            size: 1,
        }
    }

    #[test]
    fn test_validation_errors_map_to_client_statuses() {
        assert_eq!(AppError::from(UploadError::MissingFile).status_code(), 400);
        assert_eq!(AppError::from(UploadError::EmptyFile).status_code(), 400);
        assert_eq!(
            AppError::from(UploadError::FileTooLarge { size: 2, max: 1 }).status_code(),
            413
        );
        assert_eq!(
            AppError::from(UploadError::UnsupportedType {
                mime_type: "text/html".into()
            })
            .status_code(),
            415
        );
    }

    #[test]
    fn test_missing_file_message() {
        let err = AppError::from(UploadError::MissingFile);
        assert_eq!(err.message(), "No file provided");
    }

    #[test]
    fn test_storage_error_keeps_remote_status_and_message() {
        let err = AppError::from(UploadError::Storage(StorageError::remote(
            Some(403),
            "Invalid Signature",
        )));
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.message(), "Invalid Signature");
    }

    #[test]
    fn test_storage_error_without_status_is_bad_gateway() {
        let err = AppError::from(UploadError::Storage(StorageError::remote(
            None,
            "connection reset",
        )));
        assert_eq!(err.status_code(), 502);

        let err = AppError::from(UploadError::Storage(StorageError::remote(
            Some(200),
            "odd",
        )));
        assert_eq!(err.status_code(), 502);
    }

    #[test]
    fn test_timeouts_map_to_gateway_timeout() {
        let err = AppError::from(UploadError::Storage(StorageError::Timeout { secs: 30 }));
        assert_eq!(err.status_code(), 504);

        let err = AppError::from(UploadError::qr_render(asset(), QrError::Timeout { secs: 10 }));
        assert_eq!(err.status_code(), 504);
    }

    #[test]
    fn test_qr_failure_is_server_error() {
        let err = UploadError::qr_render(asset(), QrError::Encode("data too long".into()));
        assert_eq!(err.stage(), UploadStage::Stored);
        let app = AppError::from(err);
        assert_eq!(app.status_code(), 500);
        assert!(app.message().contains("data too long"));
    }

    #[test]
    fn test_stage_and_client_error_flags() {
        assert_eq!(UploadError::MissingFile.stage(), UploadStage::Received);
        assert!(UploadError::MissingFile.is_client_error());
        let storage = UploadError::Storage(StorageError::remote(None, "x"));
        assert_eq!(storage.stage(), UploadStage::Validated);
        assert!(!storage.is_client_error());
    }
}

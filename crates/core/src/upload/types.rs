//! Upload pipeline data types.

use std::fmt;

use bytes::Bytes;

/// A file as received from the client. Lives for one request.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Original file name as sent by the client.
    pub file_name: String,
    /// Declared media type, if the client sent one.
    pub content_type: Option<String>,
    /// File contents.
    pub payload: Bytes,
}

impl UploadRequest {
    /// Create a new upload request.
    #[must_use]
    pub fn new(
        file_name: impl Into<String>,
        content_type: Option<String>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            payload: payload.into(),
        }
    }

    /// Payload size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.payload.len() as u64
    }
}

/// An upload that passed the acceptance policy.
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    /// Original file name.
    pub file_name: String,
    /// Resolved media type.
    pub content_type: String,
    /// File contents, never empty.
    pub payload: Bytes,
}

/// Pipeline step a request reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    /// Multipart body read.
    Received,
    /// Acceptance policy passed.
    Validated,
    /// File persisted.
    Stored,
    /// QR code rendered and persisted.
    QrIssued,
    /// Result returned to the client.
    Responded,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::Stored => "stored",
            Self::QrIssued => "qr_issued",
            Self::Responded => "responded",
        })
    }
}

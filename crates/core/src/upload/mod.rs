//! Upload pipeline.
//!
//! One request moves through `Received → Validated → Stored → QrIssued →
//! Responded`; any step may fail the whole request. There is no retry and no
//! compensating delete: a file stored before a QR failure stays stored.

mod error;
mod policy;
mod service;
mod types;


pub use error::UploadError;
pub use policy::{UploadPolicy, resolve_content_type};
pub use service::UploadService;
pub use types::{UploadRequest, UploadStage, ValidatedUpload};

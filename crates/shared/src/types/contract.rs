//! JSON contract of `POST /upload`.
//!
//! The server serializes [`UploadResult`] and [`ErrorBody`]; clients parse
//! responses back with [`parse_upload_result`] and [`error_message`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Successful upload response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    /// Publicly fetchable URL of the stored file.
    pub public_file_url: String,
    /// Publicly fetchable URL of the QR code PNG.
    pub qr_code_url: String,
    /// Download variant of the file URL, when the store provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_file_url: Option<String>,
    /// URL encoded in the QR code. Defaults to `public_file_url` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_target_url: Option<String>,
    /// File name as sent by the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_file_name: Option<String>,
    /// Resolved media type of the stored file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl UploadResult {
    /// The URL the QR code resolves to.
    #[must_use]
    pub fn qr_target(&self) -> &str {
        self.qr_target_url
            .as_deref()
            .unwrap_or(&self.public_file_url)
    }
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message, shown to the user verbatim.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
}

/// A response that breaks the upload contract.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContractError {
    /// A mandatory URL field is missing or empty.
    #[error("response is missing required field `{0}`")]
    MissingField(&'static str),

    /// The body could not be read as an upload result.
    #[error("malformed upload response: {0}")]
    Malformed(String),
}

/// Fields a successful response must carry.
pub const REQUIRED_FIELDS: [&str; 2] = ["publicFileUrl", "qrCodeUrl"];

/// Parses a response body as an [`UploadResult`].
///
/// Missing `publicFileUrl` or `qrCodeUrl` is a contract violation regardless
/// of the HTTP status the body came with.
pub fn parse_upload_result(body: &Value) -> Result<UploadResult, ContractError> {
    for field in REQUIRED_FIELDS {
        let present = body
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.trim().is_empty());
        if !present {
            return Err(ContractError::MissingField(field));
        }
    }

    serde_json::from_value(body.clone()).map_err(|e| ContractError::Malformed(e.to_string()))
}

/// Extracts the message to show for a failed response.
///
/// Looks at a top-level `error` string, then `error.message`, then a top-level
/// `message`, and falls back to `Upload failed (<status>)`.
#[must_use]
pub fn error_message(status: u16, body: &Value) -> String {
    let non_empty = |v: Option<&Value>| {
        v.and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(String::from)
    };

    non_empty(body.get("error"))
        .or_else(|| non_empty(body.get("error").and_then(|e| e.get("message"))))
        .or_else(|| non_empty(body.get("message")))
        .unwrap_or_else(|| format!("Upload failed ({status})"))
}

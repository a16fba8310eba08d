//! HTTP client for `POST /upload`.
//!
//! Sends one file as the multipart field `file` and reads the response per
//! the upload contract: a success must carry `publicFileUrl` and `qrCodeUrl`,
//! and a failure's message is taken from the body the way
//! [`error_message`] describes.

use std::path::Path;
use std::time::Duration;

use qrshare_shared::types::{ContractError, UploadResult, error_message, parse_upload_result};
use reqwest::{Client, multipart};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Upload client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or the response not read.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The file to upload could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was being read.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The service answered with an error status.
    #[error("{message}")]
    Rejected {
        /// HTTP status.
        status: u16,
        /// Message to show the user, verbatim.
        message: String,
    },

    /// The service answered with a body that breaks the contract.
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl ClientError {
    /// HTTP status of a rejected upload.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Client for a qrshare service.
#[derive(Clone, Debug)]
pub struct UploadClient {
    client: Client,
    base_url: String,
}

impl UploadClient {
    /// Create a client for the service at `base_url`.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client reusing an existing `reqwest` client.
    #[must_use]
    pub fn with_client(client: Client, base_url: impl AsRef<str>) -> Self {
        Self {
            client,
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
        }
    }

    /// Service base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload `data` as `file_name`.
    ///
    /// `content_type` is sent as the part's media type when given.
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        data: impl Into<Vec<u8>>,
    ) -> Result<UploadResult, ClientError> {
        let mut part = multipart::Part::bytes(data.into()).file_name(file_name.to_string());
        if let Some(content_type) = content_type {
            part = part.mime_str(content_type)?;
        }
        let form = multipart::Form::new().part("file", part);

        let url = format!("{}/upload", self.base_url);
        debug!(url = %url, file_name, "uploading");
        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        let text = response.text().await?;
        read_response(status.as_u16(), status.is_success(), &text)
    }

    /// Upload the file at `path`, guessing its media type from the extension.
    pub async fn upload_path(&self, path: impl AsRef<Path>) -> Result<UploadResult, ClientError> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await.map_err(|source| ClientError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file");
        let content_type = mime_guess::from_path(path).first_raw();

        self.upload(file_name, content_type, data).await
    }
}

/// Interpret a response body.
fn read_response(status: u16, success: bool, text: &str) -> Result<UploadResult, ClientError> {
    let body = serde_json::from_str::<Value>(text);

    if !success {
        let message = match &body {
            Ok(value) => error_message(status, value),
            Err(_) => error_message(status, &Value::Null),
        };
        return Err(ClientError::Rejected { status, message });
    }

    let body = body.map_err(|e| ContractError::Malformed(e.to_string()))?;
    Ok(parse_upload_result(&body)?)
}

//! Upload pipeline orchestration.

use std::sync::Arc;

use qrshare_shared::types::UploadResult;
use tracing::{debug, info, warn};

use super::error::UploadError;
use super::policy::UploadPolicy;
use super::types::{UploadRequest, UploadStage};
use crate::qr::QrIssuer;
use crate::storage::AssetStore;

/// Stores uploaded files and issues a QR code for each.
pub struct UploadService {
    store: Arc<dyn AssetStore>,
    qr: Arc<dyn QrIssuer>,
    policy: UploadPolicy,
}

impl UploadService {
    /// Create a new upload service.
    #[must_use]
    pub fn new(store: Arc<dyn AssetStore>, qr: Arc<dyn QrIssuer>, policy: UploadPolicy) -> Self {
        Self { store, qr, policy }
    }

    /// Acceptance policy applied to every upload.
    #[must_use]
    pub const fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Run one upload through the pipeline.
    ///
    /// The file is stored first; the QR code encodes the stored file's
    /// public URL. Exactly one store write and one QR issuance happen per
    /// successful call.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The upload fails the acceptance policy (nothing remote is called)
    /// - The store rejects the file (no QR code is issued)
    /// - The QR code cannot be issued (the stored file is kept)
    pub async fn process(&self, request: UploadRequest) -> Result<UploadResult, UploadError> {
        debug!(
            stage = %UploadStage::Received,
            file_name = %request.file_name,
            size = request.size(),
            "upload received"
        );

        let upload = self.policy.validate(request)?;
        debug!(
            stage = %UploadStage::Validated,
            content_type = %upload.content_type,
            "upload validated"
        );

        let asset = self
            .store
            .store(upload.payload, &upload.content_type, &upload.file_name)
            .await
            .map_err(UploadError::Storage)?;
        info!(
            stage = %UploadStage::Stored,
            key = %asset.key,
            size = asset.size,
            "file stored"
        );

        let qr = match self.qr.issue(&asset.public_url).await {
            Ok(qr) => qr,
            Err(source) => {
                warn!(
                    key = %asset.key,
                    error = %source,
                    "QR issuance failed; stored file is kept"
                );
                return Err(UploadError::qr_render(asset, source));
            }
        };
        debug!(stage = %UploadStage::QrIssued, qr_key = %qr.asset.key, "QR code issued");

        let result = UploadResult {
            public_file_url: asset.public_url.clone(),
            qr_code_url: qr.image_url,
            download_file_url: asset.download_url,
            qr_target_url: Some(qr.target_url),
            original_file_name: Some(upload.file_name),
            mime_type: Some(asset.content_type),
        };
        info!(stage = %UploadStage::Responded, url = %result.public_file_url, "upload complete");

        Ok(result)
    }
}

//! QR issuance backed by an asset store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use qrshare_shared::config::QrSettings;
use tracing::debug;
use uuid::Uuid;

use super::error::QrError;
use super::render::{RenderOptions, render_png};
use crate::storage::{AssetStore, StoredAsset};

/// Content type of rendered QR codes.
pub const QR_CONTENT_TYPE: &str = "image/png";

/// A rendered and persisted QR code.
#[derive(Debug, Clone)]
pub struct QrArtifact {
    /// URL encoded in the QR code.
    pub target_url: String,
    /// URL at which the PNG is retrievable.
    pub image_url: String,
    /// The PNG itself.
    pub png: Bytes,
    /// Store record of the PNG.
    pub asset: StoredAsset,
}

/// Issues QR codes for target URLs.
#[async_trait]
pub trait QrIssuer: Send + Sync {
    /// Render a QR code for `target_url` and make it retrievable.
    async fn issue(&self, target_url: &str) -> Result<QrArtifact, QrError>;
}

/// Storage key for a QR image.
///
/// Format: `qr/{uuid}.png`
#[must_use]
pub fn generate_qr_key() -> String {
    format!("qr/{}.png", Uuid::new_v4())
}

/// QR issuance settings.
#[derive(Debug, Clone, Copy)]
pub struct QrConfig {
    /// Rendering parameters.
    pub render: RenderOptions,
    /// Upper bound for one issuance, rendering and storing included.
    pub timeout: Duration,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            render: RenderOptions::default(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl From<&QrSettings> for QrConfig {
    fn from(settings: &QrSettings) -> Self {
        Self {
            render: RenderOptions {
                module_size: settings.module_size,
                quiet_zone: settings.quiet_zone,
            },
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

/// Renders QR codes locally and persists them through an [`AssetStore`].
pub struct QrService {
    store: Arc<dyn AssetStore>,
    config: QrConfig,
}

impl QrService {
    /// Create a new QR service.
    #[must_use]
    pub fn new(store: Arc<dyn AssetStore>, config: QrConfig) -> Self {
        Self { store, config }
    }

    async fn render_and_store(&self, target_url: &str) -> Result<QrArtifact, QrError> {
        let png = Bytes::from(render_png(target_url, self.config.render)?);
        let key = generate_qr_key();
        let asset = self.store.put(&key, png.clone(), QR_CONTENT_TYPE).await?;

        debug!(key = %asset.key, bytes = png.len(), "QR code stored");

        Ok(QrArtifact {
            target_url: target_url.to_string(),
            image_url: asset.public_url.clone(),
            png,
            asset,
        })
    }
}

#[async_trait]
impl QrIssuer for QrService {
    async fn issue(&self, target_url: &str) -> Result<QrArtifact, QrError> {
        tokio::time::timeout(self.config.timeout, self.render_and_store(target_url))
            .await
            .map_err(|_| QrError::Timeout {
                secs: self.config.timeout.as_secs(),
            })?
    }
}

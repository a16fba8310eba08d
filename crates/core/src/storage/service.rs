//! Storage service implementation using Apache OpenDAL.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use opendal::{ErrorKind, Operator, services};
use tracing::{debug, warn};
use uuid::Uuid;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Durable record of an object held by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    /// Storage key, unique per stored object.
    pub key: String,
    /// Publicly fetchable URL.
    pub public_url: String,
    /// Presigned download URL, when the backend can sign reads.
    pub download_url: Option<String>,
    /// Content type the object was stored with.
    pub content_type: String,
    /// Size in bytes.
    pub size: u64,
}

/// Object store the upload pipeline writes to.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Write `payload` under `key` and describe the stored object.
    async fn put(
        &self,
        key: &str,
        payload: Bytes,
        content_type: &str,
    ) -> Result<StoredAsset, StorageError>;

    /// Store a user file under a freshly generated key.
    ///
    /// Every call creates a new asset, even for identical payloads.
    async fn store(
        &self,
        payload: Bytes,
        content_type: &str,
        file_name: &str,
    ) -> Result<StoredAsset, StorageError> {
        let key = generate_asset_key(file_name);
        self.put(&key, payload, content_type).await
    }
}

/// Storage key for an uploaded file.
///
/// Format: `uploads/{uuid}/{sanitized_filename}`
#[must_use]
pub fn generate_asset_key(file_name: &str) -> String {
    format!("uploads/{}/{}", Uuid::new_v4(), sanitize_filename(file_name))
}

/// Storage service backed by an OpenDAL operator.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
        }
    }

    /// Public URL for a storage key.
    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.config.public_base_url, key)
    }

    /// Run a storage call under the configured timeout.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StorageError>>,
    ) -> Result<T, StorageError> {
        tokio::time::timeout(self.config.timeout, call)
            .await
            .map_err(|_| StorageError::Timeout {
                secs: self.config.timeout.as_secs(),
            })?
    }

    /// Generate presigned URL for download, if the backend supports it.
    ///
    /// Signing runs under the same timeout as writes. A signing failure or
    /// timeout is logged and yields `None`: the object is already stored and
    /// its public URL remains valid.
    async fn presign_download(&self, key: &str) -> Option<String> {
        if !self.operator.info().full_capability().presign_read {
            return None;
        }

        let signing = async {
            self.operator
                .presign_read(key, self.presign_ttl())
                .await
                .map_err(StorageError::from)
        };
        match self.bounded(signing).await {
            Ok(presigned) => Some(presigned.uri().to_string()),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to presign download URL");
                None
            }
        }
    }

    fn presign_ttl(&self) -> Duration {
        self.config.presign_ttl
    }

    /// Check if a file exists in storage.
    pub async fn exists(&self, key: &str) -> bool {
        match self.operator.stat(key).await {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to stat object");
                false
            }
        }
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

#[async_trait]
impl AssetStore for StorageService {
    async fn put(
        &self,
        key: &str,
        payload: Bytes,
        content_type: &str,
    ) -> Result<StoredAsset, StorageError> {
        let size = payload.len() as u64;
        let set_content_type = self
            .operator
            .info()
            .full_capability()
            .write_with_content_type;

        self.bounded(async {
            if set_content_type {
                self.operator
                    .write_with(key, payload)
                    .content_type(content_type)
                    .await?;
            } else {
                self.operator.write(key, payload).await?;
            }
            Ok::<(), StorageError>(())
        })
        .await?;

        let download_url = self.presign_download(key).await;

        debug!(
            key = %key,
            size,
            provider = self.provider_name(),
            "Object stored"
        );

        Ok(StoredAsset {
            key: key.to_string(),
            public_url: self.public_url(key),
            download_url,
            content_type: content_type.to_string(),
            size,
        })
    }
}

/// Sanitize filename for storage key.
///
/// Removes or replaces characters that could cause issues in storage paths.
/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
fn sanitize_filename(filename: &str) -> String {
    let sanitized: String = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches('.').is_empty() {
        "file".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_service(root: &std::path::Path) -> StorageService {
        let config = StorageConfig::new(
            StorageProvider::local_fs(root),
            "http://localhost:8080/files/",
        );
        StorageService::from_config(config).expect("should create service")
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("invoice.pdf"), "invoice.pdf");
        assert_eq!(sanitize_filename("my file (1).pdf"), "my_file__1_.pdf");
        assert_eq!(sanitize_filename("test@#$%.doc"), "test____.doc");
        assert_eq!(sanitize_filename("日本語.pdf"), "___.pdf");
    }

    #[test]
    fn test_sanitize_filename_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\photo.jpg"), "photo.jpg");
        assert_eq!(sanitize_filename(".."), "file");
        assert_eq!(sanitize_filename(""), "file");
    }

    #[test]
    fn test_generate_asset_key_is_unique() {
        let a = generate_asset_key("photo.jpg");
        let b = generate_asset_key("photo.jpg");
        assert_ne!(a, b);

        let parts: Vec<&str> = a.split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "uploads");
        assert!(Uuid::parse_str(parts[1]).is_ok());
        assert_eq!(parts[2], "photo.jpg");
    }

    #[tokio::test]
    async fn test_store_writes_object_and_builds_public_url() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = local_service(dir.path());

        let asset = service
            .store(Bytes::from_static(b"hello"), "text/plain", "note.txt")
            .await
            .expect("store succeeds");

        assert!(asset.key.starts_with("uploads/"));
        assert!(asset.key.ends_with("/note.txt"));
        assert_eq!(
            asset.public_url,
            format!("http://localhost:8080/files/{}", asset.key)
        );
        assert_eq!(asset.size, 5);
        assert_eq!(asset.content_type, "text/plain");
        // The filesystem backend cannot sign URLs.
        assert!(asset.download_url.is_none());

        assert!(service.exists(&asset.key).await);
        let on_disk = std::fs::read(dir.path().join(&asset.key)).expect("file on disk");
        assert_eq!(on_disk, b"hello");
    }

    #[tokio::test]
    async fn test_same_payload_twice_yields_distinct_assets() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = local_service(dir.path());

        let first = service
            .store(Bytes::from_static(b"same"), "text/plain", "a.txt")
            .await
            .expect("first store");
        let second = service
            .store(Bytes::from_static(b"same"), "text/plain", "a.txt")
            .await
            .expect("second store");

        assert_ne!(first.key, second.key);
        assert_ne!(first.public_url, second.public_url);
    }

    #[tokio::test]
    async fn test_bounded_call_times_out() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = StorageConfig::new(StorageProvider::local_fs(dir.path()), "http://localhost")
            .with_timeout(Duration::from_millis(20));
        let service = StorageService::from_config(config).expect("should create service");

        let err = service
            .bounded(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, StorageError>(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_presign_skipped_when_backend_cannot_sign() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = local_service(dir.path());
        assert!(service.presign_download("uploads/a/b.txt").await.is_none());
    }

    #[tokio::test]
    async fn test_exists_false_for_missing_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = local_service(dir.path());
        assert!(!service.exists("uploads/missing/file.txt").await);
    }
}

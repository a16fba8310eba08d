//! Storage configuration types.

use std::path::PathBuf;
use std::time::Duration;

use qrshare_shared::config::{ServerConfig, StorageKind, StorageSettings, required};
use qrshare_shared::{AppError, AppResult};

/// Storage provider configuration.
#[derive(Debug, Clone)]
pub enum StorageProvider {
    /// S3-compatible storage: Cloudflare R2, AWS S3, DigitalOcean Spaces
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Bucket region.
        region: String,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
}

impl StorageProvider {
    /// Create S3-compatible provider.
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create local filesystem provider.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the provider name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::LocalFs { .. } => "local",
        }
    }

    /// Root directory when the provider is the local filesystem.
    #[must_use]
    pub fn local_root(&self) -> Option<&PathBuf> {
        match self {
            Self::LocalFs { root } => Some(root),
            Self::S3 { .. } => None,
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Base URL that stored keys are appended to, without trailing slash.
    pub public_base_url: String,
    /// Upper bound for a single storage call.
    pub timeout: Duration,
    /// Presigned download URL TTL.
    pub presign_ttl: Duration,
}

impl StorageConfig {
    /// Default call timeout: 30 seconds.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    /// Default download TTL: 1 hour.
    pub const DEFAULT_PRESIGN_TTL: Duration = Duration::from_secs(3600);

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider, public_base_url: impl Into<String>) -> Self {
        Self {
            provider,
            public_base_url: trim_base(public_base_url.into()),
            timeout: Self::DEFAULT_TIMEOUT,
            presign_ttl: Self::DEFAULT_PRESIGN_TTL,
        }
    }

    /// Set the per-call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set presigned download URL TTL.
    #[must_use]
    pub fn with_presign_ttl(mut self, ttl: Duration) -> Self {
        self.presign_ttl = ttl;
        self
    }

    /// Build the storage configuration from application settings.
    ///
    /// For `s3` every credential and the public base URL are required; a
    /// missing one is a fatal configuration error naming the environment
    /// variable to set.
    pub fn from_settings(settings: &StorageSettings, server: &ServerConfig) -> AppResult<Self> {
        let config = match settings.provider {
            StorageKind::S3 => {
                let creds = settings.credentials()?;
                let endpoint = settings.endpoint.clone().unwrap_or_else(|| {
                    format!("https://{}.r2.cloudflarestorage.com", creds.account_name)
                });
                let public_base_url =
                    required(settings.public_base_url.as_deref(), "public_base_url")?;

                Self::new(
                    StorageProvider::s3(
                        endpoint,
                        settings.bucket.clone(),
                        creds.api_key,
                        creds.api_secret,
                        settings.region.clone(),
                    ),
                    public_base_url,
                )
            }
            StorageKind::Local => {
                let public_base_url = settings
                    .public_base_url
                    .clone()
                    .unwrap_or_else(|| format!("{}/files", server.local_base_url()));
                Self::new(StorageProvider::local_fs(settings.root.clone()), public_base_url)
            }
        };

        if !config.public_base_url.starts_with("http://")
            && !config.public_base_url.starts_with("https://")
        {
            return Err(AppError::Configuration(format!(
                "public base URL must be absolute, got '{}'",
                config.public_base_url
            )));
        }

        Ok(config
            .with_timeout(Duration::from_secs(settings.timeout_secs))
            .with_presign_ttl(Duration::from_secs(settings.presign_ttl_secs)))
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

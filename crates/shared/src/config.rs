//! Application configuration management.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Prefix for environment variable overrides, e.g. `QRSHARE__SERVER__PORT`.
pub const ENV_PREFIX: &str = "QRSHARE";

/// Separator between nested keys in environment variable names.
pub const ENV_SEPARATOR: &str = "__";

/// Returns the environment variable that sets `section.key`.
#[must_use]
pub fn env_var_name(section: &str, key: &str) -> String {
    format!(
        "{ENV_PREFIX}{ENV_SEPARATOR}{}{ENV_SEPARATOR}{}",
        section.to_uppercase(),
        key.to_uppercase()
    )
}

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Object storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Upload acceptance policy.
    #[serde(default)]
    pub upload: UploadSettings,
    /// Cross-origin policy.
    #[serde(default)]
    pub cors: CorsSettings,
    /// QR rendering settings.
    #[serde(default)]
    pub qr: QrSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Socket address string to bind.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL under which this server is reachable from the local machine.
    #[must_use]
    pub fn local_base_url(&self) -> String {
        let host = match self.host.as_str() {
            "0.0.0.0" | "::" | "[::]" => "localhost",
            other => other,
        };
        format!("http://{host}:{}", self.port)
    }
}

/// Which storage backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// S3-compatible object storage (Cloudflare R2 by default).
    #[default]
    S3,
    /// Local filesystem, served back by the API. Development only.
    Local,
}

/// Object storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Backend selection.
    #[serde(default)]
    pub provider: StorageKind,
    /// Cloud account name (required for `s3`).
    #[serde(default)]
    pub account_name: Option<String>,
    /// API key (required for `s3`).
    #[serde(default)]
    pub api_key: Option<String>,
    /// API secret (required for `s3`).
    #[serde(default)]
    pub api_secret: Option<String>,
    /// Bucket name.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Explicit endpoint. Derived from the account name when absent.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Bucket region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Base URL under which stored objects are publicly readable.
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// Root directory for the `local` provider.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Upper bound for a single storage call.
    #[serde(default = "default_storage_timeout")]
    pub timeout_secs: u64,
    /// Lifetime of presigned download URLs.
    #[serde(default = "default_presign_ttl")]
    pub presign_ttl_secs: u64,
}

fn default_bucket() -> String {
    "qrshare".to_string()
}

fn default_region() -> String {
    "auto".to_string()
}

fn default_root() -> PathBuf {
    PathBuf::from("./storage")
}

fn default_storage_timeout() -> u64 {
    30
}

fn default_presign_ttl() -> u64 {
    3600 // 1 hour
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            provider: StorageKind::default(),
            account_name: None,
            api_key: None,
            api_secret: None,
            bucket: default_bucket(),
            endpoint: None,
            region: default_region(),
            public_base_url: None,
            root: default_root(),
            timeout_secs: default_storage_timeout(),
            presign_ttl_secs: default_presign_ttl(),
        }
    }
}

/// Credentials for a cloud storage account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageCredentials {
    /// Account name.
    pub account_name: String,
    /// API key.
    pub api_key: String,
    /// API secret.
    pub api_secret: String,
}

impl StorageSettings {
    /// Returns the cloud credentials, failing on the first missing one.
    ///
    /// The error names the environment variable to set.
    pub fn credentials(&self) -> AppResult<StorageCredentials> {
        Ok(StorageCredentials {
            account_name: required(self.account_name.as_deref(), "account_name")?,
            api_key: required(self.api_key.as_deref(), "api_key")?,
            api_secret: required(self.api_secret.as_deref(), "api_secret")?,
        })
    }
}

/// A non-blank `storage` setting, or a configuration error naming its
/// environment variable.
pub fn required(value: Option<&str>, key: &str) -> AppResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::Configuration(format!(
            "missing required environment variable {}",
            env_var_name("storage", key)
        ))),
    }
}

/// Upload acceptance policy.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    /// Largest accepted payload in bytes (inclusive).
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    /// Accepted MIME type prefixes, e.g. `image/`.
    #[serde(default = "default_mime_prefixes")]
    pub allowed_mime_prefixes: Vec<String>,
    /// Accepted file extensions, without the dot.
    #[serde(default = "default_extensions")]
    pub allowed_extensions: Vec<String>,
}

fn default_max_bytes() -> u64 {
    10 * 1024 * 1024 // 10 MiB
}

fn default_mime_prefixes() -> Vec<String> {
    ["image/", "application/pdf", "text/plain"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif", "webp", "pdf", "txt"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            allowed_mime_prefixes: default_mime_prefixes(),
            allowed_extensions: default_extensions(),
        }
    }
}

/// Cross-origin configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsSettings {
    /// Comma-separated origins; `*` inside an entry matches any sequence.
    /// Absent or `*` allows every origin.
    #[serde(default)]
    pub allowed_origins: Option<String>,
}

/// QR rendering configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct QrSettings {
    /// Pixels per QR module.
    #[serde(default = "default_module_size")]
    pub module_size: u32,
    /// Width of the blank border, in modules.
    #[serde(default = "default_quiet_zone")]
    pub quiet_zone: u32,
    /// Upper bound for issuing one QR code, rendering and storing included.
    #[serde(default = "default_qr_timeout")]
    pub timeout_secs: u64,
}

fn default_module_size() -> u32 {
    8
}

fn default_quiet_zone() -> u32 {
    4
}

fn default_qr_timeout() -> u64 {
    10
}

impl Default for QrSettings {
    fn default() -> Self {
        Self {
            module_size: default_module_size(),
            quiet_zone: default_quiet_zone(),
            timeout_secs: default_qr_timeout(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("upload.allowed_mime_prefixes")
                    .with_list_parse_key("upload.allowed_extensions"),
            )
            .build()?;

        config.try_deserialize()
    }
}

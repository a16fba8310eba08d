//! qrshare API Server
//!
//! Accepts file uploads, stores them, and returns a public URL with a QR code.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qrshare_api::{AppState, create_router};
use qrshare_core::cors::OriginPolicy;
use qrshare_core::qr::{QrConfig, QrService};
use qrshare_core::storage::{AssetStore, StorageConfig, StorageService};
use qrshare_core::upload::{UploadPolicy, UploadService};
use qrshare_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qrshare=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Missing credentials stop the process here, before anything listens.
    let storage_config = StorageConfig::from_settings(&config.storage, &config.server)?;
    let files_root = storage_config.provider.local_root().cloned();
    let storage = Arc::new(StorageService::from_config(storage_config)?);
    info!(
        provider = storage.provider_name(),
        public_base_url = %storage.config().public_base_url,
        "Storage configured"
    );

    let store: Arc<dyn AssetStore> = storage.clone();
    let qr = Arc::new(QrService::new(store.clone(), QrConfig::from(&config.qr)));
    let uploads = UploadService::new(store, qr, UploadPolicy::from(&config.upload));

    let policy = OriginPolicy::from_config(config.cors.allowed_origins.as_deref());
    if policy.is_open() {
        warn!("CORS open: every origin is allowed");
    } else {
        info!(
            origins = config.cors.allowed_origins.as_deref().unwrap_or_default(),
            "CORS restricted"
        );
    }

    let state = AppState {
        policy: Arc::new(policy),
        uploads: Arc::new(uploads),
        storage_provider: storage.provider_name(),
        files_root,
    };

    let app = create_router(state);

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

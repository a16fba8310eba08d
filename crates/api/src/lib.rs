//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - `POST /upload` and `GET /health`
//! - The origin policy middleware
//! - Static serving of the local storage root under `/files`
//! - JSON error responses

pub mod error;
pub mod middleware;
pub mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use qrshare_core::cors::OriginPolicy;
use qrshare_core::upload::UploadService;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::middleware::cors::with_origin_policy;

/// Room left in the request body limit for multipart framing around the file.
pub const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cross-origin policy, compiled once at startup.
    pub policy: Arc<OriginPolicy>,
    /// Upload pipeline.
    pub uploads: Arc<UploadService>,
    /// Name of the active storage provider, reported by `/health`.
    pub storage_provider: &'static str,
    /// Root served under `/files` when the local storage provider is active.
    pub files_root: Option<PathBuf>,
}

impl AppState {
    /// Request body limit derived from the upload ceiling.
    #[must_use]
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.uploads.policy().max_bytes)
            .unwrap_or(usize::MAX)
            .saturating_add(MULTIPART_OVERHEAD)
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let mut router = routes::api_routes();

    if let Some(root) = &state.files_root {
        router = router.nest_service("/files", ServeDir::new(root));
    }

    let router = router
        .layer(DefaultBodyLimit::max(state.body_limit()))
        .layer(TraceLayer::new_for_http());

    with_origin_policy(router, state.policy.clone()).with_state(state)
}

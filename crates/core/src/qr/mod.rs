//! QR code issuance.
//!
//! [`render_png`] turns a URL into PNG bytes deterministically. [`QrService`]
//! renders the code for a stored file and persists the image through the
//! same [`AssetStore`](crate::storage::AssetStore) as the file itself, so the
//! image gets its own public URL.

mod error;
mod render;
mod service;

pub use error::QrError;
pub use render::{RenderOptions, render_png};
pub use service::{QrArtifact, QrConfig, QrIssuer, QrService, generate_qr_key};

//! Storage client for uploaded files using Apache OpenDAL.
//!
//! This module provides vendor-agnostic object storage with support for:
//! - S3-compatible: Cloudflare R2, AWS S3, DigitalOcean Spaces
//! - Local filesystem (development only)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Apache OpenDAL                              │
//! │                   (Unified Storage API)                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ op.write_with("key", data) │ op.presign_read("key", duration)   │
//! │ op.stat("key")             │ op.info().full_capability()        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The pipeline depends on the [`AssetStore`] trait; [`StorageService`] is
//! the OpenDAL-backed implementation built once at startup.

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{AssetStore, StorageService, StoredAsset, generate_asset_key};

//! Core upload pipeline for qrshare.
//!
//! This crate contains the pipeline logic with ZERO web dependencies.
//! The HTTP layer only extracts the multipart payload and maps errors.
//!
//! # Modules
//!
//! - `cors` - Origin policy evaluation
//! - `storage` - Object storage client (OpenDAL)
//! - `qr` - QR code rendering and issuance
//! - `upload` - Validation and orchestration of one upload

pub mod cors;
pub mod qr;
pub mod storage;
pub mod upload;

#[cfg(any(test, feature = "test-util"))]
pub mod fake;

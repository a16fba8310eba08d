//! Shared types, errors, and configuration for qrshare.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error types
//! - Configuration management
//! - The JSON contract of the upload endpoint, shared by server and client

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

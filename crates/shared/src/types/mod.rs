//! Common types used across the application.

pub mod contract;

pub use contract::{ContractError, ErrorBody, UploadResult, error_message, parse_upload_result};

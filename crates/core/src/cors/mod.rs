//! Cross-origin access policy.
//!
//! The policy is compiled once at startup from the configured origin list and
//! evaluated on every request. Evaluation is infallible: anything that cannot
//! be matched is denied.

mod policy;

pub use policy::{OriginPolicy, WILDCARD};

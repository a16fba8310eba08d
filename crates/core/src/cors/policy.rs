//! Origin policy compilation and evaluation.

use std::collections::HashSet;

use regex::Regex;
use tracing::warn;

/// Configuration token that allows every origin.
pub const WILDCARD: &str = "*";

/// Decides whether a cross-origin request is permitted.
#[derive(Debug, Clone, Default)]
pub enum OriginPolicy {
    /// Every origin is allowed.
    #[default]
    AllowAll,
    /// Only listed origins are allowed.
    Restricted {
        /// Origins compared byte for byte.
        exact: HashSet<String>,
        /// Anchored patterns compiled from entries containing `*`.
        patterns: Vec<Regex>,
    },
}

impl OriginPolicy {
    /// Builds the policy from the raw configuration string.
    ///
    /// `None`, blank, or `*` yields [`OriginPolicy::AllowAll`]. Otherwise the
    /// string is split on commas; entries without `*` match exactly, entries
    /// with `*` match any sequence in place of each `*`.
    #[must_use]
    pub fn from_config(raw: Option<&str>) -> Self {
        let raw = raw.map(str::trim).unwrap_or_default();
        if raw.is_empty() || raw == WILDCARD {
            return Self::AllowAll;
        }

        let mut exact = HashSet::new();
        let mut patterns = Vec::new();

        for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if token.contains('*') {
                match compile_wildcard(token) {
                    Ok(pattern) => patterns.push(pattern),
                    Err(e) => warn!(origin = %token, error = %e, "Dropping unusable origin pattern"),
                }
            } else {
                exact.insert(token.to_string());
            }
        }

        if exact.is_empty() && patterns.is_empty() {
            warn!("No usable origins configured; all cross-origin requests will be denied");
        }

        Self::Restricted { exact, patterns }
    }

    /// Whether every origin is allowed.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::AllowAll)
    }

    /// Whether a request carrying `origin` may proceed.
    ///
    /// Requests without an `Origin` header are same-origin or non-browser
    /// clients and are always allowed.
    #[must_use]
    pub fn is_allowed(&self, origin: Option<&str>) -> bool {
        let Some(origin) = origin else {
            return true;
        };

        match self {
            Self::AllowAll => true,
            Self::Restricted { exact, patterns } => {
                exact.contains(origin) || patterns.iter().any(|p| p.is_match(origin))
            }
        }
    }
}

/// Compiles a wildcard origin into an anchored regular expression.
fn compile_wildcard(token: &str) -> Result<Regex, regex::Error> {
    let body = regex::escape(token).replace(r"\*", ".*");
    Regex::new(&format!("^{body}$"))
}

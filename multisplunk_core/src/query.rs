//! Query normalization.

use serde::Serialize;
use std::fmt;

/// A query guaranteed to start with `search` or `|`.
///
/// Built once per run and shared read-only by every endpoint execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NormalizedQuery(String);

impl NormalizedQuery {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NormalizedQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trim the raw query and prepend `search ` unless it already starts with
/// `search` or `|`.
///
/// Total over all inputs: the empty string becomes `"search "`.
pub fn normalize(raw: &str) -> NormalizedQuery {
    let trimmed = raw.trim();
    if trimmed.starts_with("search") || trimmed.starts_with('|') {
        NormalizedQuery(trimmed.to_string())
    } else {
        NormalizedQuery(format!("search {}", trimmed))
    }
}

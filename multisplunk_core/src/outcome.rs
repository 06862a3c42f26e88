//! Per-endpoint execution outcomes.

use crate::error::{FailureKind, SearchError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One result row. Column sets differ between endpoints and even between
/// rows, so records are JSON maps that keep the field order the service
/// sent.
pub type Record = Map<String, Value>;

/// Classified failure of one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointFailure {
    /// Endpoint that failed
    pub endpoint: String,

    pub kind: FailureKind,

    /// Human-readable description
    pub message: String,
}

impl EndpointFailure {
    pub fn new(endpoint: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn from_error(endpoint: impl Into<String>, error: &SearchError) -> Self {
        Self::new(endpoint, error.kind(), error.to_string())
    }

    pub fn unexpected(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            endpoint,
            FailureKind::Unexpected,
            format!("unexpected error: {}", message.into()),
        )
    }
}

impl std::fmt::Display for EndpointFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Result of running one adapter against one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Success { rows: Vec<Record> },
    Failure { error: EndpointFailure },
}

impl ExecutionOutcome {
    pub fn success(rows: Vec<Record>) -> Self {
        ExecutionOutcome::Success { rows }
    }

    pub fn failure(error: EndpointFailure) -> Self {
        ExecutionOutcome::Failure { error }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success { .. })
    }
}

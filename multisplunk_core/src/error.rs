use serde::{Deserialize, Serialize};

/// Errors raised while executing a query against a single endpoint.
///
/// None of these escape a run: the adapter boundary converts them into a
/// failure outcome for the endpoint that produced them.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("unsupported authentication mode: {0}")]
    UnsupportedAuthMode(String),

    #[error("invalid endpoint address: {0}")]
    InvalidEndpoint(String),

    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("malformed response body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl SearchError {
    /// Classify the error into the taxonomy stored in the aggregate report.
    pub fn kind(&self) -> FailureKind {
        match self {
            SearchError::UnsupportedAuthMode(_) | SearchError::InvalidEndpoint(_) => {
                FailureKind::Configuration
            }
            SearchError::HttpRequest(_)
            | SearchError::HttpStatus { .. }
            | SearchError::Timeout(_)
            | SearchError::MalformedBody(_) => FailureKind::Transport,
            SearchError::Protocol(_) => FailureKind::Protocol,
            SearchError::Unexpected(_) => FailureKind::Unexpected,
        }
    }

    pub fn code_str(&self) -> &'static str {
        match self {
            SearchError::UnsupportedAuthMode(_) => "unsupported_auth_mode",
            SearchError::InvalidEndpoint(_) => "invalid_endpoint",
            SearchError::HttpRequest(e) if e.is_timeout() => "timeout",
            SearchError::HttpRequest(e) if e.is_connect() => "connect_failed",
            SearchError::HttpRequest(_) => "upstream_error",
            SearchError::HttpStatus { .. } => "http_status",
            SearchError::Timeout(_) => "timeout",
            SearchError::Protocol(_) => "protocol_error",
            SearchError::MalformedBody(_) => "malformed_body",
            SearchError::Unexpected(_) => "unexpected_error",
        }
    }

    /// Whether the transport layer may retry the call that produced this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            SearchError::HttpRequest(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            SearchError::Timeout(_) => true,
            _ => false,
        }
    }

    /// The connection was never established, so the request did not reach
    /// the service.
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, SearchError::HttpRequest(e) if e.is_connect())
    }
}

/// Classification of an endpoint failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The endpoint descriptor cannot be executed (e.g. unknown auth mode).
    Configuration,
    /// Connection, TLS, timeout, non-2xx status or undecodable body.
    Transport,
    /// The service answered but a required field was missing or malformed.
    Protocol,
    /// A fault the adapter did not anticipate, caught at the dispatcher.
    Unexpected,
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Configuration => "configuration error",
            FailureKind::Transport => "transport error",
            FailureKind::Protocol => "protocol error",
            FailureKind::Unexpected => "unexpected error",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

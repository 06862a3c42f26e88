//! Protocol adapters.
//!
//! Two incompatible ways of running a search job sit behind one contract:
//!
//! - [`SessionAdapter`]: session-based client protocol, namespaced by
//!   owner/app, `Splunk <token>` authorization.
//! - [`JobPollAdapter`]: raw job-submission REST protocol with a bearer token.
//!
//! [`select`] maps an endpoint's [`AuthMode`] onto a [`ProtocolAdapter`];
//! [`AdapterExecutor`] glues selection and execution together for the
//! dispatcher.

mod job_poll;
mod session;
pub mod stream;

pub use job_poll::JobPollAdapter;
pub use session::{SessionAdapter, SplunkSession, SESSION_AUTH_LABEL};

use crate::endpoint::{AuthMode, EndpointDescriptor};
use crate::error::SearchError;
use crate::outcome::{EndpointFailure, ExecutionOutcome, Record};
use crate::query::NormalizedQuery;
use crate::transport::Transport;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info};
use url::Url;

/// Start of the fixed recency window.
pub const EARLIEST_TIME: &str = "-24h";

/// End of the fixed recency window.
pub const LATEST_TIME: &str = "now";

/// Jobs run to completion before the creation call returns.
pub const EXEC_MODE: &str = "blocking";

/// Structured output encoding requested from the service.
pub const OUTPUT_MODE: &str = "json";

/// `count=0` asks for every result, with no pagination cap.
pub const RESULT_COUNT_ALL: &str = "0";

/// Anything that can run a normalized query against one endpoint.
///
/// Implementations never fail: every error is folded into the returned
/// outcome.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, endpoint: &EndpointDescriptor, query: &NormalizedQuery)
        -> ExecutionOutcome;
}

/// Closed set of protocol adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolAdapter {
    Session(SessionAdapter),
    JobPoll(JobPollAdapter),
}

impl ProtocolAdapter {
    pub fn name(&self) -> &'static str {
        match self {
            ProtocolAdapter::Session(_) => "session",
            ProtocolAdapter::JobPoll(_) => "job-poll",
        }
    }

    /// Run the query and fold any error into a failure outcome.
    pub async fn execute(
        &self,
        transport: &Transport,
        endpoint: &EndpointDescriptor,
        query: &NormalizedQuery,
    ) -> ExecutionOutcome {
        info!(
            endpoint = %endpoint.name,
            adapter = self.name(),
            "[{}] executing query",
            endpoint.name
        );
        let result = match self {
            ProtocolAdapter::Session(adapter) => adapter.run(transport, endpoint, query).await,
            ProtocolAdapter::JobPoll(adapter) => adapter.run(transport, endpoint, query).await,
        };
        match result {
            Ok(rows) => {
                info!(
                    endpoint = %endpoint.name,
                    rows = rows.len(),
                    "[{}] completed: {} results",
                    endpoint.name,
                    rows.len()
                );
                ExecutionOutcome::success(rows)
            }
            Err(e) => {
                error!(
                    endpoint = %endpoint.name,
                    code = e.code_str(),
                    "[{}] {}",
                    endpoint.name,
                    e
                );
                ExecutionOutcome::failure(EndpointFailure::from_error(&endpoint.name, &e))
            }
        }
    }
}

/// Choose the adapter for an authentication mode.
pub fn select(mode: &AuthMode) -> Result<ProtocolAdapter, SearchError> {
    match mode {
        AuthMode::Session => Ok(ProtocolAdapter::Session(SessionAdapter)),
        AuthMode::Bearer => Ok(ProtocolAdapter::JobPoll(JobPollAdapter)),
        AuthMode::Unsupported(other) => Err(SearchError::UnsupportedAuthMode(other.clone())),
    }
}

/// Production executor: adapter selection over a shared [`Transport`].
#[derive(Debug, Clone)]
pub struct AdapterExecutor {
    transport: Transport,
}

impl AdapterExecutor {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }
}

#[async_trait]
impl QueryExecutor for AdapterExecutor {
    async fn execute(
        &self,
        endpoint: &EndpointDescriptor,
        query: &NormalizedQuery,
    ) -> ExecutionOutcome {
        match select(&endpoint.auth_mode) {
            Ok(adapter) => adapter.execute(&self.transport, endpoint, query).await,
            Err(e) => {
                error!(endpoint = %endpoint.name, "[{}] {}", endpoint.name, e);
                ExecutionOutcome::failure(EndpointFailure::from_error(&endpoint.name, &e))
            }
        }
    }
}

/// Append path segments to a base URL, percent-encoding each one.
pub(crate) fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url, SearchError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| SearchError::InvalidEndpoint(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Search job parameters shared by both protocols.
pub(crate) fn job_form(query: &NormalizedQuery) -> [(&'static str, &str); 5] {
    [
        ("search", query.as_str()),
        ("exec_mode", EXEC_MODE),
        ("earliest_time", EARLIEST_TIME),
        ("latest_time", LATEST_TIME),
        ("output_mode", OUTPUT_MODE),
    ]
}

/// Query parameters for fetching every result of a job.
pub(crate) fn results_params() -> [(&'static str, &'static str); 2] {
    [("output_mode", OUTPUT_MODE), ("count", RESULT_COUNT_ALL)]
}

/// Pull the search job identifier out of a job-creation response.
pub(crate) fn extract_sid(response: &Value) -> Result<String, SearchError> {
    response
        .get("sid")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|sid| !sid.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SearchError::Protocol("job creation response did not include a sid".into()))
}

/// Rows of a structured results body: the `results` array, absent meaning
/// no rows.
pub(crate) fn extract_rows(body: Value) -> Result<Vec<Record>, SearchError> {
    let Value::Object(mut body) = body else {
        return Err(SearchError::Protocol(
            "results response is not a JSON object".into(),
        ));
    };
    match body.remove("results") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| match item {
                Value::Object(record) => Ok(record),
                other => Err(SearchError::Protocol(format!(
                    "result {} is not an object: {}",
                    idx, other
                ))),
            })
            .collect(),
        Some(other) => Err(SearchError::Protocol(format!(
            "`results` is not an array: {}",
            other
        ))),
    }
}

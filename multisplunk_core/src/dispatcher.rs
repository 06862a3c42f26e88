//! Concurrent fan-out of one query across many endpoints.
//!
//! Every endpoint is one unit of work. Units run on tokio tasks gated by a
//! semaphore holding `concurrency_limit` permits; a unit that fails, times
//! out or panics only affects its own entry in the report.

use crate::adapter::{AdapterExecutor, QueryExecutor};
use crate::aggregate::{AggregateReport, Aggregator};
use crate::endpoint::EndpointDescriptor;
use crate::error::SearchError;
use crate::outcome::{EndpointFailure, ExecutionOutcome};
use crate::query::NormalizedQuery;
use crate::transport::{RetryPolicy, Transport, DEFAULT_CALL_TIMEOUT};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

/// Default number of endpoints queried at the same time.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Per-run dispatcher settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Maximum units in flight at once (values below 1 are raised to 1)
    pub concurrency_limit: usize,

    /// Timeout applied to every outbound HTTP call
    pub call_timeout: Duration,

    pub retry: RetryPolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

impl DispatchConfig {
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Runs a query against every endpoint and aggregates the outcomes.
pub struct Dispatcher<E = AdapterExecutor> {
    executor: Arc<E>,
    concurrency_limit: usize,
}

impl Dispatcher<AdapterExecutor> {
    /// Build a dispatcher over the real protocol adapters.
    pub fn new(config: DispatchConfig) -> Result<Self, SearchError> {
        let transport = Transport::new(config.call_timeout, config.retry)?;
        Ok(Self::with_executor(
            AdapterExecutor::new(transport),
            config.concurrency_limit,
        ))
    }
}

impl<E: QueryExecutor + 'static> Dispatcher<E> {
    pub fn with_executor(executor: E, concurrency_limit: usize) -> Self {
        Self {
            executor: Arc::new(executor),
            concurrency_limit: concurrency_limit.max(1),
        }
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Fan the query out and wait for every endpoint to settle.
    ///
    /// Never fails and never short-circuits: each endpoint ends up in
    /// exactly one of the report's two maps.
    pub async fn run(
        &self,
        endpoints: &[EndpointDescriptor],
        query: &NormalizedQuery,
    ) -> AggregateReport {
        let aggregator = Arc::new(Aggregator::new());
        let permits = Arc::new(Semaphore::new(self.concurrency_limit));
        let query = Arc::new(query.clone());

        info!(
            target: "multisplunk.dispatch",
            endpoints = endpoints.len(),
            concurrency = self.concurrency_limit,
            query = %query,
            "dispatching query"
        );

        let units: Vec<_> = endpoints
            .iter()
            .map(|endpoint| {
                let name = endpoint.name.clone();
                let handle = tokio::spawn(run_unit(
                    Arc::clone(&self.executor),
                    Arc::clone(&permits),
                    Arc::clone(&aggregator),
                    endpoint.clone(),
                    Arc::clone(&query),
                ));
                (name, handle)
            })
            .collect();

        for (name, handle) in units {
            if let Err(join_error) = handle.await {
                // The unit died before it could record anything.
                if !aggregator.is_recorded(&name) {
                    error!(endpoint = %name, "[{}] unit aborted: {}", name, join_error);
                    aggregator.record(
                        &name,
                        ExecutionOutcome::failure(EndpointFailure::unexpected(
                            &name,
                            join_error.to_string(),
                        )),
                    );
                }
            }
        }

        let report = aggregator.finalize();
        info!(
            target: "multisplunk.dispatch",
            successes = report.success_count(),
            failures = report.failure_count(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "fan-out finished"
        );
        report
    }
}

async fn run_unit<E: QueryExecutor>(
    executor: Arc<E>,
    permits: Arc<Semaphore>,
    aggregator: Arc<Aggregator>,
    endpoint: EndpointDescriptor,
    query: Arc<NormalizedQuery>,
) {
    let queued = Instant::now();
    let outcome = match permits.acquire_owned().await {
        Ok(_permit) => {
            debug!(
                target: "multisplunk.dispatch",
                endpoint = %endpoint.name,
                waited_ms = queued.elapsed().as_millis() as u64,
                "unit started"
            );
            AssertUnwindSafe(executor.execute(&endpoint, &query))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| {
                    let reason = panic_reason(payload);
                    error!(
                        endpoint = %endpoint.name,
                        "[{}] unexpected error: {}",
                        endpoint.name,
                        reason
                    );
                    ExecutionOutcome::failure(EndpointFailure::unexpected(&endpoint.name, reason))
                })
        }
        Err(closed) => ExecutionOutcome::failure(EndpointFailure::unexpected(
            &endpoint.name,
            closed.to_string(),
        )),
    };
    aggregator.record(&endpoint.name, outcome);
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::outcome::Record;
    use crate::query::normalize;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Simulated endpoints: each name maps to a delay and a behaviour.
    #[derive(Default)]
    struct FakeExecutor {
        delays: HashMap<String, Duration>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeExecutor {
        fn with_delays(delays: &[(&str, u64)]) -> Self {
            Self {
                delays: delays
                    .iter()
                    .map(|(n, ms)| (n.to_string(), Duration::from_millis(*ms)))
                    .collect(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl QueryExecutor for FakeExecutor {
        async fn execute(
            &self,
            endpoint: &EndpointDescriptor,
            query: &NormalizedQuery,
        ) -> ExecutionOutcome {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let delay = self.delays.get(&endpoint.name).copied().unwrap_or_default();
            tokio::time::sleep(delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if endpoint.name.starts_with("panic") {
                panic!("simulated fault in {}", endpoint.name);
            }
            if endpoint.name.starts_with("fail") {
                return ExecutionOutcome::failure(EndpointFailure::new(
                    &endpoint.name,
                    FailureKind::Transport,
                    "HTTP 503",
                ));
            }
            let mut row = Record::new();
            row.insert("endpoint".into(), json!(endpoint.name));
            row.insert("query".into(), json!(query.as_str()));
            ExecutionOutcome::success(vec![row])
        }
    }

    fn endpoints(names: &[&str]) -> Vec<EndpointDescriptor> {
        names
            .iter()
            .map(|n| EndpointDescriptor::new(*n, "localhost", "t"))
            .collect()
    }

    #[tokio::test]
    async fn test_concurrency_bound() {
        let names = ["e1", "e2", "e3", "e4", "e5"];
        let delays: Vec<_> = names.iter().map(|n| (*n, 60)).collect();
        let dispatcher = Dispatcher::with_executor(FakeExecutor::with_delays(&delays), 2);

        let report = dispatcher.run(&endpoints(&names), &normalize("x")).await;

        assert_eq!(report.success_count(), 5);
        assert_eq!(dispatcher.executor.max_in_flight.load(Ordering::SeqCst), 2);
        // ceil(5 / 2) batches of 60ms; one at a time would take 300ms
        assert!(
            report.elapsed >= Duration::from_millis(180),
            "elapsed {:?}",
            report.elapsed
        );
        assert!(
            report.elapsed < Duration::from_millis(300),
            "elapsed {:?}",
            report.elapsed
        );
    }

    #[tokio::test]
    async fn test_total_outcome_and_isolation() {
        let names = ["a", "fail-b", "c", "panic-d", "e"];
        let dispatcher = Dispatcher::with_executor(FakeExecutor::default(), 3);

        let report = dispatcher.run(&endpoints(&names), &normalize("x")).await;

        assert_eq!(report.endpoint_count(), names.len());
        for name in names {
            let in_success = report.successes.contains_key(name);
            let in_failure = report.failures.contains_key(name);
            assert!(in_success ^ in_failure, "{} must be in exactly one map", name);
        }
        assert_eq!(report.failure_for("fail-b").unwrap().kind, FailureKind::Transport);

        let panicked = report.failure_for("panic-d").unwrap();
        assert_eq!(panicked.kind, FailureKind::Unexpected);
        assert!(panicked.message.starts_with("unexpected error"));
        assert!(panicked.message.contains("simulated fault in panic-d"));
        assert_eq!(report.success_count(), 3);
    }

    #[tokio::test]
    async fn test_order_independence() {
        let names = ["a", "b", "fail-c", "d"];
        let fast_first = FakeExecutor::with_delays(&[("a", 5), ("b", 25), ("fail-c", 45), ("d", 65)]);
        let slow_first = FakeExecutor::with_delays(&[("a", 65), ("b", 45), ("fail-c", 25), ("d", 5)]);

        let first = Dispatcher::with_executor(fast_first, 4)
            .run(&endpoints(&names), &normalize("x"))
            .await;
        let second = Dispatcher::with_executor(slow_first, 4)
            .run(&endpoints(&names), &normalize("x"))
            .await;

        assert_eq!(first.successes, second.successes);
        assert_eq!(first.failures, second.failures);
    }

    #[tokio::test]
    async fn test_query_is_shared_unchanged() {
        let dispatcher = Dispatcher::with_executor(FakeExecutor::default(), 2);
        let report = dispatcher
            .run(&endpoints(&["a", "b"]), &normalize("index=main"))
            .await;
        for rows in report.successes.values() {
            assert_eq!(rows[0]["query"], "search index=main");
        }
    }

    #[tokio::test]
    async fn test_empty_endpoint_set() {
        let dispatcher = Dispatcher::with_executor(FakeExecutor::default(), 2);
        let report = dispatcher.run(&[], &normalize("x")).await;
        assert_eq!(report.endpoint_count(), 0);
        assert!(!report.has_failures());
    }

    #[test]
    fn test_zero_limit_is_raised() {
        let dispatcher = Dispatcher::with_executor(FakeExecutor::default(), 0);
        assert_eq!(dispatcher.concurrency_limit(), 1);
    }

    #[test]
    fn test_default_config() {
        let config = DispatchConfig::default();
        assert_eq!(config.concurrency_limit, 8);
        assert_eq!(config.call_timeout, Duration::from_secs(300));
        assert_eq!(config.retry, RetryPolicy::default());
    }
}

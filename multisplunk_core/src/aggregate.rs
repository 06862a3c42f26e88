//! Aggregation of per-endpoint outcomes into one report.

use crate::outcome::{EndpointFailure, ExecutionOutcome, Record};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::warn;

/// Merged view of every endpoint's outcome for one run.
///
/// Every endpoint appears in exactly one of `successes` / `failures`. Both
/// maps are ordered by endpoint name, so the report does not depend on the
/// order in which endpoints completed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    /// When the fan-out started
    pub started_at: DateTime<Utc>,

    /// Wall-clock duration of the whole fan-out
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,

    pub successes: BTreeMap<String, Vec<Record>>,

    pub failures: BTreeMap<String, EndpointFailure>,
}

fn serialize_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}

impl AggregateReport {
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn endpoint_count(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// Rows across all successful endpoints.
    pub fn total_rows(&self) -> usize {
        self.successes.values().map(Vec::len).sum()
    }

    /// Drives the process exit status: any failure means a failed run.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn rows_for(&self, endpoint: &str) -> Option<&[Record]> {
        self.successes.get(endpoint).map(Vec::as_slice)
    }

    pub fn failure_for(&self, endpoint: &str) -> Option<&EndpointFailure> {
        self.failures.get(endpoint)
    }
}

#[derive(Debug, Default)]
struct Accumulated {
    successes: BTreeMap<String, Vec<Record>>,
    failures: BTreeMap<String, EndpointFailure>,
}

impl Accumulated {
    fn contains(&self, endpoint: &str) -> bool {
        self.successes.contains_key(endpoint) || self.failures.contains_key(endpoint)
    }
}

/// Thread-safe, write-once accumulator of endpoint outcomes.
#[derive(Debug)]
pub struct Aggregator {
    started: Instant,
    started_at: DateTime<Utc>,
    state: Mutex<Accumulated>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    /// Start an empty aggregation; the elapsed clock starts now.
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            started_at: Utc::now(),
            state: Mutex::new(Accumulated::default()),
        }
    }

    /// Record the outcome for `endpoint`.
    ///
    /// Each endpoint is written at most once: a second outcome for the same
    /// name is dropped and `false` is returned.
    pub fn record(&self, endpoint: &str, outcome: ExecutionOutcome) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.contains(endpoint) {
            warn!(endpoint, "duplicate outcome ignored; first outcome kept");
            return false;
        }
        match outcome {
            ExecutionOutcome::Success { rows } => {
                state.successes.insert(endpoint.to_string(), rows);
            }
            ExecutionOutcome::Failure { error } => {
                state.failures.insert(endpoint.to_string(), error);
            }
        }
        true
    }

    pub fn is_recorded(&self, endpoint: &str) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(endpoint)
    }

    /// Number of outcomes recorded so far.
    pub fn len(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.successes.len() + state.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop the clock and hand out the accumulated report.
    ///
    /// Call once every unit has settled; the accumulator is left empty.
    pub fn finalize(&self) -> AggregateReport {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let Accumulated {
            successes,
            failures,
        } = std::mem::take(&mut *state);
        AggregateReport {
            started_at: self.started_at,
            elapsed: self.started.elapsed(),
            successes,
            failures,
        }
    }
}

//! Fan-out search engine for fleets of Splunk deployments.
//!
//! One query, normalized once, runs concurrently against every configured
//! endpoint. Each endpoint talks either the session protocol or the raw
//! job-submission protocol with bearer auth; outcomes are merged into a
//! single [`AggregateReport`] in which every endpoint is either a success
//! with its rows or a failure with a reason.
//!
//! ```no_run
//! use multisplunk_core::{normalize, DispatchConfig, Dispatcher, FanoutConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FanoutConfig::load("instances.yaml")?;
//! let dispatcher = Dispatcher::new(DispatchConfig::default())?;
//! let report = dispatcher
//!     .run(&config.instances, &normalize("index=_internal | head 5"))
//!     .await;
//! println!("{} ok, {} failed", report.success_count(), report.failure_count());
//! # Ok(())
//! # }
//! ```
pub mod adapter;
pub mod aggregate;
pub mod config;
pub mod dispatcher;
pub mod endpoint;
pub mod error;
pub mod outcome;
pub mod query;
pub mod transport;

pub use adapter::{select, AdapterExecutor, ProtocolAdapter, QueryExecutor};
pub use aggregate::{AggregateReport, Aggregator};
pub use config::{ConfigError, FanoutConfig, Selection};
pub use dispatcher::{DispatchConfig, Dispatcher, DEFAULT_CONCURRENCY};
pub use endpoint::{AuthMode, Credential, EndpointDescriptor, Scheme};
pub use error::{FailureKind, SearchError};
pub use outcome::{EndpointFailure, ExecutionOutcome, Record};
pub use query::{normalize, NormalizedQuery};
pub use transport::{Replay, RetryPolicy, Transport};

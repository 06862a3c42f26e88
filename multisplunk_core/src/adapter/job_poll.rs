//! Raw job-submission REST protocol with bearer authentication.

use super::{endpoint_url, extract_rows, extract_sid, job_form, results_params};
use crate::endpoint::EndpointDescriptor;
use crate::error::SearchError;
use crate::outcome::Record;
use crate::query::NormalizedQuery;
use crate::transport::{Replay, Transport};
use reqwest::header::AUTHORIZATION;
use tracing::debug;

/// Adapter for endpoints declaring `auth_type: bearer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobPollAdapter;

impl JobPollAdapter {
    pub(crate) async fn run(
        &self,
        transport: &Transport,
        endpoint: &EndpointDescriptor,
        query: &NormalizedQuery,
    ) -> Result<Vec<Record>, SearchError> {
        let base = endpoint.base_url()?;
        let authorization = format!("Bearer {}", endpoint.credential.expose());
        let verify = endpoint.tls_verify;

        // Create the job
        let create_url = endpoint_url(&base, &["services", "search", "jobs"])?;
        let form = job_form(query);
        let job = transport
            .json_with_backoff(verify, Replay::ConnectOnly, |client| {
                client
                    .post(create_url.clone())
                    .header(AUTHORIZATION, &authorization)
                    .form(&form)
            })
            .await?;
        let sid = extract_sid(&job)?;
        debug!(endpoint = %endpoint.name, %sid, "search job created");

        // Fetch every result
        let results_url = endpoint_url(&base, &["services", "search", "jobs", &sid, "results"])?;
        let params = results_params();
        let body = transport
            .json_with_backoff(verify, Replay::Safe, |client| {
                client
                    .get(results_url.clone())
                    .header(AUTHORIZATION, &authorization)
                    .query(&params)
            })
            .await?;
        extract_rows(body)
    }
}

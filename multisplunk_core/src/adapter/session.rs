//! Session-based client protocol.

use super::stream::{read_entries, records, ResultEntry};
use super::{endpoint_url, extract_sid, job_form, results_params};
use crate::endpoint::EndpointDescriptor;
use crate::error::SearchError;
use crate::outcome::Record;
use crate::query::NormalizedQuery;
use crate::transport::{Replay, Transport};
use reqwest::header::AUTHORIZATION;
use tracing::{debug, warn};
use url::Url;

/// Auth label prepended to session credentials.
pub const SESSION_AUTH_LABEL: &str = "Splunk ";

/// Adapter for endpoints declaring `auth_type: session`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionAdapter;

impl SessionAdapter {
    pub(crate) async fn run(
        &self,
        transport: &Transport,
        endpoint: &EndpointDescriptor,
        query: &NormalizedQuery,
    ) -> Result<Vec<Record>, SearchError> {
        let session = SplunkSession::connect(transport, endpoint)?;
        let sid = session.create_blocking_job(query).await?;
        debug!(endpoint = %endpoint.name, %sid, "search job finished");
        session.results(&sid).await
    }
}

/// An authenticated session against one endpoint's owner/app namespace.
pub struct SplunkSession<'a> {
    transport: &'a Transport,
    base: Url,
    owner: &'a str,
    app: &'a str,
    authorization: String,
    tls_verify: bool,
    endpoint: &'a str,
}

impl<'a> SplunkSession<'a> {
    pub fn connect(
        transport: &'a Transport,
        endpoint: &'a EndpointDescriptor,
    ) -> Result<Self, SearchError> {
        Ok(Self {
            transport,
            base: endpoint.base_url()?,
            owner: &endpoint.owner,
            app: &endpoint.app,
            authorization: session_authorization(endpoint.credential.expose()),
            tls_verify: endpoint.tls_verify,
            endpoint: &endpoint.name,
        })
    }

    fn jobs_url(&self, tail: &[&str]) -> Result<Url, SearchError> {
        let mut segments = vec!["servicesNS", self.owner, self.app, "search", "jobs"];
        segments.extend_from_slice(tail);
        endpoint_url(&self.base, &segments)
    }

    /// Submit the query as a blocking job; returns once the job is done.
    pub async fn create_blocking_job(&self, query: &NormalizedQuery) -> Result<String, SearchError> {
        let url = self.jobs_url(&[])?;
        let form = job_form(query);
        let response = self
            .transport
            .json_with_backoff(self.tls_verify, Replay::ConnectOnly, |client| {
                client
                    .post(url.clone())
                    .header(AUTHORIZATION, &self.authorization)
                    .form(&form)
            })
            .await?;
        extract_sid(&response)
    }

    /// Fetch every result of a finished job, keeping only record entries.
    pub async fn results(&self, sid: &str) -> Result<Vec<Record>, SearchError> {
        let url = self.jobs_url(&[sid, "results"])?;
        let params = results_params();
        let response = self
            .transport
            .send_with_backoff(self.tls_verify, Replay::Safe, |client| {
                client
                    .get(url.clone())
                    .header(AUTHORIZATION, &self.authorization)
                    .query(&params)
            })
            .await?;
        let body = response.bytes().await?;
        let entries = read_entries(&body)?;

        for entry in &entries {
            match entry {
                ResultEntry::Message(m) if m.is_error() => {
                    warn!(endpoint = self.endpoint, kind = %m.kind, "{}", m.text)
                }
                ResultEntry::Message(m) => {
                    debug!(endpoint = self.endpoint, kind = %m.kind, "{}", m.text)
                }
                ResultEntry::Other(v) => {
                    debug!(endpoint = self.endpoint, entry = %v, "skipping non-record entry")
                }
                ResultEntry::Record(_) => {}
            }
        }
        Ok(records(entries))
    }
}

/// `Splunk <token>`, unless the credential already carries the label.
pub(crate) fn session_authorization(credential: &str) -> String {
    if credential.starts_with(SESSION_AUTH_LABEL) {
        credential.to_string()
    } else {
        format!("{}{}", SESSION_AUTH_LABEL, credential)
    }
}

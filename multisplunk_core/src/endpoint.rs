//! Endpoint descriptors: identity plus connection and auth parameters for
//! one search-service instance.

use crate::error::SearchError;
use serde::{Deserialize, Serialize};
use url::Url;

/// Default management port of a Splunk instance.
pub const DEFAULT_PORT: u16 = 8089;

/// Default app namespace used by the session protocol.
pub const DEFAULT_APP: &str = "search";

/// Default owner namespace used by the session protocol.
pub const DEFAULT_OWNER: &str = "admin";

/// URL scheme used to reach an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// Declared authentication mode of an endpoint.
///
/// Unknown values are kept verbatim so the adapter selector can report them
/// as a per-endpoint failure instead of rejecting the whole configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuthMode {
    /// Session-based client protocol (`Splunk <token>` authorization).
    #[default]
    Session,
    /// Raw job-submission REST protocol (`Bearer <token>` authorization).
    Bearer,
    /// Anything else; never executable.
    Unsupported(String),
}

impl AuthMode {
    pub fn as_str(&self) -> &str {
        match self {
            AuthMode::Session => "session",
            AuthMode::Bearer => "bearer",
            AuthMode::Unsupported(other) => other,
        }
    }
}

impl From<String> for AuthMode {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            // "splunk" is the spelling used by older configuration files
            "session" | "splunk" => AuthMode::Session,
            "bearer" => AuthMode::Bearer,
            _ => AuthMode::Unsupported(value),
        }
    }
}

impl From<&str> for AuthMode {
    fn from(value: &str) -> Self {
        AuthMode::from(value.to_string())
    }
}

impl From<AuthMode> for String {
    fn from(mode: AuthMode) -> Self {
        mode.as_str().to_string()
    }
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque secret used to authenticate against an endpoint.
///
/// `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Connection and authentication parameters for one endpoint.
///
/// Field names on the wire follow the YAML configuration format
/// (`auth_type`, `token`, `verify`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    /// Unique name, used as the aggregation key.
    pub name: String,

    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub scheme: Scheme,

    #[serde(default, rename = "auth_type", alias = "auth_mode")]
    pub auth_mode: AuthMode,

    #[serde(rename = "token", alias = "credential")]
    pub credential: Credential,

    #[serde(default = "default_verify", rename = "verify", alias = "tls_verify")]
    pub tls_verify: bool,

    /// App namespace (session protocol only)
    #[serde(default = "default_app")]
    pub app: String,

    /// Owner namespace (session protocol only)
    #[serde(default = "default_owner")]
    pub owner: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_verify() -> bool {
    true
}

fn default_app() -> String {
    DEFAULT_APP.to_string()
}

fn default_owner() -> String {
    DEFAULT_OWNER.to_string()
}

impl EndpointDescriptor {
    /// Create a descriptor with every optional field at its default.
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: DEFAULT_PORT,
            scheme: Scheme::Https,
            auth_mode: AuthMode::Session,
            credential: Credential::new(credential),
            tls_verify: true,
            app: default_app(),
            owner: default_owner(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_auth_mode(mut self, mode: impl Into<AuthMode>) -> Self {
        self.auth_mode = mode.into();
        self
    }

    pub fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    pub fn with_namespace(mut self, owner: impl Into<String>, app: impl Into<String>) -> Self {
        self.owner = owner.into();
        self.app = app.into();
        self
    }

    /// `{scheme}://{host}:{port}`
    pub fn base_url(&self) -> Result<Url, SearchError> {
        let raw = format!("{}://{}:{}", self.scheme.as_str(), self.host, self.port);
        Url::parse(&raw).map_err(|e| SearchError::InvalidEndpoint(format!("{}: {}", raw, e)))
    }
}

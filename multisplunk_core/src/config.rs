//! Endpoint configuration file.
//!
//! ```yaml
//! instances:
//!   - name: prod
//!     host: prod.splunkcloud.com
//!     token: "eyJraWQiOi..."
//!   - name: lab
//!     host: 10.0.0.12
//!     port: 8089
//!     scheme: https
//!     auth_type: bearer
//!     token: "..."
//!     verify: false
//! ```

use crate::endpoint::EndpointDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Errors from loading or validating a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("instance #{index} has an empty `{field}`")]
    EmptyField { index: usize, field: &'static str },

    #[error("duplicate instance name: {0}")]
    DuplicateName(String),
}

/// Parsed configuration: the full set of known endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanoutConfig {
    #[serde(default)]
    pub instances: Vec<EndpointDescriptor>,
}

/// Result of narrowing the configured endpoints down to a set of names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Matched endpoints, in configuration order
    pub endpoints: Vec<EndpointDescriptor>,

    /// Requested names that matched nothing
    pub unknown: Vec<String>,
}

impl FanoutConfig {
    /// Read, parse and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        // An empty document is an empty configuration, not an error.
        let config: FanoutConfig = if content.trim().is_empty() {
            FanoutConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Names must be unique and non-empty; hosts must be non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for (index, instance) in self.instances.iter().enumerate() {
            if instance.name.trim().is_empty() {
                return Err(ConfigError::EmptyField {
                    index,
                    field: "name",
                });
            }
            if instance.host.trim().is_empty() {
                return Err(ConfigError::EmptyField {
                    index,
                    field: "host",
                });
            }
            if !seen.insert(instance.name.as_str()) {
                return Err(ConfigError::DuplicateName(instance.name.clone()));
            }
        }
        Ok(())
    }

    pub fn names(&self) -> Vec<&str> {
        self.instances.iter().map(|i| i.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&EndpointDescriptor> {
        self.instances.iter().find(|i| i.name == name)
    }

    /// Keep the instances whose names appear in `names`.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Selection {
        let wanted: Vec<&str> = names.iter().map(|n| n.as_ref().trim()).collect();
        let endpoints = self
            .instances
            .iter()
            .filter(|i| wanted.contains(&i.name.as_str()))
            .cloned()
            .collect();
        let unknown = wanted
            .iter()
            .filter(|n| !n.is_empty() && self.get(n).is_none())
            .map(|n| n.to_string())
            .collect();
        Selection { endpoints, unknown }
    }
}

pub mod run;
pub mod select;

use multisplunk_core::{ConfigError, SearchError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot read query file {path}: {source}")]
    QueryFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No query given")]
    EmptyQuery,

    #[error("No instances selected to query")]
    NoInstances,

    #[error("Invalid selection '{0}': expected comma-separated numbers")]
    InvalidSelection(String),

    #[error("Core library error: {0}")]
    Core(#[from] SearchError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CommandError>;

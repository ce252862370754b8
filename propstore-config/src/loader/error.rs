use std::path::PathBuf;

use propstore_core::LimitsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("failed to load env file {path}: {reason}")]
    EnvFile { path: PathBuf, reason: String },

    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("store {0} cannot be empty")]
    EmptyStoreSetting(&'static str),

    #[error(transparent)]
    Limits(#[from] LimitsError),
}

pub mod sources;

use std::path::PathBuf;

use propstore_core::QueryLimits;
use serde::Serialize;

pub const DEFAULT_STORE_URL: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE: &str = "propstore";

/// Effective configuration after files, environment and validation.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub store: StoreConfig,
    pub limits: QueryLimits,
    #[serde(skip)]
    pub metadata: ConfigMetadata,
}

/// Where the document store lives. The query core never dials it; adapters
/// built on top of [`propstore_core::DocumentStore`] do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreConfig {
    pub url: String,
    pub database: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_STORE_URL.to_string(),
            database: DEFAULT_DATABASE.to_string(),
        }
    }
}

impl StoreConfig {
    /// Connection URL with any password replaced, for logs.
    pub fn redacted_url(&self) -> String {
        let Some((scheme, rest)) = self.url.split_once("://") else {
            return self.url.clone();
        };
        let Some((credentials, host)) = rest.rsplit_once('@') else {
            return self.url.clone();
        };
        match credentials.split_once(':') {
            Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
            None => self.url.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
    /// Environment variables that overrode file or default values.
    pub env_overrides: Vec<&'static str>,
}

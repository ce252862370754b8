use std::path::PathBuf;

use propstore_core::QueryLimits;
use serde::{Deserialize, Serialize};

use crate::util::non_empty;

/// Raw configuration as defined in a TOML or JSON file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub store: FileStoreConfig,
    #[serde(default)]
    pub limits: QueryLimits,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileStoreConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

/// Environment overrides, still unparsed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub store_url: Option<String>,
    pub database: Option<String>,
    pub default_page_size: Option<String>,
    pub max_page_size: Option<String>,
    pub query_timeout: Option<String>,
}

pub const CONFIG_PATH_VAR: &str = "PROPSTORE_CONFIG_PATH";
pub const STORE_URL_VAR: &str = "PROPSTORE_STORE_URL";
pub const DATABASE_VAR: &str = "PROPSTORE_DATABASE";
pub const DEFAULT_PAGE_SIZE_VAR: &str = "PROPSTORE_DEFAULT_PAGE_SIZE";
pub const MAX_PAGE_SIZE_VAR: &str = "PROPSTORE_MAX_PAGE_SIZE";
pub const QUERY_TIMEOUT_VAR: &str = "PROPSTORE_QUERY_TIMEOUT";

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).and_then(non_empty);
        Self {
            config_path: var(CONFIG_PATH_VAR).map(PathBuf::from),
            store_url: var(STORE_URL_VAR),
            database: var(DATABASE_VAR),
            default_page_size: var(DEFAULT_PAGE_SIZE_VAR),
            max_page_size: var(MAX_PAGE_SIZE_VAR),
            query_timeout: var(QUERY_TIMEOUT_VAR),
        }
    }
}

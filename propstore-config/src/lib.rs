//! Configuration loading for PropStore.
//!
//! Combines an optional `.env`, a TOML or JSON config file and `PROPSTORE_*`
//! environment overrides into a validated [`Config`]. The `propstore-config`
//! binary prints or checks the result.
#![allow(missing_docs)]

pub mod loader;
pub mod models;
pub mod util;

pub use loader::{
    ConfigLoad, ConfigLoader, DEFAULT_CONFIG_FILE, error::ConfigLoadError,
    read_file_config,
};
pub use models::sources::{EnvConfig, FileConfig, FileStoreConfig};
pub use models::{Config, ConfigMetadata, StoreConfig};

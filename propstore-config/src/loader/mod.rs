pub mod error;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tracing::{debug, info};

use crate::models::sources::{
    DATABASE_VAR, DEFAULT_PAGE_SIZE_VAR, EnvConfig, FileConfig,
    MAX_PAGE_SIZE_VAR, QUERY_TIMEOUT_VAR, STORE_URL_VAR,
};
use crate::models::{Config, ConfigMetadata, StoreConfig};
use crate::util::{parse_non_zero, parse_timeout};

use error::ConfigLoadError;

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "propstore.toml";

/// Loads [`Config`] in a fixed order:
/// 1) `.env` (optional),
/// 2) the config file from `$PROPSTORE_CONFIG_PATH` or `propstore.toml`,
/// 3) `PROPSTORE_*` environment overrides,
/// 4) validation.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_file: Option<PathBuf>,
    skip_env_file: bool,
    env: Option<EnvConfig>,
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit config file; wins over `$PROPSTORE_CONFIG_PATH`.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    pub fn without_env_file(mut self) -> Self {
        self.skip_env_file = true;
        self
    }

    /// Use these overrides instead of reading the process environment.
    pub fn with_env(mut self, env: EnvConfig) -> Self {
        self.env = Some(env);
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = self.load_env_file()?;
        let env = self.env.clone().unwrap_or_else(EnvConfig::gather);

        let config_path = self
            .config_path
            .clone()
            .or_else(|| env.config_path.clone())
            .or_else(|| {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.is_file().then_some(default)
            });

        let file = match &config_path {
            Some(path) => read_file_config(path)?,
            None => FileConfig::default(),
        };

        let mut metadata = ConfigMetadata {
            config_path,
            env_file_loaded,
            env_overrides: Vec::new(),
        };
        let config = compose(file, &env, &mut metadata)?;

        info!(
            "Configuration loaded (file: {}, store: {}, database: {})",
            metadata
                .config_path
                .as_deref()
                .map_or_else(|| "none".to_string(), |p| p.display().to_string()),
            config.store.redacted_url(),
            config.store.database
        );

        Ok(ConfigLoad {
            config: Config { metadata, ..config },
        })
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        if self.skip_env_file {
            return Ok(false);
        }

        match &self.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).map_err(|err| {
                ConfigLoadError::EnvFile {
                    path: path.clone(),
                    reason: err.to_string(),
                }
            }),
            None => match dotenvy::dotenv() {
                Ok(path) => {
                    debug!("Loaded env file {}", path.display());
                    Ok(true)
                }
                Err(err) if err.not_found() => Ok(false),
                Err(err) => Err(ConfigLoadError::EnvFile {
                    path: PathBuf::from(".env"),
                    reason: err.to_string(),
                }),
            },
        }
    }
}

/// Read and parse a TOML or JSON config file.
pub fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    parse_file_config(&contents, path).map_err(|err| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        reason: format!("{err:#}"),
    })
}

fn parse_file_config(contents: &str, path: &Path) -> anyhow::Result<FileConfig> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(contents)
            .context("expected a JSON object with `store` and `limits`"),
        Some("toml") => toml::from_str(contents).map_err(|err| anyhow!("{err}")),
        _ => toml::from_str(contents).or_else(|toml_err| {
            serde_json::from_str(contents).map_err(|json_err| {
                anyhow!("toml error: {toml_err}; json error: {json_err}")
            })
        }),
    }
}

fn compose(
    file: FileConfig,
    env: &EnvConfig,
    metadata: &mut ConfigMetadata,
) -> Result<Config, ConfigLoadError> {
    let defaults = StoreConfig::default();
    let mut store = StoreConfig {
        url: file.store.url.unwrap_or(defaults.url),
        database: file.store.database.unwrap_or(defaults.database),
    };
    let mut limits = file.limits;

    if let Some(url) = &env.store_url {
        store.url = url.clone();
        metadata.env_overrides.push(STORE_URL_VAR);
    }
    if let Some(database) = &env.database {
        store.database = database.clone();
        metadata.env_overrides.push(DATABASE_VAR);
    }
    if let Some(raw) = &env.default_page_size {
        limits.default_page_size = parse_non_zero(raw)
            .map_err(|reason| invalid_env(DEFAULT_PAGE_SIZE_VAR, raw, reason))?;
        metadata.env_overrides.push(DEFAULT_PAGE_SIZE_VAR);
    }
    if let Some(raw) = &env.max_page_size {
        limits.max_page_size = parse_non_zero(raw)
            .map_err(|reason| invalid_env(MAX_PAGE_SIZE_VAR, raw, reason))?;
        metadata.env_overrides.push(MAX_PAGE_SIZE_VAR);
    }
    if let Some(raw) = &env.query_timeout {
        limits.query_timeout = parse_timeout(raw)
            .map_err(|reason| invalid_env(QUERY_TIMEOUT_VAR, raw, reason))?;
        metadata.env_overrides.push(QUERY_TIMEOUT_VAR);
    }

    if store.url.trim().is_empty() {
        return Err(ConfigLoadError::EmptyStoreSetting("url"));
    }
    if store.database.trim().is_empty() {
        return Err(ConfigLoadError::EmptyStoreSetting("database"));
    }
    limits.validate()?;

    Ok(Config {
        store,
        limits,
        metadata: ConfigMetadata::default(),
    })
}

fn invalid_env(var: &'static str, value: &str, reason: String) -> ConfigLoadError {
    ConfigLoadError::InvalidEnv {
        var,
        value: value.to_string(),
        reason,
    }
}

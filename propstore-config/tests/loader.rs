use std::fs;
use std::time::Duration;

use propstore_config::{ConfigLoadError, ConfigLoader, EnvConfig};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write config file");
    path
}

fn isolated() -> ConfigLoader {
    ConfigLoader::new()
        .without_env_file()
        .with_env(EnvConfig::default())
}

#[test]
fn defaults_apply_without_a_file() {
    let load = isolated().load().unwrap();
    let config = load.config;

    assert_eq!(config.store.database, "propstore");
    assert_eq!(config.limits.max_page_size.get(), 100);
    assert_eq!(config.limits.collections.images, "PropertyImages");
    assert!(config.metadata.config_path.is_none());
}

#[test]
fn toml_file_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "propstore.toml",
        r#"
[store]
url = "mongodb://db.internal:27017"
database = "realestate"

[limits]
image_join_cap = 30
image_presentation_cap = 12
query_timeout = "1500ms"

[limits.collections]
listings = "Listings"

[limits.cache]
ttl = "5s"
"#,
    );

    let config = isolated().with_config_path(&path).load().unwrap().config;

    assert_eq!(config.store.url, "mongodb://db.internal:27017");
    assert_eq!(config.store.database, "realestate");
    assert_eq!(config.limits.image_join_cap.get(), 30);
    assert_eq!(config.limits.image_presentation_cap.get(), 12);
    assert_eq!(config.limits.query_timeout, Some(Duration::from_millis(1500)));
    assert_eq!(config.limits.collections.listings, "Listings");
    assert_eq!(config.limits.collections.owners, "Owners");
    assert_eq!(config.limits.cache.ttl, Duration::from_secs(5));
    assert_eq!(config.metadata.config_path.as_deref(), Some(path.as_path()));
}

#[test]
fn json_file_is_accepted() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "propstore.json",
        r#"{ "store": { "database": "from-json" }, "limits": { "default_page_size": 20 } }"#,
    );

    let config = isolated().with_config_path(&path).load().unwrap().config;
    assert_eq!(config.store.database, "from-json");
    assert_eq!(config.limits.default_page_size.get(), 20);
}

#[test]
fn env_overrides_win_over_the_file() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "propstore.toml",
        "[store]\ndatabase = \"from-file\"\n[limits]\nmax_page_size = 40\n",
    );
    let env = EnvConfig {
        database: Some("from-env".into()),
        max_page_size: Some("60".into()),
        query_timeout: Some("off".into()),
        ..Default::default()
    };

    let config = isolated()
        .with_env(env)
        .with_config_path(&path)
        .load()
        .unwrap()
        .config;

    assert_eq!(config.store.database, "from-env");
    assert_eq!(config.limits.max_page_size.get(), 60);
    assert_eq!(config.limits.query_timeout, None);
    assert_eq!(
        config.metadata.env_overrides,
        [
            "PROPSTORE_DATABASE",
            "PROPSTORE_MAX_PAGE_SIZE",
            "PROPSTORE_QUERY_TIMEOUT"
        ]
    );
}

#[test]
fn config_path_from_env_is_used() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "custom.toml", "[store]\ndatabase = \"custom\"\n");
    let env = EnvConfig {
        config_path: Some(path),
        ..Default::default()
    };

    let config = isolated().with_env(env).load().unwrap().config;
    assert_eq!(config.store.database, "custom");
}

#[test]
fn env_file_is_loaded_first() {
    let dir = TempDir::new().unwrap();
    let env_file = write(&dir, "test.env", "PROPSTORE_CONFIG_TEST_MARKER=1\n");

    let load = ConfigLoader::new()
        .with_env_file(&env_file)
        .with_env(EnvConfig::default())
        .load()
        .unwrap();

    assert!(load.config.metadata.env_file_loaded);
    assert_eq!(
        std::env::var("PROPSTORE_CONFIG_TEST_MARKER").as_deref(),
        Ok("1")
    );
}

#[test]
fn malformed_env_values_are_rejected() {
    let env = EnvConfig {
        default_page_size: Some("zero".into()),
        ..Default::default()
    };

    let err = isolated().with_env(env).load().unwrap_err();
    assert!(matches!(
        err,
        ConfigLoadError::InvalidEnv {
            var: "PROPSTORE_DEFAULT_PAGE_SIZE",
            ..
        }
    ));
}

#[test]
fn inconsistent_limits_fail_validation() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "propstore.toml",
        "[limits]\ntrace_join_cap = 5\ntrace_presentation_cap = 9\n",
    );

    let err = isolated().with_config_path(&path).load().unwrap_err();
    assert!(matches!(err, ConfigLoadError::Limits(_)));
    assert!(err.to_string().contains("traces presentation cap 9"));
}

#[test]
fn default_page_size_above_max_fails_validation() {
    let env = EnvConfig {
        default_page_size: Some("50".into()),
        max_page_size: Some("20".into()),
        ..Default::default()
    };

    let err = isolated().with_env(env).load().unwrap_err();
    assert!(matches!(err, ConfigLoadError::Limits(_)));
}

#[test]
fn unreadable_and_unparsable_files_are_reported() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");
    let err = isolated().with_config_path(&missing).load().unwrap_err();
    assert!(matches!(err, ConfigLoadError::Read { .. }));

    let broken = write(&dir, "broken.conf", "this is = = not config");
    let err = isolated().with_config_path(&broken).load().unwrap_err();
    match err {
        ConfigLoadError::Parse { reason, .. } => {
            assert!(reason.contains("toml error"));
            assert!(reason.contains("json error"));
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

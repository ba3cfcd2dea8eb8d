//! Config file discovery and loading
//!
//! Tests that set ENCORE_SYNC_CONFIG or ENCORE_DATA_ROOT are #[serial].

use encore_common::config::{
    load_config, load_toml_config, locate_config_file, resolve_data_root, TomlConfig,
    CONFIG_ENV_VAR, DATA_ROOT_ENV_VAR,
};
use encore_common::Error;
use serial_test::serial;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
#[serial]
fn test_explicit_path_beats_env() {
    let dir = TempDir::new().unwrap();
    let explicit = dir.path().join("explicit.toml");
    std::env::set_var(CONFIG_ENV_VAR, dir.path().join("env.toml"));

    assert_eq!(locate_config_file(Some(&explicit)), Some(explicit.clone()));

    std::env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_config_is_loaded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("env.toml");
    fs::write(
        &path,
        "api_origin = \"https://mirror.test\"\ndownload_concurrency = 2\n",
    )
    .unwrap();
    std::env::set_var(CONFIG_ENV_VAR, &path);

    let loaded = load_config(None).unwrap();
    assert_eq!(loaded.source, Some(path.clone()));
    assert_eq!(loaded.config.api_origin.as_deref(), Some("https://mirror.test"));
    assert_eq!(loaded.config.download_concurrency, Some(2));

    std::env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
#[cfg(target_os = "linux")]
fn test_defaults_report_no_source() {
    let dir = TempDir::new().unwrap();
    std::env::remove_var(CONFIG_ENV_VAR);
    let previous = std::env::var_os("XDG_CONFIG_HOME");
    std::env::set_var("XDG_CONFIG_HOME", dir.path());

    if !PathBuf::from("encore-sync.toml").exists() {
        let loaded = load_config(None).unwrap();
        assert_eq!(loaded.source, None);
        assert_eq!(loaded.config, TomlConfig::default());
    }

    match previous {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }
}

#[test]
#[serial]
fn test_named_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.toml");

    let result = load_config(Some(&missing));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "download_concurrency = \"many\"").unwrap();

    assert!(matches!(load_toml_config(&path), Err(Error::Config(_))));
}

#[test]
fn test_unknown_keys_are_ignored() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("extra.toml");
    fs::write(&path, "language = \"ja\"\nfuture_option = true\n").unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.language.as_deref(), Some("ja"));
}

#[test]
#[serial]
fn test_data_root_priority() {
    let toml_config = TomlConfig {
        data_root: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };

    std::env::remove_var(DATA_ROOT_ENV_VAR);
    assert_eq!(resolve_data_root(None, &toml_config), PathBuf::from("/from/toml"));
    assert_eq!(
        resolve_data_root(None, &TomlConfig::default()),
        PathBuf::from(".")
    );

    std::env::set_var(DATA_ROOT_ENV_VAR, "/from/env");
    assert_eq!(resolve_data_root(None, &toml_config), PathBuf::from("/from/env"));

    std::env::set_var(DATA_ROOT_ENV_VAR, "  ");
    assert_eq!(resolve_data_root(None, &toml_config), PathBuf::from("/from/toml"));

    std::env::remove_var(DATA_ROOT_ENV_VAR);
}

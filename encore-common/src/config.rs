//! Configuration loading and data root resolution
//!
//! Configuration is read from a single TOML file. Every key is optional; a
//! missing file is not an error and yields compiled defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "ENCORE_SYNC_CONFIG";

/// Environment variable overriding the data root
pub const DATA_ROOT_ENV_VAR: &str = "ENCORE_DATA_ROOT";

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "encore-sync.toml";

/// One ordinal filter as written in TOML: `8` or `"12-14"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrdinalSpec {
    Number(i64),
    Text(String),
}

/// Logging section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive (overridden by `RUST_LOG`)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Contents of `encore-sync.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub data_root: Option<PathBuf>,
    pub api_origin: Option<String>,
    pub language: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub min_request_interval_ms: Option<u64>,
    pub download_concurrency: Option<usize>,
    pub redownload_all_voices: Option<bool>,
    pub title_filters: Option<Vec<String>>,
    pub ordinal_filters: Option<Vec<OrdinalSpec>>,
    pub logging: LoggingConfig,
}

/// Locate the config file to load
///
/// Priority order:
/// 1. Explicit path (command-line argument)
/// 2. `ENCORE_SYNC_CONFIG` environment variable
/// 3. `./encore-sync.toml`
/// 4. `<platform config dir>/encore-sync/config.toml`
///
/// Explicitly named files (1 and 2) are returned even when missing so the
/// caller can report them; discovered files (3 and 4) only when present.
pub fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|d| d.join("encore-sync").join("config.toml"))
        .filter(|p| p.exists())
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Configuration together with the file it came from
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    /// `None` when no file was found and compiled defaults apply
    pub source: Option<PathBuf>,
}

/// Load configuration, falling back to defaults when no file is found
///
/// A file that was named explicitly but cannot be read or parsed is an error.
/// Callers report a defaulted load once logging is up.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let source = locate_config_file(explicit);
    let config = match &source {
        Some(path) => {
            debug!(path = %path.display(), "Loading configuration");
            load_toml_config(path)?
        }
        None => TomlConfig::default(),
    };
    Ok(LoadedConfig { config, source })
}

/// Resolve the data root
///
/// Priority order: command-line argument, `ENCORE_DATA_ROOT`, TOML
/// `data_root`, then the current directory.
pub fn resolve_data_root(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATA_ROOT_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.data_root {
        return path.clone();
    }

    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_mixed_ordinal_specs() {
        let config: TomlConfig =
            toml::from_str(r#"ordinal_filters = ["1-5", 8, "12-14"]"#).unwrap();
        assert_eq!(
            config.ordinal_filters.unwrap(),
            vec![
                OrdinalSpec::Text("1-5".to_string()),
                OrdinalSpec::Number(8),
                OrdinalSpec::Text("12-14".to_string()),
            ]
        );
    }

    #[test]
    fn test_cli_data_root_wins() {
        let config = TomlConfig {
            data_root: Some(PathBuf::from("/from/toml")),
            ..Default::default()
        };
        let root = resolve_data_root(Some(Path::new("/from/cli")), &config);
        assert_eq!(root, PathBuf::from("/from/cli"));
    }
}

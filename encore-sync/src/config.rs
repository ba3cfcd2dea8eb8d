//! Settings resolution for encore-sync
//!
//! Every value resolves CLI → environment → TOML → compiled default. The
//! result is one [`SyncSettings`] handed to each component explicitly.

use crate::services::encore_client::{ClientOptions, DEFAULT_API_ORIGIN};
use crate::services::VoiceSelector;
use encore_common::config::{resolve_data_root, OrdinalSpec, TomlConfig};
use encore_common::{Error, Result, StorageLayout};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Environment variable overriding the API origin
pub const API_ORIGIN_ENV_VAR: &str = "ENCORE_API_ORIGIN";

const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MIN_REQUEST_INTERVAL_MS: u64 = 100;
const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 4;

/// Title filters used when the config names none
pub fn default_title_filters() -> Vec<String> {
    ["Resonance Liberation", "Trouble", "Hobby"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Ordinal filters used when the config names none
pub fn default_ordinal_filters() -> Vec<OrdinalSpec> {
    vec![
        OrdinalSpec::Text("1-5".to_string()),
        OrdinalSpec::Number(8),
        OrdinalSpec::Text("12-14".to_string()),
    ]
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub data_root: Option<PathBuf>,
    pub api_origin: Option<String>,
}

/// Fully resolved settings
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub layout: StorageLayout,
    pub client: ClientOptions,
    pub download_concurrency: usize,
    pub redownload_all_voices: bool,
    pub title_filters: Vec<String>,
    pub ordinal_filters: Vec<OrdinalSpec>,
}

impl SyncSettings {
    pub fn resolve(toml_config: &TomlConfig, cli: &CliOverrides) -> Result<Self> {
        let data_root = resolve_data_root(cli.data_root.as_deref(), toml_config);
        let origin = resolve_api_origin(cli.api_origin.as_deref(), toml_config)?;

        let timeout_secs = toml_config
            .request_timeout_secs
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must be positive".to_string()));
        }

        let download_concurrency = toml_config
            .download_concurrency
            .unwrap_or(DEFAULT_DOWNLOAD_CONCURRENCY);
        if download_concurrency == 0 {
            return Err(Error::Config("download_concurrency must be at least 1".to_string()));
        }

        info!(data_root = %data_root.display(), origin = %origin, "Resolved sync settings");

        Ok(Self {
            layout: StorageLayout::new(data_root),
            client: ClientOptions {
                origin,
                language: toml_config
                    .language
                    .clone()
                    .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
                timeout: Duration::from_secs(timeout_secs),
                min_request_interval_ms: toml_config
                    .min_request_interval_ms
                    .unwrap_or(DEFAULT_MIN_REQUEST_INTERVAL_MS),
            },
            download_concurrency,
            redownload_all_voices: toml_config.redownload_all_voices.unwrap_or(true),
            title_filters: toml_config
                .title_filters
                .clone()
                .unwrap_or_else(default_title_filters),
            ordinal_filters: toml_config
                .ordinal_filters
                .clone()
                .unwrap_or_else(default_ordinal_filters),
        })
    }

    pub fn selector(&self) -> VoiceSelector {
        VoiceSelector::new(self.title_filters.clone(), &self.ordinal_filters)
    }
}

/// Resolve the API origin
///
/// **Priority:** CLI → `ENCORE_API_ORIGIN` → TOML → default
pub fn resolve_api_origin(cli_arg: Option<&str>, toml_config: &TomlConfig) -> Result<String> {
    let origin = cli_arg
        .map(str::to_string)
        .or_else(|| {
            std::env::var(API_ORIGIN_ENV_VAR)
                .ok()
                .filter(|v| !v.trim().is_empty())
        })
        .or_else(|| toml_config.api_origin.clone())
        .unwrap_or_else(|| DEFAULT_API_ORIGIN.to_string());

    if !origin.starts_with("http://") && !origin.starts_with("https://") {
        return Err(Error::Config(format!(
            "API origin must be an http(s) URL, got {:?}",
            origin
        )));
    }

    Ok(origin.trim_end_matches('/').to_string())
}

//! Encore catalog API client
//!
//! The remote catalog is consumed through the [`CatalogSource`] capability so
//! the workflow can run against a fake in tests. [`EncoreClient`] is the HTTP
//! implementation.

use crate::models::{CharacterRecord, CharacterSummary};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

pub const DEFAULT_API_ORIGIN: &str = "https://api-v2.encore.moe";
const USER_AGENT: &str = concat!("encore-sync/", env!("CARGO_PKG_VERSION"));

/// Transport-level failures
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Remote catalog capability
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// List every character currently in the catalog
    async fn fetch_catalog(&self) -> Result<Vec<CharacterSummary>, FetchError>;

    /// Fetch the full detail document of one character
    async fn fetch_detail(&self, id: i64) -> Result<CharacterRecord, FetchError>;

    /// Download a binary asset (audio, image) by absolute URL
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;

    /// Resolve a catalog-relative reference (leading `/`) to an absolute URL
    fn resolve_url(&self, reference: &str) -> String;
}

/// Resolve `reference` against `origin` when it is origin-relative
pub fn resolve_against(origin: &str, reference: &str) -> String {
    if reference.starts_with('/') {
        format!("{}{}", origin.trim_end_matches('/'), reference)
    } else {
        reference.to_string()
    }
}

#[derive(Debug, Deserialize)]
struct CatalogListing {
    #[serde(rename = "roleList", default)]
    role_list: Vec<serde_json::Value>,
}

/// Parse a catalog listing body
///
/// Entries without a usable `Id` are dropped with a warning; only a body
/// that is not a listing at all is an error.
pub fn parse_catalog_listing(body: serde_json::Value) -> Result<Vec<CharacterSummary>, FetchError> {
    let listing: CatalogListing =
        serde_json::from_value(body).map_err(|e| FetchError::Parse(e.to_string()))?;

    Ok(listing
        .role_list
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<CharacterSummary>(entry) {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed catalog entry");
                None
            }
        })
        .collect())
}

/// Enforces a minimum interval between API requests
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with the interval
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Client options
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub origin: String,
    /// Path segment selecting the catalog language (`en`)
    pub language: String,
    pub timeout: Duration,
    pub min_request_interval_ms: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            origin: DEFAULT_API_ORIGIN.to_string(),
            language: "en".to_string(),
            timeout: Duration::from_secs(10),
            min_request_interval_ms: 100,
        }
    }
}

/// HTTP implementation of [`CatalogSource`]
pub struct EncoreClient {
    http_client: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
    options: ClientOptions,
}

impl EncoreClient {
    pub fn new(options: ClientOptions) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(options.timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            rate_limiter: Arc::new(RateLimiter::new(options.min_request_interval_ms)),
            options,
        })
    }

    fn catalog_url(&self) -> String {
        format!(
            "{}/{}/character",
            self.options.origin.trim_end_matches('/'),
            self.options.language
        )
    }

    fn detail_url(&self, id: i64) -> String {
        format!("{}/{}", self.catalog_url(), id)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FetchError::Api(status.as_u16(), error_text));
        }

        Ok(response)
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        self.rate_limiter.wait().await;
        tracing::debug!(url = %url, "Querying catalog API");

        self.get(url)
            .await?
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))
    }
}

#[async_trait]
impl CatalogSource for EncoreClient {
    async fn fetch_catalog(&self) -> Result<Vec<CharacterSummary>, FetchError> {
        let body = self.get_json(&self.catalog_url()).await?;
        let catalog = parse_catalog_listing(body)?;

        tracing::info!(count = catalog.len(), "Retrieved character catalog");

        Ok(catalog)
    }

    async fn fetch_detail(&self, id: i64) -> Result<CharacterRecord, FetchError> {
        let body = self.get_json(&self.detail_url(id)).await?;
        let record =
            CharacterRecord::from_value(body).map_err(|e| FetchError::Parse(e.to_string()))?;

        tracing::debug!(
            character_id = id,
            name = %record.name,
            voices = record.voices.len(),
            "Retrieved character detail"
        );

        Ok(record)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let bytes = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    fn resolve_url(&self, reference: &str) -> String {
        resolve_against(&self.options.origin, reference)
    }
}

//! Test Helper Utilities
//!
//! In-memory catalog and fixture builders shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use encore_sync::models::{CharacterRecord, CharacterSummary};
use encore_sync::services::encore_client::resolve_against;
use encore_sync::services::{CatalogSource, FetchError};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::Mutex;

pub const FAKE_ORIGIN: &str = "https://catalog.test";

/// Catalog served from memory with per-id and per-url failure injection
#[derive(Default)]
pub struct FakeCatalog {
    summaries: Mutex<Vec<CharacterSummary>>,
    details: Mutex<HashMap<i64, Value>>,
    assets: Mutex<HashMap<String, Vec<u8>>>,
    failing_details: Mutex<HashSet<i64>>,
    failing_urls: Mutex<HashSet<String>>,
    catalog_unavailable: Mutex<bool>,
    requested: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a character with its detail document
    pub fn add_character(&self, detail: Value) {
        let id = detail["Id"].as_i64().expect("detail without Id");
        let name = detail["Name"]["Content"].as_str().map(str::to_string);
        self.summaries
            .lock()
            .unwrap()
            .push(CharacterSummary { id, name });
        self.details.lock().unwrap().insert(id, detail);
    }

    pub fn add_asset(&self, url: &str, bytes: Vec<u8>) {
        self.assets.lock().unwrap().insert(url.to_string(), bytes);
    }

    pub fn fail_detail(&self, id: i64) {
        self.failing_details.lock().unwrap().insert(id);
    }

    pub fn fail_url(&self, url: &str) {
        self.failing_urls.lock().unwrap().insert(url.to_string());
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.catalog_unavailable.lock().unwrap() = unavailable;
    }

    /// Every asset URL fetched so far
    pub fn requested_urls(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn fetch_catalog(&self) -> Result<Vec<CharacterSummary>, FetchError> {
        if *self.catalog_unavailable.lock().unwrap() {
            return Err(FetchError::Network("connection refused".to_string()));
        }
        Ok(self.summaries.lock().unwrap().clone())
    }

    async fn fetch_detail(&self, id: i64) -> Result<CharacterRecord, FetchError> {
        if self.failing_details.lock().unwrap().contains(&id) {
            return Err(FetchError::Api(500, "internal error".to_string()));
        }
        let detail = self
            .details
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(id.to_string()))?;
        CharacterRecord::from_value(detail).map_err(|e| FetchError::Parse(e.to_string()))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        if self.failing_urls.lock().unwrap().contains(url) {
            return Err(FetchError::Network(format!("timeout fetching {}", url)));
        }
        self.assets
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }

    fn resolve_url(&self, reference: &str) -> String {
        resolve_against(FAKE_ORIGIN, reference)
    }
}

/// A small valid PNG
pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 40, 40, 255]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Voice list entry with English and Japanese variants
pub fn voice_entry(id: i64, title: &str, sort: i64) -> Value {
    json!({
        "Id": id,
        "VoiceTitle": title,
        "Sort": sort,
        "VoiceEn": format!("https://cdn.test/voice/{}_en.mp3", id),
        "VoiceJa": format!("https://cdn.test/voice/{}_ja.mp3", id),
        "VoiceKo": "",
    })
}

pub fn portrait_reference(id: i64) -> String {
    format!("/d/GameData/UI/T_IconRoleHeadCircle_{}.png", id)
}

/// Detail document with a portrait and the given voice lines
pub fn character_detail(id: i64, name: &str, voices: Vec<Value>) -> Value {
    json!({
        "Id": id,
        "Name": { "Id": id * 10, "Content": name },
        "RoleHeadIconCircle": portrait_reference(id),
        "VoiceList": voices,
    })
}

/// Register a character and serve every asset it references
pub fn add_served_character(catalog: &FakeCatalog, detail: Value) {
    let id = detail["Id"].as_i64().expect("detail without Id");
    if let Some(voices) = detail["VoiceList"].as_array() {
        for voice in voices {
            for key in ["VoiceEn", "VoiceJa", "VoiceKo", "VoiceZh"] {
                if let Some(url) = voice[key].as_str().filter(|u| !u.is_empty()) {
                    catalog.add_asset(url, format!("audio:{}", url).into_bytes());
                }
            }
        }
    }
    catalog.add_asset(
        &resolve_against(FAKE_ORIGIN, &portrait_reference(id)),
        png_bytes(),
    );
    catalog.add_character(detail);
}

//! Data models for encore-sync
//!
//! - Remote catalog documents (summary, record, voice asset)
//! - Published manifest
//! - Per-task and per-entity outcomes aggregated into a batch report

pub mod character;
pub mod manifest;
pub mod report;

pub use character::{CharacterRecord, CharacterSummary, LanguageCode, VoiceAsset};
pub use manifest::{LocalAssetFile, Manifest};
pub use report::{EntityReport, IngestReport, TaskOutcome};

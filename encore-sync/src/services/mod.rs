//! Service modules for the sync pipeline
//!
//! Leaf components: remote catalog access, diffing, selection, transcoding,
//! persistence, scanning and manifest building.

pub mod catalog_differ;
pub mod encore_client;
pub mod file_scanner;
pub mod image_transcoder;
pub mod manifest_builder;
pub mod record_store;
pub mod voice_selector;

pub use encore_client::{CatalogSource, ClientOptions, EncoreClient, FetchError};
pub use file_scanner::{FileScanner, ScanError};
pub use image_transcoder::{ImageTranscoder, TranscodeError, WebpTranscoder};
pub use manifest_builder::{ManifestBuilder, PriorManifest};
pub use record_store::RecordStore;
pub use voice_selector::{DownloadTask, MatchRule, OrdinalFilter, SelectionReason, VoiceSelector};

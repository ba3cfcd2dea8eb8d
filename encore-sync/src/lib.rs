//! encore-sync library interface
//!
//! Incremental mirror of the Encore character catalog: new characters are
//! ingested with their portraits and selected voice lines, and a manifest of
//! the local audio tree is regenerated on every run.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod workflow;

pub use crate::config::{CliOverrides, SyncSettings};
pub use crate::error::{SyncError, SyncResult};

use crate::services::{CatalogSource, ImageTranscoder, RecordStore};
use crate::workflow::{IngestionOrchestrator, RosterEnricher, RunCoordinator};
use std::sync::Arc;

/// Wire a run coordinator from resolved settings and its capabilities
pub fn build_coordinator(
    settings: &SyncSettings,
    catalog: Arc<dyn CatalogSource>,
    transcoder: Arc<dyn ImageTranscoder>,
) -> RunCoordinator {
    let store = RecordStore::new(settings.layout.clone());
    let orchestrator = IngestionOrchestrator::new(
        catalog.clone(),
        transcoder,
        store,
        settings.selector(),
        settings.download_concurrency,
    );
    RunCoordinator::new(catalog, orchestrator, settings.redownload_all_voices)
}

/// Wire a roster enricher from resolved settings and its capabilities
pub fn build_enricher(
    settings: &SyncSettings,
    catalog: Arc<dyn CatalogSource>,
    transcoder: Arc<dyn ImageTranscoder>,
) -> RosterEnricher {
    RosterEnricher::new(catalog, transcoder, RecordStore::new(settings.layout.clone()))
}

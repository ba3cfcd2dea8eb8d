//! Run coordinator
//!
//! One linear pass:
//! START → DIFF_AND_INGEST → SELECT_AND_DOWNLOAD (only when new characters
//! exist) → BUILD_MANIFEST → COMPARE → DONE
//!
//! The outcome is CHANGED when new characters were found or the manifest's
//! file list differs from the one on disk before the rebuild.

use crate::error::SyncResult;
use crate::models::{IngestReport, Manifest};
use crate::services::catalog_differ;
use crate::services::manifest_builder::{files_digest, ManifestBuilder, PriorManifest};
use crate::services::CatalogSource;
use crate::workflow::ingestion::IngestionOrchestrator;
use encore_common::StorageLayout;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Exit code of a run that completed with changes
pub const EXIT_CHANGED: i32 = 0;
/// Exit code telling automation to skip downstream work
pub const EXIT_UNCHANGED: i32 = 78;
/// Exit code of a run aborted by a fatal error
pub const EXIT_FATAL: i32 = 1;

/// Phases of a run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunPhase {
    Start,
    DiffAndIngest,
    SelectAndDownload,
    BuildManifest,
    Compare,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Start => "START",
            RunPhase::DiffAndIngest => "DIFF_AND_INGEST",
            RunPhase::SelectAndDownload => "SELECT_AND_DOWNLOAD",
            RunPhase::BuildManifest => "BUILD_MANIFEST",
            RunPhase::Compare => "COMPARE",
            RunPhase::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Whether a run produced anything new
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunOutcome {
    Changed,
    Unchanged,
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Changed => EXIT_CHANGED,
            RunOutcome::Unchanged => EXIT_UNCHANGED,
        }
    }
}

/// Everything a run observed
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub new_entities: BTreeSet<i64>,
    pub report: IngestReport,
    pub prior_manifest: PriorManifest,
    pub manifest_digest: String,
    pub manifest: Manifest,
}

/// Sequences a full sync pass
pub struct RunCoordinator {
    catalog: Arc<dyn CatalogSource>,
    orchestrator: IngestionOrchestrator,
    layout: StorageLayout,
    redownload_all_voices: bool,
}

impl RunCoordinator {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        orchestrator: IngestionOrchestrator,
        redownload_all_voices: bool,
    ) -> Self {
        let layout = orchestrator.store().layout().clone();
        Self {
            catalog,
            orchestrator,
            layout,
            redownload_all_voices,
        }
    }

    fn enter(&self, phase: RunPhase) {
        tracing::debug!(phase = %phase, "Run phase");
    }

    /// Run one full pass
    pub async fn run(&self) -> SyncResult<RunSummary> {
        self.enter(RunPhase::Start);
        self.layout.ensure_directories()?;

        self.enter(RunPhase::DiffAndIngest);
        let catalog = self.catalog.fetch_catalog().await?;
        let names: HashMap<i64, String> =
            catalog
            .iter()
            .map(|c| (c.id, c.display_name().to_string()))
            .collect();
        let remote_ids: BTreeSet<i64> = names.keys().copied().collect();
        let local_ids = catalog_differ::list_local_ids(&self.layout.characters_dir());
        let new_entities = catalog_differ::diff(&remote_ids, &local_ids);

        let mut report = if new_entities.is_empty() {
            tracing::info!("No new characters found");
            IngestReport::default()
        } else {
            tracing::info!(count = new_entities.len(), ids = ?new_entities, "Found new characters");
            self.orchestrator.ingest(&new_entities, &names).await?
        };

        if !new_entities.is_empty() && self.redownload_all_voices {
            self.enter(RunPhase::SelectAndDownload);
            let records = self.orchestrator.store().load_all_records();
            let refreshed = self
                .orchestrator
                .download_voices_for_records(&records, &new_entities)
                .await;
            tracing::info!("Voice refresh complete: {}", refreshed.display_string());
            report.extend(refreshed);
        }

        self.enter(RunPhase::BuildManifest);
        let prior_manifest = PriorManifest::capture(&self.layout.manifest_path());
        let manifest = self.rebuild_manifest().await?;

        self.enter(RunPhase::Compare);
        let manifest_digest = files_digest(&manifest.files)?;
        let manifest_changed = prior_manifest.differs_from(&manifest_digest);
        let outcome = if !new_entities.is_empty() || manifest_changed {
            RunOutcome::Changed
        } else {
            RunOutcome::Unchanged
        };

        self.enter(RunPhase::Done);
        tracing::info!(
            outcome = ?outcome,
            new_entities = new_entities.len(),
            manifest_changed,
            "Run complete"
        );

        Ok(RunSummary {
            outcome,
            new_entities,
            report,
            prior_manifest,
            manifest_digest,
            manifest,
        })
    }

    /// Rebuild and write the manifest off the async runtime
    pub async fn rebuild_manifest(&self) -> SyncResult<Manifest> {
        let layout = self.layout.clone();
        let manifest =
            tokio::task::spawn_blocking(move || ManifestBuilder::new(layout).build_and_write())
                .await??;
        Ok(manifest)
    }

    /// Re-fetch every catalog character's record and portrait
    ///
    /// Local state is ignored; voice lines are not downloaded.
    pub async fn refresh_all(&self) -> SyncResult<IngestReport> {
        self.layout.ensure_directories()?;
        let catalog = self.catalog.fetch_catalog().await?;
        tracing::info!(count = catalog.len(), "Refreshing all characters");

        let mut report = IngestReport::default();
        for summary in &catalog {
            tracing::info!(character_id = summary.id, name = %summary.display_name(), "Fetching character");
            report.push(
                self.orchestrator
                    .ingest_entity(summary.id, summary.display_name(), false)
                    .await?,
            );
        }

        tracing::info!("Refresh complete: {}", report.display_string());
        Ok(report)
    }
}

//! Ingestion orchestrator
//!
//! For each new character: fetch detail, persist the record, fetch and
//! transcode the circular portrait, then download the selected voice lines.
//!
//! Failures are isolated at the smallest granularity. A failed detail fetch
//! fails that entity only; a failed download or transcode fails that file
//! only. The one fatal condition is being unable to write a record.

use crate::error::SyncResult;
use crate::models::{CharacterRecord, EntityReport, IngestReport, TaskOutcome};
use crate::services::{CatalogSource, DownloadTask, ImageTranscoder, RecordStore, VoiceSelector};
use encore_common::layout::ICON_CIRCLE;
use futures::stream::{self, StreamExt};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

/// Run a storage write on the blocking pool
async fn write_blocking<F>(write: F) -> Result<PathBuf, String>
where
    F: FnOnce() -> encore_common::Result<PathBuf> + Send + 'static,
{
    match tokio::task::spawn_blocking(write).await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// Fetch an image, transcode it to WebP and store it as `<category>/<key>.webp`
pub async fn fetch_image(
    catalog: &dyn CatalogSource,
    transcoder: Arc<dyn ImageTranscoder>,
    store: &RecordStore,
    url: &str,
    category: &str,
    key: &str,
) -> TaskOutcome {
    let target = format!("{}/{}.webp", category, key);

    let bytes = match catalog.fetch_bytes(url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(url = %url, target = %target, error = %e, "Failed to fetch image");
            return TaskOutcome::failed(target, e.to_string());
        }
    };

    let converted = match tokio::task::spawn_blocking(move || transcoder.transcode(&bytes)).await {
        Ok(Ok(converted)) => converted,
        Ok(Err(e)) => {
            tracing::warn!(url = %url, target = %target, error = %e, "Failed to convert image");
            return TaskOutcome::failed(target, e.to_string());
        }
        Err(e) => return TaskOutcome::failed(target, e.to_string()),
    };

    let writer = store.clone();
    let (category_owned, key_owned) = (category.to_string(), key.to_string());
    match write_blocking(move || writer.write_image(&category_owned, &key_owned, &converted)).await {
        Ok(path) => {
            tracing::info!(path = %path.display(), "Saved image");
            TaskOutcome::succeeded(target)
        }
        Err(e) => {
            tracing::warn!(target = %target, error = %e, "Failed to write image");
            TaskOutcome::failed(target, e.to_string())
        }
    }
}

/// Drives per-entity ingestion
pub struct IngestionOrchestrator {
    catalog: Arc<dyn CatalogSource>,
    transcoder: Arc<dyn ImageTranscoder>,
    store: RecordStore,
    selector: VoiceSelector,
    download_concurrency: usize,
}

impl IngestionOrchestrator {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        transcoder: Arc<dyn ImageTranscoder>,
        store: RecordStore,
        selector: VoiceSelector,
        download_concurrency: usize,
    ) -> Self {
        Self {
            catalog,
            transcoder,
            store,
            selector,
            download_concurrency: download_concurrency.max(1),
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Ingest every id in `ids`, in ascending order
    ///
    /// `names` supplies catalog display names for logging.
    pub async fn ingest(
        &self,
        ids: &BTreeSet<i64>,
        names: &HashMap<i64, String>,
    ) -> SyncResult<IngestReport> {
        let mut report = IngestReport::default();

        for id in ids {
            let name = names.get(id).map(String::as_str).unwrap_or("");
            tracing::info!(character_id = id, name = %name, "Fetching new character");
            report.push(self.ingest_entity(*id, name, true).await?);
        }

        tracing::info!("Ingestion complete: {}", report.display_string());
        Ok(report)
    }

    /// Process one entity; `with_voices` also runs voice selection and downloads
    pub async fn ingest_entity(
        &self,
        id: i64,
        name: &str,
        with_voices: bool,
    ) -> SyncResult<EntityReport> {
        let record = match self.catalog.fetch_detail(id).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(character_id = id, error = %e, "Failed to fetch character detail");
                return Ok(EntityReport::failed(id, name, e.to_string()));
            }
        };

        // Unwritable storage aborts the run
        let store = self.store.clone();
        let to_save = record.clone();
        tokio::task::spawn_blocking(move || store.save_record(&to_save)).await??;

        let mut entity = EntityReport::new(id, record.name.clone());
        entity.portrait = self.fetch_portrait(&record).await;
        if with_voices {
            entity.downloads = self.download_voices(&record).await;
        }

        Ok(entity)
    }

    /// Fetch the circular portrait, if the record has one
    pub async fn fetch_portrait(&self, record: &CharacterRecord) -> Option<TaskOutcome> {
        let reference = record.portrait_url.as_deref()?;
        let url = self.catalog.resolve_url(reference);
        Some(
            fetch_image(
                self.catalog.as_ref(),
                self.transcoder.clone(),
                &self.store,
                &url,
                ICON_CIRCLE,
                &record.id.to_string(),
            )
            .await,
        )
    }

    /// Download every selected voice line of `record`
    ///
    /// Existing files are downloaded again and overwritten.
    pub async fn download_voices(&self, record: &CharacterRecord) -> Vec<TaskOutcome> {
        let tasks = self.selector.plan_downloads(record);

        tracing::info!(
            character_id = record.id,
            name = %record.name,
            voices = record.voices.len(),
            files = tasks.len(),
            "Downloading selected voice lines"
        );

        stream::iter(tasks)
            .map(|task| self.download(task))
            .buffer_unordered(self.download_concurrency)
            .collect()
            .await
    }

    async fn download(&self, task: DownloadTask) -> TaskOutcome {
        let target = self
            .store
            .layout()
            .relative_path(&self.store.voice_path(task.character_id, &task.file_name));

        let result = match self.catalog.fetch_bytes(&task.url).await {
            Ok(bytes) => {
                let store = self.store.clone();
                let (character_id, file_name) = (task.character_id, task.file_name.clone());
                write_blocking(move || store.write_voice(character_id, &file_name, &bytes)).await
            }
            Err(e) => Err(e.to_string()),
        };

        match result {
            Ok(_) => {
                tracing::debug!(
                    ordinal = ?task.ordinal,
                    title = %task.title,
                    lang = %task.language,
                    target = %target,
                    "Downloaded voice line"
                );
                TaskOutcome::succeeded(target)
            }
            Err(reason) => {
                tracing::warn!(
                    ordinal = ?task.ordinal,
                    title = %task.title,
                    lang = %task.language,
                    error = %reason,
                    "Failed to download voice line"
                );
                TaskOutcome::failed(target, reason)
            }
        }
    }

    /// Voice downloads for every persisted record not in `skip`
    pub async fn download_voices_for_records(
        &self,
        records: &[CharacterRecord],
        skip: &BTreeSet<i64>,
    ) -> IngestReport {
        let mut report = IngestReport::default();

        for record in records.iter().filter(|r| !skip.contains(&r.id)) {
            if record.voices.is_empty() {
                continue;
            }
            let mut entity = EntityReport::new(record.id, record.name.clone());
            entity.downloads = self.download_voices(record).await;
            report.push(entity);
        }

        report
    }
}

//! Batch outcome reporting
//!
//! Failures at file or entity granularity are expected during a sync. They
//! are recorded here as values and summarized once the batch finishes.

use serde::Serialize;

/// Result of one file-producing task (download, transcode)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TaskOutcome {
    Succeeded { target: String },
    Skipped { target: String, reason: String },
    Failed { target: String, reason: String },
}

impl TaskOutcome {
    pub fn succeeded(target: impl Into<String>) -> Self {
        TaskOutcome::Succeeded {
            target: target.into(),
        }
    }

    pub fn skipped(target: impl Into<String>, reason: impl Into<String>) -> Self {
        TaskOutcome::Skipped {
            target: target.into(),
            reason: reason.into(),
        }
    }

    pub fn failed(target: impl Into<String>, reason: impl Into<String>) -> Self {
        TaskOutcome::Failed {
            target: target.into(),
            reason: reason.into(),
        }
    }

    pub fn target(&self) -> &str {
        match self {
            TaskOutcome::Succeeded { target }
            | TaskOutcome::Skipped { target, .. }
            | TaskOutcome::Failed { target, .. } => target,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TaskOutcome::Failed { .. })
    }
}

/// Everything that happened to one character during a pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct EntityReport {
    pub character_id: i64,
    pub name: String,
    /// Set when the entity could not be processed at all
    pub failure: Option<String>,
    /// Portrait fetch + transcode, absent when the record has no portrait
    pub portrait: Option<TaskOutcome>,
    pub downloads: Vec<TaskOutcome>,
}

impl EntityReport {
    pub fn new(character_id: i64, name: impl Into<String>) -> Self {
        Self {
            character_id,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn failed(character_id: i64, name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::new(character_id, name)
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Aggregated outcome of an ingestion batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub entities: Vec<EntityReport>,
}

impl IngestReport {
    pub fn push(&mut self, entity: EntityReport) {
        self.entities.push(entity);
    }

    pub fn extend(&mut self, other: IngestReport) {
        self.entities.extend(other.entities);
    }

    pub fn entities_failed(&self) -> usize {
        self.entities.iter().filter(|e| e.is_failed()).count()
    }

    pub fn entities_succeeded(&self) -> usize {
        self.entities.len() - self.entities_failed()
    }

    pub fn downloads_succeeded(&self) -> usize {
        self.all_downloads().filter(|d| d.is_success()).count()
    }

    pub fn downloads_failed(&self) -> usize {
        self.all_downloads().filter(|d| d.is_failure()).count()
    }

    /// Every failed task with the entity it belongs to
    pub fn failures(&self) -> Vec<(i64, &TaskOutcome)> {
        self.entities
            .iter()
            .flat_map(|e| {
                e.portrait
                    .iter()
                    .chain(e.downloads.iter())
                    .filter(|t| t.is_failure())
                    .map(move |t| (e.character_id, t))
            })
            .collect()
    }

    fn all_downloads(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.entities.iter().flat_map(|e| e.downloads.iter())
    }

    pub fn display_string(&self) -> String {
        format!(
            "{} entities processed, {} failed; {} voice files downloaded, {} failed",
            self.entities_succeeded(),
            self.entities_failed(),
            self.downloads_succeeded(),
            self.downloads_failed()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut ok = EntityReport::new(1, "Aalto");
        ok.downloads.push(TaskOutcome::succeeded("voices/1/10_en.mp3"));
        ok.downloads.push(TaskOutcome::failed("voices/1/10_ja.mp3", "HTTP 404"));
        ok.portrait = Some(TaskOutcome::failed("iconCircle/1.webp", "decode"));

        let mut report = IngestReport::default();
        report.push(ok);
        report.push(EntityReport::failed(2, "Baizhi", "timeout"));

        assert_eq!(report.entities_succeeded(), 1);
        assert_eq!(report.entities_failed(), 1);
        assert_eq!(report.downloads_succeeded(), 1);
        assert_eq!(report.downloads_failed(), 1);
        assert_eq!(report.failures().len(), 2);
        assert_eq!(
            report.display_string(),
            "1 entities processed, 1 failed; 1 voice files downloaded, 1 failed"
        );
    }
}

//! Local persistence of character records, images and voice files

use crate::models::CharacterRecord;
use crate::services::catalog_differ;
use encore_common::{Error, Result, StorageLayout};
use std::path::PathBuf;

/// Reads and writes everything under a [`StorageLayout`]
#[derive(Debug, Clone)]
pub struct RecordStore {
    layout: StorageLayout,
}

impl RecordStore {
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Persist the detail document verbatim as `<id>.json`
    pub fn save_record(&self, record: &CharacterRecord) -> Result<PathBuf> {
        std::fs::create_dir_all(self.layout.characters_dir())?;
        let path = self.layout.character_record_path(record.id);
        let content = serde_json::to_string_pretty(record.raw())?;
        std::fs::write(&path, content)?;

        tracing::debug!(character_id = record.id, path = %path.display(), "Saved character record");
        Ok(path)
    }

    pub fn load_record(&self, id: i64) -> Result<CharacterRecord> {
        let path = self.layout.character_record_path(id);
        if !path.exists() {
            return Err(Error::NotFound(format!("character record {}", id)));
        }
        let content = std::fs::read_to_string(&path)?;
        let raw: serde_json::Value = serde_json::from_str(&content)?;
        Ok(CharacterRecord::from_value(raw)?)
    }

    /// Raw document of a record, for fields outside the typed view
    pub fn load_raw_record(&self, id: i64) -> Result<serde_json::Value> {
        let path = self.layout.character_record_path(id);
        let content = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Every readable persisted record, ordered by id
    ///
    /// Unreadable records are skipped with a warning.
    pub fn load_all_records(&self) -> Vec<CharacterRecord> {
        catalog_differ::list_local_ids(&self.layout.characters_dir())
            .into_iter()
            .filter_map(|id| match self.load_record(id) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(character_id = id, error = %e, "Skipping unreadable record");
                    None
                }
            })
            .collect()
    }

    pub fn voice_path(&self, character_id: i64, file_name: &str) -> PathBuf {
        self.layout.character_voices_dir(character_id).join(file_name)
    }

    pub fn write_voice(&self, character_id: i64, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(self.layout.character_voices_dir(character_id))?;
        let path = self.voice_path(character_id, file_name);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    pub fn image_exists(&self, category: &str, id: impl std::fmt::Display) -> bool {
        self.layout.image_path(category, id).exists()
    }

    pub fn write_image(
        &self,
        category: &str,
        id: impl std::fmt::Display,
        bytes: &[u8],
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(self.layout.image_dir(category))?;
        let path = self.layout.image_path(category, id);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_round_trip_preserves_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(StorageLayout::new(dir.path()));
        let raw = json!({ "Id": 1102, "Name": { "Content": "散華" }, "Breaches": [] });
        let record = CharacterRecord::from_value(raw.clone()).unwrap();

        let path = store.save_record(&record).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("散華"));
        assert!(written.contains("\n  \"Id\""));

        assert_eq!(store.load_raw_record(1102).unwrap(), raw);
        assert_eq!(store.load_record(1102).unwrap().name, "散華");
    }

    #[test]
    fn test_load_all_skips_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(StorageLayout::new(dir.path()));
        store
            .save_record(&CharacterRecord::from_value(json!({ "Id": 1 })).unwrap())
            .unwrap();
        std::fs::write(store.layout().character_record_path(2), "{ broken").unwrap();

        let records = store.load_all_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 1);
    }

    #[test]
    fn test_missing_record_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(StorageLayout::new(dir.path()));
        assert!(matches!(store.load_record(5), Err(Error::NotFound(_))));
    }
}

//! On-disk storage layout under the data root

use crate::Result;
use std::path::{Path, PathBuf};

/// Image category for circular character portraits
pub const ICON_CIRCLE: &str = "iconCircle";
/// Image category for ascension material icons
pub const ICON_ASCENSION: &str = "iconAscension";
/// Image category for weekly boss material icons
pub const ICON_WEEKLY_BOSS: &str = "iconWeeklyBoss";

/// Paths of everything the sync tools read and write
///
/// ```text
/// <root>/data/json/characters/<id>.json
/// <root>/data/json/characters.json
/// <root>/data/json/manifest.json
/// <root>/data/imgs/<category>/<id>.webp
/// <root>/voices/<entityId>/<assetId>_<lang>.mp3
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn json_dir(&self) -> PathBuf {
        self.root.join("data").join("json")
    }

    /// Directory holding one record per character
    pub fn characters_dir(&self) -> PathBuf {
        self.json_dir().join("characters")
    }

    pub fn character_record_path(&self, id: i64) -> PathBuf {
        self.characters_dir().join(format!("{}.json", id))
    }

    /// Curated roster consumed by the enrichment step
    pub fn roster_path(&self) -> PathBuf {
        self.json_dir().join("characters.json")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.json_dir().join("manifest.json")
    }

    pub fn image_dir(&self, category: &str) -> PathBuf {
        self.root.join("data").join("imgs").join(category)
    }

    pub fn image_path(&self, category: &str, id: impl std::fmt::Display) -> PathBuf {
        self.image_dir(category).join(format!("{}.webp", id))
    }

    pub fn voices_dir(&self) -> PathBuf {
        self.root.join("voices")
    }

    pub fn character_voices_dir(&self, character_id: i64) -> PathBuf {
        self.voices_dir().join(character_id.to_string())
    }

    /// Create the directories every run writes into
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(self.characters_dir())?;
        std::fs::create_dir_all(self.voices_dir())?;
        Ok(())
    }

    /// Path relative to the root with forward slashes, as published in the manifest
    pub fn relative_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

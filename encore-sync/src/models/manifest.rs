//! Published content manifest (`manifest.json`)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One downloaded audio file present on disk at scan time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalAssetFile {
    /// Name of the directory holding the file
    pub character_id: String,
    pub filename: String,
    /// Path relative to the data root, forward slashes
    pub path: String,
    /// Language code parsed from the `_<code>` filename suffix, or `unknown`
    pub lang: String,
    pub size: u64,
    /// Hex MD5 of the file contents
    pub md5: String,
}

/// Complete, freshly scanned listing of downloaded audio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub generated_at: DateTime<Utc>,
    /// Directory walk order
    pub files: Vec<LocalAssetFile>,
}

impl Manifest {
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

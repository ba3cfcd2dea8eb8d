//! Downloaded audio discovery
//!
//! Walks a storage tree and returns every file with the audio extension.
//! Entries are visited in file-name order within each directory so repeated
//! scans of an unchanged tree yield the same sequence.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Extension of downloaded voice files
pub const AUDIO_EXTENSION: &str = "mp3";

/// Scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Audio file scanner
pub struct FileScanner {
    ignore_patterns: Vec<String>,
    extension: String,
}

impl FileScanner {
    /// Scanner for `.mp3` files, ignoring common system files
    pub fn new() -> Self {
        Self {
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                ".git".to_string(),
            ],
            extension: AUDIO_EXTENSION.to_string(),
        }
    }

    /// Scan `root_path` recursively for audio files, in walk order
    pub fn scan(&self, root_path: &Path) -> Result<Vec<PathBuf>, ScanError> {
        if !root_path.exists() {
            return Err(ScanError::PathNotFound(root_path.to_path_buf()));
        }

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory(root_path.to_path_buf()));
        }

        let mut files = Vec::new();
        let mut symlink_visited = HashSet::new();

        let walker = WalkDir::new(root_path)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| self.should_process_entry(e, &mut symlink_visited));

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && self.has_audio_extension(entry.path()) {
                        files.push(entry.path().to_path_buf());
                    }
                }
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                    // Continue scanning, don't abort
                }
            }
        }

        tracing::debug!(
            root = %root_path.display(),
            files = files.len(),
            "Audio scan complete"
        );

        Ok(files)
    }

    /// Check if entry should be processed
    fn should_process_entry(
        &self,
        entry: &DirEntry,
        symlink_visited: &mut HashSet<PathBuf>,
    ) -> bool {
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy();

        for pattern in &self.ignore_patterns {
            if file_name.contains(pattern) {
                return false;
            }
        }

        if entry.file_type().is_symlink() {
            if let Ok(canonical) = path.canonicalize() {
                if !symlink_visited.insert(canonical) {
                    tracing::warn!("Symlink loop detected: {}", path.display());
                    return false;
                }
            }
        }

        true
    }

    /// Case-sensitive, like the names the downloader produces
    fn has_audio_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy() == self.extension.as_str())
            .unwrap_or(false)
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_audio_extension_detection() {
        let scanner = FileScanner::new();
        assert!(scanner.has_audio_extension(Path::new("voices/1/2_en.mp3")));
        assert!(!scanner.has_audio_extension(Path::new("voices/1/2_en.mp3.part")));
        assert!(!scanner.has_audio_extension(Path::new("voices/1/readme.txt")));
        assert!(!scanner.has_audio_extension(Path::new("voices/1/mp3")));
    }

    #[test]
    fn test_scan_nonexistent_path() {
        let scanner = FileScanner::new();
        let result = scanner.scan(Path::new("/nonexistent/encore/voices"));
        assert!(matches!(result, Err(ScanError::PathNotFound(_))));
    }

    #[test]
    fn test_scan_file_as_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.mp3");
        fs::write(&file, b"x").unwrap();

        let result = FileScanner::new().scan(&file);
        assert!(matches!(result, Err(ScanError::NotADirectory(_))));
    }

    #[test]
    fn test_scan_nested_directories_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("2")).unwrap();
        fs::create_dir_all(dir.path().join("1/deeper")).unwrap();
        fs::write(dir.path().join("2/9_en.mp3"), b"a").unwrap();
        fs::write(dir.path().join("1/3_ja.mp3"), b"b").unwrap();
        fs::write(dir.path().join("1/deeper/4_ko.mp3"), b"c").unwrap();
        fs::write(dir.path().join("1/notes.txt"), b"d").unwrap();
        fs::write(dir.path().join(".DS_Store"), b"e").unwrap();

        let files = FileScanner::new().scan(dir.path()).unwrap();
        let relative: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();

        assert_eq!(relative, vec!["1/3_ja.mp3", "1/deeper/4_ko.mp3", "2/9_en.mp3"]);
    }
}

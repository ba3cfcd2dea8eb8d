//! Manifest building
//!
//! The manifest is rebuilt from a fresh scan of the voice tree on every run,
//! never patched. Each entry carries the MD5 of the file contents.
//!
//! Change detection compares a SHA-256 over the serialized `files` array
//! only. `generated_at` changes on every build and is left out, so two builds
//! over an unchanged tree compare equal.

use crate::models::{LocalAssetFile, Manifest};
use crate::services::file_scanner::{FileScanner, ScanError};
use chrono::Utc;
use encore_common::{Result, StorageLayout};
use md5::Md5;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Language marker for files without a parsable `_<code>` suffix
pub const UNKNOWN_LANGUAGE: &str = "unknown";

const HASH_CHUNK_SIZE: usize = 1024 * 1024;

/// Language code from `<id>_<code>.<ext>`
pub fn detect_language(file_name: &str) -> String {
    let parts: Vec<&str> = file_name.split('_').collect();
    if parts.len() > 1 {
        if let Some((code, _ext)) = parts[parts.len() - 1].split_once('.') {
            if !code.is_empty() {
                return code.to_string();
            }
        }
    }
    UNKNOWN_LANGUAGE.to_string()
}

/// Hex MD5 of a file, read in 1 MiB chunks
pub fn md5_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Change-detection digest of a manifest's file list
pub fn files_digest(files: &[LocalAssetFile]) -> Result<String> {
    let bytes = serde_json::to_vec(files)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// State of the manifest on disk before a rebuild
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriorManifest {
    /// No manifest file yet
    Absent,
    /// A file exists but is not a parsable manifest
    Unreadable,
    Present { digest: String },
}

impl PriorManifest {
    /// Capture the digest of the manifest at `path`
    pub fn capture(path: &Path) -> Self {
        if !path.exists() {
            return PriorManifest::Absent;
        }

        let parsed = std::fs::read(path)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<Manifest>(&bytes).ok());

        match parsed.map(|m| files_digest(&m.files)) {
            Some(Ok(digest)) => PriorManifest::Present { digest },
            _ => {
                tracing::warn!(path = %path.display(), "Existing manifest is unreadable");
                PriorManifest::Unreadable
            }
        }
    }

    /// Whether a rebuilt manifest with `digest` differs from this one
    pub fn differs_from(&self, digest: &str) -> bool {
        match self {
            PriorManifest::Present { digest: before } => before != digest,
            PriorManifest::Absent | PriorManifest::Unreadable => true,
        }
    }
}

/// Scans the voice tree and writes `manifest.json`
pub struct ManifestBuilder {
    layout: StorageLayout,
    scanner: FileScanner,
}

impl ManifestBuilder {
    pub fn new(layout: StorageLayout) -> Self {
        Self {
            layout,
            scanner: FileScanner::new(),
        }
    }

    /// Build a manifest of the audio files under the voices directory
    pub fn build(&self) -> Result<Manifest> {
        self.build_from(&self.layout.voices_dir())
    }

    /// Build a manifest of the audio files under `root_dir`
    ///
    /// A missing root yields an empty manifest. Files that disappear or
    /// cannot be read during the scan are left out.
    pub fn build_from(&self, root_dir: &Path) -> Result<Manifest> {
        let paths = match self.scanner.scan(root_dir) {
            Ok(paths) => paths,
            Err(ScanError::PathNotFound(_)) => Vec::new(),
            Err(e) => return Err(encore_common::Error::InvalidInput(e.to_string())),
        };

        let mut files = Vec::with_capacity(paths.len());
        for path in &paths {
            match self.describe(path) {
                Ok(entry) => files.push(entry),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable audio file");
                }
            }
        }

        Ok(Manifest {
            generated_at: Utc::now(),
            files,
        })
    }

    fn describe(&self, path: &Path) -> std::io::Result<LocalAssetFile> {
        let size = std::fs::metadata(path)?.len();
        let md5 = md5_file(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let character_id = path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(LocalAssetFile {
            character_id,
            lang: detect_language(&filename),
            path: self.layout.relative_path(path),
            filename,
            size,
            md5,
        })
    }

    pub fn write(&self, manifest: &Manifest) -> Result<PathBuf> {
        let path = self.layout.manifest_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(manifest)?)?;
        Ok(path)
    }

    /// Build, write and return the manifest
    pub fn build_and_write(&self) -> Result<Manifest> {
        let manifest = self.build()?;
        let path = self.write(&manifest)?;

        tracing::info!(
            path = %path.display(),
            files = manifest.files.len(),
            total_bytes = manifest.total_size(),
            "Manifest generated"
        );

        Ok(manifest)
    }
}

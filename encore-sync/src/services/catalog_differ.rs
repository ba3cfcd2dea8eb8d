//! Catalog differ
//!
//! Decides which remote characters are new relative to the persisted records.

use std::collections::BTreeSet;
use std::path::Path;

/// Identifiers present remotely but not locally
pub fn diff(remote_ids: &BTreeSet<i64>, local_ids: &BTreeSet<i64>) -> BTreeSet<i64> {
    remote_ids.difference(local_ids).copied().collect()
}

/// Identifiers of the records persisted in `characters_dir`
///
/// Only `<digits>.json` entries count; anything else is ignored, and a
/// missing or unreadable directory means no local records.
pub fn list_local_ids(characters_dir: &Path) -> BTreeSet<i64> {
    let entries = match std::fs::read_dir(characters_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(
                dir = %characters_dir.display(),
                error = %e,
                "No readable record directory, treating as empty"
            );
            return BTreeSet::new();
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| parse_record_id(&entry.file_name().to_string_lossy()))
        .collect()
}

/// `"101.json"` → `Some(101)`
pub fn parse_record_id(file_name: &str) -> Option<i64> {
    let stem = file_name.strip_suffix(".json")?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

//! Roster enrichment
//!
//! Adds upgrade material ids to the curated roster (`characters.json`) from
//! the persisted character records and fetches the material icons:
//! - weekly boss material: `Skills[0].Consumes[last].Consume[second to last]`
//! - ascension material: `Items[0]` of the last `Breaches` entry with `MaxLevel` 90

use crate::error::{SyncError, SyncResult};
use crate::models::TaskOutcome;
use crate::services::{CatalogSource, ImageTranscoder, RecordStore};
use crate::workflow::ingestion::fetch_image;
use encore_common::layout::{ICON_ASCENSION, ICON_WEEKLY_BOSS};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Breach level whose items are the ascension material
const ASCENSION_MAX_LEVEL: i64 = 90;

/// One upgrade material as referenced by a record
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub key: Value,
    /// Game asset path of the material icon
    pub icon: String,
}

impl Material {
    fn from_item(item: &Value) -> Option<Self> {
        let key = item.get("Key")?.clone();
        if key.is_null() {
            return None;
        }
        let icon = item.get("Icon").and_then(Value::as_str).unwrap_or("").to_string();
        Some(Self { key, icon })
    }

    /// Key as used in file names
    pub fn key_string(&self) -> String {
        match &self.key {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Weekly boss (skill) and ascension materials of a character
#[derive(Debug, Clone, PartialEq)]
pub struct UpgradeMaterials {
    pub skill: Material,
    pub ascension: Material,
}

/// Extract the upgrade materials from a raw record
pub fn upgrade_materials(record: &Value) -> Option<UpgradeMaterials> {
    let consume = record
        .get("Skills")?
        .get(0)?
        .get("Consumes")?
        .as_array()?
        .last()?
        .get("Consume")?
        .as_array()?;
    let skill = Material::from_item(consume.get(consume.len().checked_sub(2)?)?)?;

    let ascension = record
        .get("Breaches")?
        .as_array()?
        .iter()
        .filter(|b| b.get("MaxLevel").and_then(Value::as_i64) == Some(ASCENSION_MAX_LEVEL))
        .last()?
        .get("Items")?
        .get(0)
        .and_then(Material::from_item)?;

    Some(UpgradeMaterials { skill, ascension })
}

/// Rewrite a game asset path `<dir>/<name>.<ext>` to `<dir>/<base>.png`
pub fn fix_icon_path(path: &str) -> String {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let base = file_name.split('.').next().unwrap_or(file_name);
    let without_ext = path.rsplit_once('.').map(|(head, _)| head).unwrap_or(path);
    let dir = without_ext
        .rsplit_once('/')
        .map(|(head, _)| head)
        .unwrap_or(without_ext);
    format!("{}/{}.png", dir, base)
}

/// Record id of a roster entry: `id`, or the smallest of an `id` array
pub fn roster_record_id(entry: &Value) -> Option<i64> {
    match entry.get("id")? {
        Value::Number(n) => n.as_i64(),
        Value::Array(ids) => ids.iter().filter_map(Value::as_i64).min(),
        _ => None,
    }
}

/// Outcome of an enrichment pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct EnrichmentReport {
    pub entries_updated: usize,
    pub entries_skipped: usize,
    pub icons: Vec<TaskOutcome>,
}

impl EnrichmentReport {
    pub fn display_string(&self) -> String {
        format!(
            "{} roster entries updated, {} skipped; {} icons fetched, {} failed",
            self.entries_updated,
            self.entries_skipped,
            self.icons.iter().filter(|i| i.is_success()).count(),
            self.icons.iter().filter(|i| i.is_failure()).count()
        )
    }
}

/// Enriches the roster in place
pub struct RosterEnricher {
    catalog: Arc<dyn CatalogSource>,
    transcoder: Arc<dyn ImageTranscoder>,
    store: RecordStore,
}

impl RosterEnricher {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        transcoder: Arc<dyn ImageTranscoder>,
        store: RecordStore,
    ) -> Self {
        Self {
            catalog,
            transcoder,
            store,
        }
    }

    /// Enrich every roster entry and rewrite the roster
    ///
    /// A missing or malformed roster is fatal; problems with single entries
    /// are logged and the entry is kept unchanged.
    pub async fn enrich(&self) -> SyncResult<EnrichmentReport> {
        let roster_path = self.store.layout().roster_path();
        let content = std::fs::read_to_string(&roster_path)?;
        let mut roster: Vec<Value> =
            serde_json::from_str(&content).map_err(encore_common::Error::from)?;

        let mut report = EnrichmentReport::default();

        for entry in roster.iter_mut() {
            let Some(id) = roster_record_id(entry) else {
                tracing::warn!(entry = %entry, "Roster entry without usable id");
                report.entries_skipped += 1;
                continue;
            };

            let record = match self.store.load_raw_record(id) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(character_id = id, error = %e, "Cannot load record for roster entry");
                    report.entries_skipped += 1;
                    continue;
                }
            };

            let Some(materials) = upgrade_materials(&record) else {
                tracing::warn!(character_id = id, "No upgrade materials in record");
                report.entries_skipped += 1;
                continue;
            };

            let Some(object) = entry.as_object_mut() else {
                report.entries_skipped += 1;
                continue;
            };
            object.insert(
                "upgrade".to_string(),
                json!({
                    "ascension": materials.ascension.key,
                    "skill": materials.skill.key,
                }),
            );
            report.entries_updated += 1;

            for (category, material) in [
                (ICON_ASCENSION, &materials.ascension),
                (ICON_WEEKLY_BOSS, &materials.skill),
            ] {
                if let Some(outcome) = self.fetch_icon(category, material).await {
                    report.icons.push(outcome);
                }
            }
        }

        let serialized = serde_json::to_string_pretty(&roster).map_err(encore_common::Error::from)?;
        std::fs::write(&roster_path, serialized).map_err(SyncError::from)?;

        tracing::info!("Enrichment complete: {}", report.display_string());
        Ok(report)
    }

    /// Fetch a material icon unless it is already stored
    async fn fetch_icon(&self, category: &str, material: &Material) -> Option<TaskOutcome> {
        if material.icon.is_empty() {
            return None;
        }
        let key = material.key_string();
        if self.store.image_exists(category, &key) {
            return Some(TaskOutcome::skipped(
                format!("{}/{}.webp", category, key),
                "already present",
            ));
        }

        let url = self
            .catalog
            .resolve_url(&format!("/resource/Data{}", fix_icon_path(&material.icon)));
        Some(
            fetch_image(
                self.catalog.as_ref(),
                self.transcoder.clone(),
                &self.store,
                &url,
                category,
                &key,
            )
            .await,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Value {
        json!({
            "Id": 1205,
            "Skills": [{
                "Consumes": [
                    { "Consume": [{ "Key": 1, "Icon": "/a.a" }] },
                    { "Consume": [
                        { "Key": 41400084, "Icon": "/Game/Ui/IconA/T_Weekly.T_Weekly" },
                        { "Key": 2, "Icon": "/b.b" }
                    ] }
                ]
            }],
            "Breaches": [
                { "MaxLevel": 20, "Items": [{ "Key": 5, "Icon": "/c.c" }] },
                { "MaxLevel": 90, "Items": [{ "Key": 41400034, "Icon": "/Game/Ui/IconB/T_Asc.T_Asc" }] }
            ]
        })
    }

    #[test]
    fn test_upgrade_materials() {
        let materials = upgrade_materials(&record()).unwrap();
        assert_eq!(materials.skill.key, json!(41400084));
        assert_eq!(materials.ascension.key, json!(41400034));
        assert_eq!(materials.ascension.key_string(), "41400034");
    }

    #[test]
    fn test_upgrade_materials_missing_breach() {
        let mut record = record();
        record["Breaches"] = json!([{ "MaxLevel": 80, "Items": [] }]);
        assert_eq!(upgrade_materials(&record), None);
    }

    #[test]
    fn test_fix_icon_path() {
        assert_eq!(
            fix_icon_path("/Game/Ui/IconB/T_Asc.T_Asc"),
            "/Game/Ui/IconB/T_Asc.png"
        );
        assert_eq!(fix_icon_path("/Game/Ui/T_Plain"), "/Game/Ui/T_Plain.png");
    }

    #[test]
    fn test_roster_record_id() {
        assert_eq!(roster_record_id(&json!({ "id": 1501 })), Some(1501));
        assert_eq!(roster_record_id(&json!({ "id": [1502, 1501] })), Some(1501));
        assert_eq!(roster_record_id(&json!({ "id": "x" })), None);
        assert_eq!(roster_record_id(&json!({ "name": "Rover" })), None);
    }
}

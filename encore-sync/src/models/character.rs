//! Catalog documents as served by the remote API
//!
//! Only the fields the sync reads are typed. Detail documents are kept as
//! raw JSON alongside the typed view so they can be persisted verbatim.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Integer field where any other JSON type reads as absent
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| v.as_i64()))
}

/// String field where null or any other JSON type reads as absent
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .and_then(|v| v.as_str().map(str::to_string)))
}

/// Entry of the catalog listing (`roleList`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CharacterSummary {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name", default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
}

impl CharacterSummary {
    /// Name for logs and reports, empty when the catalog has none
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// Audio language variant of a voice line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LanguageCode {
    En,
    Ja,
    Ko,
    Zh,
}

impl LanguageCode {
    /// Download order of language variants
    pub const ALL: [LanguageCode; 4] = [
        LanguageCode::En,
        LanguageCode::Ja,
        LanguageCode::Ko,
        LanguageCode::Zh,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            LanguageCode::En => "en",
            LanguageCode::Ja => "ja",
            LanguageCode::Ko => "ko",
            LanguageCode::Zh => "zh",
        }
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One voice line of a character (`VoiceList` entry)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct VoiceAsset {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "VoiceTitle", default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    /// Stable ordering position, used for range selection
    #[serde(rename = "Sort", default, deserialize_with = "lenient_i64")]
    pub ordinal: Option<i64>,
    #[serde(rename = "VoiceEn", default, deserialize_with = "lenient_string")]
    pub voice_en: Option<String>,
    #[serde(rename = "VoiceJa", default, deserialize_with = "lenient_string")]
    pub voice_ja: Option<String>,
    #[serde(rename = "VoiceKo", default, deserialize_with = "lenient_string")]
    pub voice_ko: Option<String>,
    #[serde(rename = "VoiceZh", default, deserialize_with = "lenient_string")]
    pub voice_zh: Option<String>,
}

impl VoiceAsset {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn url_for(&self, language: LanguageCode) -> Option<&str> {
        let url = match language {
            LanguageCode::En => &self.voice_en,
            LanguageCode::Ja => &self.voice_ja,
            LanguageCode::Ko => &self.voice_ko,
            LanguageCode::Zh => &self.voice_zh,
        };
        url.as_deref().filter(|u| !u.is_empty())
    }

    /// Language variants with a non-empty URL, in download order
    pub fn language_urls(&self) -> Vec<(LanguageCode, &str)> {
        LanguageCode::ALL
            .iter()
            .filter_map(|lang| self.url_for(*lang).map(|url| (*lang, url)))
            .collect()
    }

    /// Destination file name: `<assetId>_<lang>.mp3`
    pub fn file_name(&self, language: LanguageCode) -> String {
        format!("{}_{}.mp3", self.id, language.code())
    }
}

#[derive(Debug, Deserialize)]
struct RecordFields {
    #[serde(rename = "Id")]
    id: i64,
    #[serde(rename = "Name", default)]
    name: Option<Value>,
    #[serde(rename = "RoleHeadIconCircle", default, deserialize_with = "lenient_string")]
    role_head_icon_circle: Option<String>,
    #[serde(rename = "VoiceList", default)]
    voice_list: Option<Value>,
}

/// Parse `VoiceList` entry by entry; malformed entries are dropped
fn parse_voice_list(character_id: i64, voice_list: Option<Value>) -> Vec<VoiceAsset> {
    let items = match voice_list {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => return Vec::new(),
        Some(other) => {
            tracing::warn!(character_id, value = %other, "VoiceList is not an array, ignoring");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<VoiceAsset>(item) {
            Ok(voice) => Some(voice),
            Err(e) => {
                tracing::warn!(character_id, error = %e, "Skipping malformed voice entry");
                None
            }
        })
        .collect()
}

/// Full detail document of one character
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterRecord {
    pub id: i64,
    /// Display name (`Name.Content`), empty when absent
    pub name: String,
    /// Circular portrait reference, relative or absolute URL
    pub portrait_url: Option<String>,
    pub voices: Vec<VoiceAsset>,
    raw: Value,
}

impl CharacterRecord {
    /// Build the typed view over a raw detail document
    pub fn from_value(raw: Value) -> Result<Self, serde_json::Error> {
        let fields: RecordFields = serde_json::from_value(raw.clone())?;
        let name = fields
            .name
            .as_ref()
            .and_then(|n| n.get("Content"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(Self {
            id: fields.id,
            name,
            portrait_url: fields.role_head_icon_circle.filter(|u| !u.is_empty()),
            voices: parse_voice_list(fields.id, fields.voice_list),
            raw,
        })
    }

    /// The document exactly as received
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_from_detail_document() {
        let raw = json!({
            "Id": 1205,
            "Name": { "Id": 9, "Content": "Changli" },
            "RoleHeadIconCircle": "/d/GameData/UI/T_IconRoleHeadCircle.png",
            "VoiceList": [
                { "Id": 1, "VoiceTitle": "Hobby", "Sort": 3, "VoiceEn": "https://cdn/x/1_en.mp3", "VoiceJa": "" },
                { "Id": 2, "VoiceTitle": null, "Sort": null }
            ],
            "Skills": []
        });

        let record = CharacterRecord::from_value(raw.clone()).unwrap();
        assert_eq!(record.id, 1205);
        assert_eq!(record.name, "Changli");
        assert!(record.portrait_url.is_some());
        assert_eq!(record.voices.len(), 2);
        assert_eq!(record.voices[1].title(), "");
        assert_eq!(record.voices[1].ordinal, None);
        assert_eq!(record.raw(), &raw);
    }

    #[test]
    fn test_language_urls_skip_empty_variants() {
        let voice = VoiceAsset {
            id: 42,
            voice_en: Some("https://cdn/42_en.mp3".to_string()),
            voice_ja: Some(String::new()),
            voice_zh: Some("https://cdn/42_zh.mp3".to_string()),
            ..Default::default()
        };

        let langs: Vec<LanguageCode> = voice.language_urls().into_iter().map(|(l, _)| l).collect();
        assert_eq!(langs, vec![LanguageCode::En, LanguageCode::Zh]);
        assert_eq!(voice.file_name(LanguageCode::Zh), "42_zh.mp3");
    }

    #[test]
    fn test_record_without_voice_list() {
        let record = CharacterRecord::from_value(json!({ "Id": 7, "VoiceList": null })).unwrap();
        assert!(record.voices.is_empty());
        assert_eq!(record.name, "");
        assert_eq!(record.portrait_url, None);
    }

    #[test]
    fn test_malformed_voice_entries_are_dropped() {
        let raw = json!({
            "Id": 101,
            "Name": { "Content": "Verina" },
            "VoiceList": [
                { "Id": 1, "VoiceTitle": "Hobby", "Sort": 1, "VoiceEn": "https://cdn/1_en.mp3" },
                { "Id": 2, "VoiceTitle": "Hobby Chat", "Sort": "2", "VoiceEn": "https://cdn/2_en.mp3" },
                { "VoiceTitle": "No id", "Sort": 3 },
                "not an object"
            ]
        });

        let record = CharacterRecord::from_value(raw.clone()).unwrap();
        let ids: Vec<i64> = record.voices.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(record.voices[1].ordinal, None);
        assert_eq!(record.raw(), &raw);
    }

    #[test]
    fn test_odd_field_types_read_as_absent() {
        let raw = json!({
            "Id": 101,
            "Name": "Verina",
            "RoleHeadIconCircle": 12,
            "VoiceList": { "unexpected": true }
        });

        let record = CharacterRecord::from_value(raw).unwrap();
        assert_eq!(record.name, "");
        assert_eq!(record.portrait_url, None);
        assert!(record.voices.is_empty());
    }

    #[test]
    fn test_summary_with_null_name() {
        let summary: CharacterSummary =
            serde_json::from_value(json!({ "Id": 1501, "Name": null })).unwrap();
        assert_eq!(summary.name, None);
        assert_eq!(summary.display_name(), "");

        let named: CharacterSummary =
            serde_json::from_value(json!({ "Id": 1502, "Name": "Rover" })).unwrap();
        assert_eq!(named.display_name(), "Rover");
    }
}

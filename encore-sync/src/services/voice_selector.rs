//! Voice line selection
//!
//! The remote catalog tags voice lines inconsistently: some are only
//! recognisable by title, others only by their stable `Sort` position. A
//! voice line is selected when it matches any title filter OR any ordinal
//! filter. With no filters configured at all, every voice line is selected.
//!
//! Title matching works on normalized text:
//! - title: lowercase, drop apostrophes (`'` and `’`), drop `:`, `–` and `-`,
//!   collapse whitespace
//! - filter: `{character}` replaced by the character name, lowercase, drop
//!   apostrophes
//!
//! and then tries the rules of [`MatchRule`] in order.

use crate::models::{CharacterRecord, LanguageCode, VoiceAsset};
use encore_common::config::OrdinalSpec;
use std::ops::RangeInclusive;

/// Placeholder substituted with the character's display name
pub const CHARACTER_PLACEHOLDER: &str = "{character}";

const APOSTROPHES: [char; 2] = ['\'', '\u{2019}'];
const SEPARATORS: [char; 3] = [':', '\u{2013}', '-'];

/// Normalize a voice line title
///
/// Idempotent: normalizing a normalized title returns it unchanged.
pub fn normalize_title(title: &str) -> String {
    let stripped: String = title
        .to_lowercase()
        .chars()
        .filter(|c| !APOSTROPHES.contains(c) && !SEPARATORS.contains(c))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a title filter for one character
pub fn normalize_filter(filter: &str, character_name: &str) -> String {
    filter
        .replace(CHARACTER_PLACEHOLDER, character_name)
        .to_lowercase()
        .trim()
        .chars()
        .filter(|c| !APOSTROPHES.contains(c))
        .collect()
}

/// Normalized title split for matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTitle {
    pub full: String,
    /// Everything after the first space, or the whole title without one
    pub suffix: String,
}

impl NormalizedTitle {
    pub fn new(title: &str) -> Self {
        let full = normalize_title(title);
        let suffix = match full.split_once(' ') {
            Some((_, rest)) => rest.to_string(),
            None => full.clone(),
        };
        Self { full, suffix }
    }
}

/// Ways a normalized filter can match a normalized title
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    /// Title starts with the filter
    Prefix,
    /// Suffix equals the filter
    SuffixEqual,
    /// Suffix starts with the filter
    SuffixPrefix,
    /// Filter occurs anywhere in the title
    // TODO: broad enough to produce false positives (e.g. "hobby" inside "lobbying");
    // tighten to word boundaries once existing filter sets are audited against it.
    Contains,
}

impl MatchRule {
    /// Evaluation order
    pub const ALL: [MatchRule; 4] = [
        MatchRule::Prefix,
        MatchRule::SuffixEqual,
        MatchRule::SuffixPrefix,
        MatchRule::Contains,
    ];

    pub fn applies(&self, title: &NormalizedTitle, filter: &str) -> bool {
        match self {
            MatchRule::Prefix => title.full.starts_with(filter),
            MatchRule::SuffixEqual => title.suffix == filter,
            MatchRule::SuffixPrefix => title.suffix.starts_with(filter),
            MatchRule::Contains => title.full.contains(filter),
        }
    }

    /// First rule under which `filter` matches `title`
    pub fn first_match(title: &NormalizedTitle, filter: &str) -> Option<MatchRule> {
        MatchRule::ALL.into_iter().find(|rule| rule.applies(title, filter))
    }
}

/// Ordinal filter: one position or an inclusive range
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrdinalFilter {
    Single(i64),
    Range(RangeInclusive<i64>),
}

impl OrdinalFilter {
    /// Parse `8`, `"8"` or `"12-14"`; anything else is rejected
    pub fn parse(spec: &OrdinalSpec) -> Option<Self> {
        match spec {
            OrdinalSpec::Number(n) => Some(OrdinalFilter::Single(*n)),
            OrdinalSpec::Text(text) => {
                let text = text.trim();
                if let Some((start, end)) = text.split_once('-') {
                    let start = parse_digits(start)?;
                    let end = parse_digits(end)?;
                    Some(OrdinalFilter::Range(start..=end))
                } else {
                    parse_digits(text).map(OrdinalFilter::Single)
                }
            }
        }
    }

    pub fn contains(&self, ordinal: i64) -> bool {
        match self {
            OrdinalFilter::Single(n) => *n == ordinal,
            OrdinalFilter::Range(range) => range.contains(&ordinal),
        }
    }
}

fn parse_digits(text: &str) -> Option<i64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Why a voice line was selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionReason {
    /// No filters configured
    Unfiltered,
    Title { filter: String, rule: MatchRule },
    Ordinal(i64),
}

/// One file to download for a selected voice line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub character_id: i64,
    pub voice_id: i64,
    pub title: String,
    pub ordinal: Option<i64>,
    pub language: LanguageCode,
    pub url: String,
    /// `<voiceId>_<lang>.mp3`
    pub file_name: String,
}

/// Configured title and ordinal filters
#[derive(Debug, Clone)]
pub struct VoiceSelector {
    title_filters: Vec<String>,
    ordinal_filters: Vec<OrdinalFilter>,
    unfiltered: bool,
}

impl VoiceSelector {
    /// Build a selector; unparsable ordinal specs are dropped with a warning
    ///
    /// "Unfiltered" is decided on the configured lists, so a configuration
    /// whose ordinal specs are all invalid selects nothing rather than
    /// everything.
    pub fn new(title_filters: Vec<String>, ordinal_specs: &[OrdinalSpec]) -> Self {
        let ordinal_filters = ordinal_specs
            .iter()
            .filter_map(|spec| {
                let parsed = OrdinalFilter::parse(spec);
                if parsed.is_none() {
                    tracing::warn!(spec = ?spec, "Ignoring unparsable ordinal filter");
                }
                parsed
            })
            .collect();

        Self {
            unfiltered: title_filters.is_empty() && ordinal_specs.is_empty(),
            title_filters,
            ordinal_filters,
        }
    }

    /// Selector that takes every voice line
    pub fn select_all() -> Self {
        Self::new(Vec::new(), &[])
    }

    pub fn is_unfiltered(&self) -> bool {
        self.unfiltered
    }

    /// Title filters normalized for one character
    pub fn prepared_filters(&self, character_name: &str) -> Vec<String> {
        let name = character_name.to_lowercase();
        self.title_filters
            .iter()
            .map(|f| normalize_filter(f, &name))
            .collect()
    }

    /// Evaluate one voice line against prepared filters
    pub fn evaluate(&self, prepared: &[String], voice: &VoiceAsset) -> Option<SelectionReason> {
        let title = NormalizedTitle::new(voice.title());
        for filter in prepared {
            if let Some(rule) = MatchRule::first_match(&title, filter) {
                return Some(SelectionReason::Title {
                    filter: filter.clone(),
                    rule,
                });
            }
        }

        if let Some(ordinal) = voice.ordinal {
            if self.ordinal_filters.iter().any(|f| f.contains(ordinal)) {
                return Some(SelectionReason::Ordinal(ordinal));
            }
        }

        if self.unfiltered {
            return Some(SelectionReason::Unfiltered);
        }

        None
    }

    /// Voice lines of `record` that pass the filters
    pub fn select<'a>(&self, record: &'a CharacterRecord) -> Vec<(&'a VoiceAsset, SelectionReason)> {
        let prepared = self.prepared_filters(&record.name);
        record
            .voices
            .iter()
            .filter_map(|voice| self.evaluate(&prepared, voice).map(|reason| (voice, reason)))
            .collect()
    }

    /// One download task per language variant of every selected voice line
    pub fn plan_downloads(&self, record: &CharacterRecord) -> Vec<DownloadTask> {
        self.select(record)
            .into_iter()
            .flat_map(|(voice, reason)| {
                tracing::trace!(
                    character_id = record.id,
                    voice_id = voice.id,
                    title = %voice.title(),
                    reason = ?reason,
                    "Voice line selected"
                );
                voice
                    .language_urls()
                    .into_iter()
                    .map(move |(language, url)| DownloadTask {
                        character_id: record.id,
                        voice_id: voice.id,
                        title: voice.title().to_string(),
                        ordinal: voice.ordinal,
                        language,
                        url: url.to_string(),
                        file_name: voice.file_name(language),
                    })
            })
            .collect()
    }
}
